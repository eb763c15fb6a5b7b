use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::{Architecture, CentroidArchitecture, SoftmaxArchitecture};

#[derive(Parser, Debug)]
#[command(
    name = "kws",
    version,
    about = "Keyword spotting: dataset building, training, model selection and transcription"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the dataset, train one model and rank it against earlier runs.
    Train(TrainArgs),
    /// Predict the keyword spoken in a `.wav` file.
    Transcribe(TranscribeArgs),
    /// List runs of the experiment ranked by a metric.
    Best(BestArgs),
    /// Print the label catalog of the training corpus.
    Labels(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the JSON pipeline configuration.
    #[arg(long, short = 'c')]
    pub config: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Model architecture to train.
    #[arg(long, value_enum, default_value_t = ArchitectureKind::Softmax)]
    pub architecture: ArchitectureKind,
    /// Copy the best-ranked model into the serving directory afterwards.
    #[arg(long)]
    pub promote: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TranscribeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Audio file to transcribe.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BestArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Ranking metric; defaults to the configured `metric_name`.
    #[arg(long)]
    pub metric: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchitectureKind {
    Softmax,
    Centroid,
}

impl ArchitectureKind {
    pub fn architecture(self) -> Box<dyn Architecture> {
        match self {
            ArchitectureKind::Softmax => Box::new(SoftmaxArchitecture),
            ArchitectureKind::Centroid => Box::new(CentroidArchitecture),
        }
    }
}
