use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kws_spotter::cli::{BestArgs, Cli, Command, ConfigArgs, TrainArgs, TranscribeArgs};
use kws_spotter::config::KwsConfig;
use kws_spotter::dataset::{list_labels, DatasetBuilder};
use kws_spotter::features::AudioFeatureExtractor;
use kws_spotter::serve::{TranscribeHandler, TranscribeOutcome, Upload};
use kws_spotter::tracking::{promote, ExperimentTracker, FileTracker, ModelSelection};
use kws_spotter::training::Trainer;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Train(args) => handle_train(&args),
        Command::Transcribe(args) => handle_transcribe(&args),
        Command::Best(args) => handle_best(&args),
        Command::Labels(args) => handle_labels(&args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<KwsConfig> {
    KwsConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration {:?}", args.config))
}

fn handle_train(args: &TrainArgs) -> Result<()> {
    let config = load_config(&args.config)?;

    println!("1. Building dataset from {:?}...", config.paths.train_dir);
    let extractor = AudioFeatureExtractor::new(config.feature_params())?;
    let dataset = DatasetBuilder::new(extractor, config.params.seed)
        .build(
            &config.paths.train_dir,
            config.params.test_data_split_percent,
        )
        .context("Failed to build dataset")?;
    println!(
        "   {} training and {} test clips over {} labels",
        dataset.train_files.len(),
        dataset.test_files.len(),
        dataset.labels.len()
    );

    let architecture = args.architecture.architecture();
    println!("\n2. Training {} model...", architecture.name());
    let mut tracker = FileTracker::new(&config.names.experiment_name, &config.paths.tracking_uri);
    let outcome = Trainer::new(
        &dataset,
        config.training_params(),
        &mut tracker,
        &config.names.metric_name,
    )
    .train(architecture.as_ref())
    .context("Training failed")?;
    if let Some(last) = outcome.history.last() {
        println!(
            "   Run {}: loss {:.4}, accuracy {:.4}, val_loss {:.4}, val_accuracy {:.4}",
            outcome.run_id, last.loss, last.accuracy, last.val_loss, last.val_accuracy
        );
    }

    println!("\n3. Ranking runs by {}...", outcome.selection.metric);
    print_selection(&outcome.selection);

    if args.promote {
        let best = outcome
            .selection
            .best()
            .context("No run reported the ranking metric")?;
        let path = promote(best, &config.paths.model_artifact_dir)
            .with_context(|| format!("Failed to promote run {}", best.run_id))?;
        println!("\n4. Promoted run {} to {:?}", best.run_id, path);
    }
    Ok(())
}

fn handle_transcribe(args: &TranscribeArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let bytes =
        fs::read(&args.file).with_context(|| format!("Failed to read {:?}", args.file))?;
    let filename = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let handler = TranscribeHandler::new(&config);
    let outcome = handler.handle(&Upload::new(filename, bytes));
    for line in outcome.render() {
        println!("{line}");
    }
    match outcome {
        TranscribeOutcome::Transcribed(_) => Ok(()),
        TranscribeOutcome::Rejected { message } => bail!("{message}"),
        TranscribeOutcome::Unavailable { status, .. } => bail!("prediction failed ({status})"),
    }
}

fn handle_best(args: &BestArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let metric = args
        .metric
        .clone()
        .unwrap_or_else(|| config.names.metric_name.clone());
    let tracker = FileTracker::new(&config.names.experiment_name, &config.paths.tracking_uri);
    let selection = tracker
        .find_best_model(&metric)
        .with_context(|| format!("Failed to rank runs of {}", config.names.experiment_name))?;
    print_selection(&selection);
    Ok(())
}

fn handle_labels(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args)?;
    let labels = list_labels(&config.paths.train_dir)
        .with_context(|| format!("Failed to list labels in {:?}", config.paths.train_dir))?;
    for (index, label) in labels.iter().enumerate() {
        println!("{index}\t{label}");
    }
    Ok(())
}

fn print_selection(selection: &ModelSelection) {
    if selection.runs.is_empty() {
        println!("   No runs recorded");
        return;
    }
    for run in &selection.runs {
        match run.value {
            Some(value) => println!("   {}\t{} = {:.4}", run.run_id, selection.metric, value),
            None => println!("   {}\t{} missing", run.run_id, selection.metric),
        }
    }
}
