use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dataset::validate_fraction;
use crate::error::{KwsError, Result};
use crate::tracking::resolve_tracking_uri;
use crate::training::TrainingParams;
use crate::types::FeatureParams;

const DEFAULT_SEED: u64 = 42;

/// Pipeline configuration, loaded once at process start and passed down.
#[derive(Debug, Clone, Deserialize)]
pub struct KwsConfig {
    pub names: NamesConfig,
    pub paths: PathsConfig,
    pub params: ParamsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamesConfig {
    pub experiment_name: String,
    /// Metric used to rank runs, e.g. `val_accuracy`.
    pub metric_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub train_dir: PathBuf,
    #[serde(alias = "model_artifactory_dir")]
    pub model_artifact_dir: PathBuf,
    #[serde(alias = "mlflow_tracking_uri")]
    pub tracking_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamsConfig {
    pub n_mfcc: usize,
    pub mfcc_length: usize,
    pub sampling_rate: u32,
    #[serde(alias = "test_split_fraction")]
    pub test_data_split_percent: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl KwsConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            KwsError::Config(format!("failed to read config {}: {err}", path.display()))
        })?;
        let config = Self::parse(&raw)?;
        config.resolve_relative_to(path.parent().unwrap_or(Path::new(".")))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| KwsError::Config(format!("failed to parse config JSON: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.names.experiment_name.trim().is_empty() {
            return Err(KwsError::Value("experiment_name must not be empty".into()));
        }
        if self.names.metric_name.trim().is_empty() {
            return Err(KwsError::Value(
                "metric_name is required for model selection".into(),
            ));
        }
        self.feature_params().validate()?;
        self.training_params().validate()?;
        validate_fraction(self.params.test_data_split_percent)
    }

    pub fn feature_params(&self) -> FeatureParams {
        FeatureParams::new(
            self.params.n_mfcc,
            self.params.mfcc_length,
            self.params.sampling_rate,
        )
    }

    pub fn training_params(&self) -> TrainingParams {
        TrainingParams::new(
            self.params.batch_size,
            self.params.epochs,
            self.params.learning_rate,
        )
        .with_seed(self.params.seed)
    }

    /// Relative corpus, model and tracking paths are taken relative to
    /// `base` (the config file's directory).
    fn resolve_relative_to(mut self, base: &Path) -> Result<Self> {
        let tracking_root = resolve_tracking_uri(&self.paths.tracking_uri);
        if tracking_root.is_relative() {
            self.paths.tracking_uri = base.join(tracking_root).display().to_string();
        }
        if self.paths.train_dir.is_relative() {
            self.paths.train_dir = base.join(&self.paths.train_dir);
        }
        if self.paths.model_artifact_dir.is_relative() {
            self.paths.model_artifact_dir = base.join(&self.paths.model_artifact_dir);
        }
        Ok(self)
    }
}
