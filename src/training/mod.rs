//! Training loop: fits a classifier on a [`Dataset`] and records the run.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{KwsError, Result};
use crate::model::{
    argmax_rows, cross_entropy, flatten_batch, Architecture, Classifier, ModelArtifact,
};
use crate::tracking::{ExperimentTracker, ModelSelection, RunRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    /// Seeds mini-batch shuffling.
    #[serde(default)]
    pub seed: u64,
}

impl TrainingParams {
    pub fn new(batch_size: usize, epochs: usize, learning_rate: f32) -> Self {
        Self {
            batch_size,
            epochs,
            learning_rate,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(KwsError::Value("batch_size must be greater than zero".into()));
        }
        if self.epochs == 0 {
            return Err(KwsError::Value("epochs must be greater than zero".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(KwsError::Value(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Losses and accuracies after one epoch; `val_*` are measured on the test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub val_loss: f32,
    pub val_accuracy: f32,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub run_id: String,
    pub history: Vec<EpochMetrics>,
    pub selection: ModelSelection,
}

/// Trains one model per call and logs it through the injected tracker.
pub struct Trainer<'a, T: ExperimentTracker> {
    dataset: &'a Dataset,
    params: TrainingParams,
    tracker: &'a mut T,
    metric_name: String,
}

impl<'a, T: ExperimentTracker> Trainer<'a, T> {
    pub fn new(
        dataset: &'a Dataset,
        params: TrainingParams,
        tracker: &'a mut T,
        metric_name: impl Into<String>,
    ) -> Self {
        Self {
            dataset,
            params,
            tracker,
            metric_name: metric_name.into(),
        }
    }

    pub fn train(&mut self, architecture: &dyn Architecture) -> Result<TrainingOutcome> {
        if self.metric_name.trim().is_empty() {
            return Err(KwsError::Value(
                "a metric name is required for model selection".into(),
            ));
        }
        self.params.validate()?;
        self.tracker.start()?;

        let feature_params = self.dataset.params;
        let x_train = flatten_batch(&self.dataset.x_train)?;
        let x_test = flatten_batch(&self.dataset.x_test)?;

        let mut model = architecture.create(feature_params, self.dataset.labels.len());
        model.prepare(&x_train)?;

        info!(
            architecture = architecture.name(),
            epochs = self.params.epochs,
            batch_size = self.params.batch_size,
            learning_rate = self.params.learning_rate,
            "training started"
        );
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut history = Vec::with_capacity(self.params.epochs);
        for epoch in 1..=self.params.epochs {
            model.fit_epoch(&x_train, &self.dataset.y_train, &self.params, &mut rng)?;
            let (loss, accuracy) = evaluate(&model, &x_train, &self.dataset.y_train)?;
            let (val_loss, val_accuracy) = evaluate(&model, &x_test, &self.dataset.y_test)?;
            debug!(epoch, loss, accuracy, val_loss, val_accuracy, "epoch finished");
            history.push(EpochMetrics {
                epoch,
                loss,
                accuracy,
                val_loss,
                val_accuracy,
            });
        }

        let artifact = ModelArtifact::new(
            architecture.name(),
            feature_params,
            self.dataset.labels.clone(),
            model,
        )?;
        let record = self.run_record(architecture.name(), &history);
        let run_id = self.tracker.log(&record, &artifact)?;
        let selection = self.tracker.find_best_model(&self.metric_name)?;
        info!(run_id = %run_id, metric = %self.metric_name, "training finished");

        Ok(TrainingOutcome {
            run_id,
            history,
            selection,
        })
    }

    fn run_record(&self, architecture: &str, history: &[EpochMetrics]) -> RunRecord {
        let mut record = RunRecord::default()
            .with_param("architecture", architecture)
            .with_param("batch_size", self.params.batch_size)
            .with_param("epochs", self.params.epochs)
            .with_param("learning_rate", self.params.learning_rate)
            .with_param("seed", self.params.seed)
            .with_param("train_samples", self.dataset.train_files.len())
            .with_param("test_samples", self.dataset.test_files.len());
        if let Some(last) = history.last() {
            record = record
                .with_metric("loss", last.loss as f64)
                .with_metric("accuracy", last.accuracy as f64)
                .with_metric("val_loss", last.val_loss as f64)
                .with_metric("val_accuracy", last.val_accuracy as f64);
        }
        record.history = history.to_vec();
        record
    }
}

/// Mean cross-entropy and accuracy of `model` on flattened rows `x`.
pub fn evaluate<C: Classifier + ?Sized>(
    model: &C,
    x: &Array2<f32>,
    y: &Array2<f32>,
) -> Result<(f32, f32)> {
    if x.nrows() == 0 {
        return Ok((0.0, 0.0));
    }
    let probs = model.predict_proba(x)?;
    let loss = cross_entropy(&probs, y);
    let predicted = argmax_rows(&probs);
    let expected = argmax_rows(y);
    let correct = predicted
        .iter()
        .zip(expected.iter())
        .filter(|(p, e)| p.0 == e.0)
        .count();
    Ok((loss, correct as f32 / x.nrows() as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_training_params() {
        assert!(TrainingParams::new(0, 1, 0.1).validate().is_err());
        assert!(TrainingParams::new(1, 0, 0.1).validate().is_err());
        assert!(TrainingParams::new(1, 1, 0.0).validate().is_err());
        assert!(TrainingParams::new(1, 1, f32::NAN).validate().is_err());
        assert!(TrainingParams::new(8, 10, 0.01).validate().is_ok());
    }
}
