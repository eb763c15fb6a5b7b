//! Keyword classifiers and their persisted form.
//!
//! Every architecture implements [`Architecture`] independently; the fitted
//! model it produces is wrapped in [`KeywordClassifier`] so it can be written
//! to and read back from a [`ModelArtifact`].

mod artifact;
mod centroid;
mod softmax;
mod standardize;

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::info;

pub(crate) use artifact::write_json_file;
pub use artifact::{ModelArtifact, MODEL_FILE};
pub use centroid::NearestCentroid;
pub use softmax::SoftmaxRegression;
pub use standardize::Standardizer;

use crate::error::{KwsError, Result};
use crate::training::TrainingParams;
use crate::types::FeatureParams;

const PROB_FLOOR: f32 = 1e-7;

/// Scoring capability shared by every architecture.
///
/// Inputs are flattened feature matrices, one row per clip.
pub trait Classifier {
    /// `(n_features, n_classes)`
    fn shape(&self) -> (usize, usize);

    fn parameter_count(&self) -> usize;

    /// Learns input scaling from the training rows. Called once before the
    /// first epoch.
    fn prepare(&mut self, x: &Array2<f32>) -> Result<()>;

    /// Runs one training epoch and returns the mean training loss.
    fn fit_epoch(
        &mut self,
        x: &Array2<f32>,
        y: &Array2<f32>,
        params: &TrainingParams,
        rng: &mut StdRng,
    ) -> Result<f32>;

    /// Probability rows, each summing to 1.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f32>>;
}

/// A fitted model of any supported architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeywordClassifier {
    Softmax(SoftmaxRegression),
    Centroid(NearestCentroid),
}

impl KeywordClassifier {
    fn inner(&self) -> &dyn Classifier {
        match self {
            KeywordClassifier::Softmax(model) => model,
            KeywordClassifier::Centroid(model) => model,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            KeywordClassifier::Softmax(model) => model,
            KeywordClassifier::Centroid(model) => model,
        }
    }
}

impl Classifier for KeywordClassifier {
    fn shape(&self) -> (usize, usize) {
        self.inner().shape()
    }

    fn parameter_count(&self) -> usize {
        self.inner().parameter_count()
    }

    fn prepare(&mut self, x: &Array2<f32>) -> Result<()> {
        self.inner_mut().prepare(x)
    }

    fn fit_epoch(
        &mut self,
        x: &Array2<f32>,
        y: &Array2<f32>,
        params: &TrainingParams,
        rng: &mut StdRng,
    ) -> Result<f32> {
        self.inner_mut().fit_epoch(x, y, params, rng)
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        self.inner().predict_proba(x)
    }
}

/// Defines untrained models for a given input shape and label count.
pub trait Architecture {
    fn name(&self) -> &'static str;

    fn define(&self, params: FeatureParams, n_labels: usize) -> KeywordClassifier;

    /// Defines the model and logs its summary.
    fn create(&self, params: FeatureParams, n_labels: usize) -> KeywordClassifier {
        let model = self.define(params, n_labels);
        info!(
            architecture = self.name(),
            input = ?(params.n_coefficients, params.fixed_length),
            classes = n_labels,
            parameters = model.parameter_count(),
            "model created"
        );
        model
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftmaxArchitecture;

impl Architecture for SoftmaxArchitecture {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn define(&self, params: FeatureParams, n_labels: usize) -> KeywordClassifier {
        KeywordClassifier::Softmax(SoftmaxRegression::new(params.flat_len(), n_labels))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidArchitecture;

impl Architecture for CentroidArchitecture {
    fn name(&self) -> &'static str {
        "centroid"
    }

    fn define(&self, params: FeatureParams, n_labels: usize) -> KeywordClassifier {
        KeywordClassifier::Centroid(NearestCentroid::new(params.flat_len(), n_labels))
    }
}

/// Row-wise softmax, shifted by each row's max for stability.
pub fn softmax_rows(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.clone();
    for mut row in out.outer_iter_mut() {
        let max = row.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    out
}

/// Mean categorical cross-entropy of probability rows against one-hot rows.
pub fn cross_entropy(probs: &Array2<f32>, targets: &Array2<f32>) -> f32 {
    if probs.nrows() == 0 {
        return 0.0;
    }
    let total: f32 = probs
        .iter()
        .zip(targets.iter())
        .map(|(&p, &t)| -t * p.max(PROB_FLOOR).ln())
        .sum();
    total / probs.nrows() as f32
}

/// Index and value of the largest entry of each row.
pub fn argmax_rows(probs: &Array2<f32>) -> Vec<(usize, f32)> {
    probs
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .copied()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (index, value)| {
                    if value > best.1 {
                        (index, value)
                    } else {
                        best
                    }
                })
        })
        .collect()
}

/// Flattens `(n, coefficients, frames)` into `(n, coefficients * frames)`.
pub fn flatten_batch(x: &ndarray::Array3<f32>) -> Result<Array2<f32>> {
    let (n, coefficients, frames) = x.dim();
    Array2::from_shape_vec((n, coefficients * frames), x.iter().copied().collect())
        .map_err(|err| KwsError::Value(format!("cannot flatten feature batch: {err}")))
}

fn check_batch<C: Classifier + ?Sized>(model: &C, x: &Array2<f32>) -> Result<()> {
    let (n_features, _) = model.shape();
    if x.ncols() != n_features {
        return Err(KwsError::Value(format!(
            "expected {n_features} features per row, got {}",
            x.ncols()
        )));
    }
    Ok(())
}
