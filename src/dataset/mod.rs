//! Label catalog and train/test dataset assembly.

mod builder;
mod labels;
mod split;

use std::path::PathBuf;

use ndarray::{Array2, Array3, Axis};
use tracing::info;

pub use builder::{build, collect_audio_files, DatasetBuilder};
pub use labels::{list_labels, LabelEncoding};
pub use split::{train_test_indices, validate_fraction, SplitIndices};

use crate::types::FeatureParams;

/// Feature and one-hot label tensors for one training run.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `(n_train, n_coefficients, fixed_length)`
    pub x_train: Array3<f32>,
    /// `(n_train, n_labels)`
    pub y_train: Array2<f32>,
    pub x_test: Array3<f32>,
    pub y_test: Array2<f32>,
    pub labels: LabelEncoding,
    /// Extraction settings every row was produced with.
    pub params: FeatureParams,
    /// Source clip of each training row.
    pub train_files: Vec<PathBuf>,
    pub test_files: Vec<PathBuf>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x_train.len_of(Axis(0)) + self.x_test.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(n_coefficients, fixed_length)` of every row.
    pub fn feature_shape(&self) -> (usize, usize) {
        (self.params.n_coefficients, self.params.fixed_length)
    }

    pub fn log_shapes(&self) {
        info!(shape = ?self.x_train.shape(), "x_train");
        info!(shape = ?self.y_train.shape(), "y_train");
        info!(shape = ?self.x_test.shape(), "x_test");
        info!(shape = ?self.y_test.shape(), "y_test");
    }
}
