use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-6;

/// Per-feature standard scaling learned from the training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    mean: Array1<f32>,
    std_dev: Array1<f32>,
}

impl Standardizer {
    /// Identity scaling for `n_features` columns.
    pub fn identity(n_features: usize) -> Self {
        Self {
            mean: Array1::zeros(n_features),
            std_dev: Array1::ones(n_features),
        }
    }

    pub fn fit(x: &Array2<f32>) -> Self {
        let n_features = x.ncols();
        if x.nrows() == 0 {
            return Self::identity(n_features);
        }
        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let std_dev = x.std_axis(Axis(0), 0.0).mapv(|s| s.max(EPSILON));
        Self { mean, std_dev }
    }

    pub fn transform(&self, x: &Array2<f32>) -> Array2<f32> {
        (x - &self.mean) / &self.std_dev
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}
