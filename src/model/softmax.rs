use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::standardize::Standardizer;
use super::{check_batch, cross_entropy, softmax_rows, Classifier};
use crate::error::Result;
use crate::training::TrainingParams;

/// Multinomial logistic regression over flattened, standardized MFCCs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    scaler: Standardizer,
    /// `(n_features, n_classes)`
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl SoftmaxRegression {
    pub fn new(n_features: usize, n_classes: usize) -> Self {
        Self {
            scaler: Standardizer::identity(n_features),
            weights: Array2::zeros((n_features, n_classes)),
            bias: Array1::zeros(n_classes),
        }
    }

    fn forward(&self, scaled: &Array2<f32>) -> Array2<f32> {
        softmax_rows(&(scaled.dot(&self.weights) + &self.bias))
    }
}

impl Classifier for SoftmaxRegression {
    fn shape(&self) -> (usize, usize) {
        self.weights.dim()
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    fn prepare(&mut self, x: &Array2<f32>) -> Result<()> {
        check_batch(&*self, x)?;
        self.scaler = Standardizer::fit(x);
        Ok(())
    }

    fn fit_epoch(
        &mut self,
        x: &Array2<f32>,
        y: &Array2<f32>,
        params: &TrainingParams,
        rng: &mut StdRng,
    ) -> Result<f32> {
        check_batch(&*self, x)?;
        let scaled = self.scaler.transform(x);
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        order.shuffle(rng);

        let mut total_loss = 0.0;
        for batch in order.chunks(params.batch_size.max(1)) {
            let xb = scaled.select(Axis(0), batch);
            let yb = y.select(Axis(0), batch);
            let probs = self.forward(&xb);
            total_loss += cross_entropy(&probs, &yb) * batch.len() as f32;

            let grad = (&probs - &yb) / batch.len() as f32;
            let grad_w = xb.t().dot(&grad);
            let grad_b = grad.sum_axis(Axis(0));
            self.weights.scaled_add(-params.learning_rate, &grad_w);
            self.bias.scaled_add(-params.learning_rate, &grad_b);
        }
        Ok(total_loss / x.nrows().max(1) as f32)
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        check_batch(&*self, x)?;
        Ok(self.forward(&self.scaler.transform(x)))
    }
}
