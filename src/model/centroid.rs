use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::standardize::Standardizer;
use super::{check_batch, cross_entropy, softmax_rows, Classifier};
use crate::error::Result;
use crate::training::TrainingParams;

/// Scores clips by distance to each label's mean feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    scaler: Standardizer,
    /// `(n_classes, n_features)`
    centroids: Array2<f32>,
    /// Classes that had training rows in the last epoch. Empty means every
    /// class counts as fitted.
    #[serde(default)]
    fitted: Vec<bool>,
}

impl NearestCentroid {
    pub fn new(n_features: usize, n_classes: usize) -> Self {
        Self {
            scaler: Standardizer::identity(n_features),
            centroids: Array2::zeros((n_classes, n_features)),
            fitted: Vec::new(),
        }
    }

    fn is_fitted(&self, class: usize) -> bool {
        self.fitted.get(class).copied().unwrap_or(true)
    }

    /// Negative Euclidean distances, scaled by `sqrt(n_features)`.
    ///
    /// Classes without training rows score `-inf`, so their probability is 0.
    fn scores(&self, scaled: &Array2<f32>) -> Array2<f32> {
        let scale = (self.centroids.ncols().max(1) as f32).sqrt();
        let mut scores = Array2::zeros((scaled.nrows(), self.centroids.nrows()));
        for (row, sample) in scaled.outer_iter().enumerate() {
            for (class, centroid) in self.centroids.outer_iter().enumerate() {
                scores[[row, class]] = if self.is_fitted(class) {
                    let distance = (&sample - &centroid).mapv(|d| d * d).sum().sqrt();
                    -distance / scale
                } else {
                    f32::NEG_INFINITY
                };
            }
        }
        scores
    }
}

impl Classifier for NearestCentroid {
    fn shape(&self) -> (usize, usize) {
        (self.centroids.ncols(), self.centroids.nrows())
    }

    fn parameter_count(&self) -> usize {
        self.centroids.len()
    }

    fn prepare(&mut self, x: &Array2<f32>) -> Result<()> {
        check_batch(&*self, x)?;
        self.scaler = Standardizer::fit(x);
        Ok(())
    }

    /// Recomputes every centroid from the full training set; batch size,
    /// learning rate and shuffling do not apply.
    fn fit_epoch(
        &mut self,
        x: &Array2<f32>,
        y: &Array2<f32>,
        _params: &TrainingParams,
        _rng: &mut StdRng,
    ) -> Result<f32> {
        check_batch(&*self, x)?;
        let scaled = self.scaler.transform(x);
        let mut fitted = vec![false; self.centroids.nrows()];
        for (class, mut centroid) in self.centroids.outer_iter_mut().enumerate() {
            let members: Vec<usize> = y
                .column(class)
                .iter()
                .enumerate()
                .filter(|&(_, &value)| value > 0.5)
                .map(|(row, _)| row)
                .collect();
            if members.is_empty() {
                warn!(class, "label has no training samples; it will never be predicted");
                centroid.fill(0.0);
                continue;
            }
            if let Some(mean) = scaled.select(Axis(0), &members).mean_axis(Axis(0)) {
                centroid.assign(&mean);
                fitted[class] = true;
            }
        }
        // An epoch without any labeled rows leaves every class usable.
        self.fitted = if fitted.iter().any(|&f| f) {
            fitted
        } else {
            Vec::new()
        };
        let probs = softmax_rows(&self.scores(&scaled));
        Ok(cross_entropy(&probs, y))
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        check_batch(&*self, x)?;
        Ok(softmax_rows(&self.scores(&self.scaler.transform(x))))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn assigns_samples_to_closest_centroid() {
        let x = array![[0.0, 0.0], [0.2, 0.1], [5.0, 5.0], [5.1, 4.8]];
        let y = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
        let mut model = NearestCentroid::new(2, 2);
        model.prepare(&x).unwrap();
        model
            .fit_epoch(&x, &y, &TrainingParams::new(1, 1, 0.1), &mut StdRng::seed_from_u64(0))
            .unwrap();

        let probs = model.predict_proba(&array![[0.1, 0.0], [4.9, 5.0]]).unwrap();
        assert!(probs[[0, 0]] > probs[[0, 1]]);
        assert!(probs[[1, 1]] > probs[[1, 0]]);
        assert_eq!(model.shape(), (2, 2));
    }

    #[test]
    fn class_without_rows_is_never_predicted() {
        let x = array![[-1.0, 0.0], [-1.2, 0.1], [1.0, 0.0], [1.1, -0.1]];
        let y = array![
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0]
        ];
        let mut model = NearestCentroid::new(2, 3);
        model.prepare(&x).unwrap();
        model
            .fit_epoch(&x, &y, &TrainingParams::new(1, 1, 0.1), &mut StdRng::seed_from_u64(0))
            .unwrap();

        // The training mean sits at the origin of the scaled space.
        let probs = model.predict_proba(&array![[0.0, 0.0], [-1.0, 0.0]]).unwrap();
        assert_eq!(probs[[0, 0]], 0.0);
        assert_eq!(probs[[1, 0]], 0.0);
        assert!(probs[[1, 1]] > probs[[1, 2]]);
        for row in probs.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
    }
}
