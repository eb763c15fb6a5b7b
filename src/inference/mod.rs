//! Scoring single clips with a trained model.

use std::path::Path;

use ndarray::Array2;
use tracing::{debug, info};

use crate::error::{KwsError, Result};
use crate::features::AudioFeatureExtractor;
use crate::model::{argmax_rows, Classifier, ModelArtifact};
use crate::types::{AudioSource, FeatureParams, PredictionResult};

/// A loaded model plus the extractor configured to feed it.
///
/// Immutable after [`load`](Self::load); scoring only needs `&self`.
#[derive(Debug, Clone)]
pub struct KeywordSpotter {
    artifact: ModelArtifact,
    extractor: AudioFeatureExtractor,
}

impl KeywordSpotter {
    /// Loads the model in `model_artifact_dir`. The artifact must have been
    /// trained with exactly `params`.
    pub fn load(model_artifact_dir: &Path, params: FeatureParams) -> Result<Self> {
        let artifact = ModelArtifact::load(model_artifact_dir)?;
        if artifact.params != params {
            return Err(KwsError::NotFound(format!(
                "model at {} was trained with {:?}, requested {:?}",
                model_artifact_dir.display(),
                artifact.params,
                params
            )));
        }
        let extractor = AudioFeatureExtractor::new(params).map_err(KwsError::into_not_found)?;
        info!(
            dir = %model_artifact_dir.display(),
            architecture = %artifact.architecture,
            labels = artifact.labels.len(),
            "loaded keyword model"
        );
        Ok(Self {
            artifact,
            extractor,
        })
    }

    pub fn labels(&self) -> &[String] {
        self.artifact.labels.labels()
    }

    /// Extracts features from `source` and returns the most probable label.
    pub fn predict(&self, source: &AudioSource) -> Result<PredictionResult> {
        self.score(source).map_err(KwsError::into_not_found)
    }

    fn score(&self, source: &AudioSource) -> Result<PredictionResult> {
        let features = self.extractor.extract(source)?;
        let row = Array2::from_shape_vec((1, features.len()), features.iter().copied().collect())
            .map_err(|err| KwsError::Value(format!("cannot flatten features: {err}")))?;
        let probs = self.artifact.classifier.predict_proba(&row)?;
        let (index, probability) = argmax_rows(&probs)
            .into_iter()
            .next()
            .ok_or_else(|| KwsError::Value("model returned no scores".into()))?;
        let label = self
            .artifact
            .labels
            .label_at(index)
            .ok_or_else(|| KwsError::Value(format!("model scored unknown label index {index}")))?
            .to_string();
        debug!(source = %source.describe(), label = %label, probability, "scored clip");
        Ok(PredictionResult {
            label,
            probability: probability.clamp(0.0, 1.0),
        })
    }
}

/// Loads the model in `model_artifact_dir` and scores `source` with it.
///
/// Every failure is reported as [`KwsError::NotFound`].
pub fn predict(
    source: &AudioSource,
    model_artifact_dir: &Path,
    n_coefficients: usize,
    fixed_length: usize,
    sampling_rate: u32,
) -> Result<PredictionResult> {
    let params = FeatureParams::new(n_coefficients, fixed_length, sampling_rate);
    KeywordSpotter::load(model_artifact_dir, params)
        .and_then(|spotter| spotter.predict(source))
        .map_err(KwsError::into_not_found)
}
