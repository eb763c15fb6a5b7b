//! Core types for the keyword-spotting pipeline

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{KwsError, Result};
use crate::features::MEL_BANDS;

/// Raw audio data representation (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 16000)
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }
}

/// Where audio bytes come from: a file on disk or an uploaded buffer.
#[derive(Debug, Clone)]
pub enum AudioSource {
    Path(PathBuf),
    Memory {
        bytes: Vec<u8>,
        /// Format hint, e.g. `"wav"`, taken from the upload's file name.
        extension: Option<String>,
    },
}

impl AudioSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        AudioSource::Path(path.into())
    }

    pub fn from_bytes(bytes: Vec<u8>, filename: &str) -> Self {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        AudioSource::Memory { bytes, extension }
    }

    /// Human-readable origin used in log fields and error messages.
    pub fn describe(&self) -> String {
        match self {
            AudioSource::Path(path) => path.display().to_string(),
            AudioSource::Memory { bytes, .. } => format!("<{} byte upload>", bytes.len()),
        }
    }
}

/// Shape and rate settings shared by training and inference.
///
/// A model is only usable with the exact params it was trained on, so these
/// travel inside the model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureParams {
    pub n_coefficients: usize,
    pub fixed_length: usize,
    pub sampling_rate: u32,
}

impl FeatureParams {
    pub fn new(n_coefficients: usize, fixed_length: usize, sampling_rate: u32) -> Self {
        Self {
            n_coefficients,
            fixed_length,
            sampling_rate,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_coefficients == 0 {
            return Err(KwsError::Value(
                "n_coefficients must be greater than zero".into(),
            ));
        }
        if self.n_coefficients > MEL_BANDS {
            return Err(KwsError::Value(format!(
                "n_coefficients must not exceed the {MEL_BANDS} mel bands, got {}",
                self.n_coefficients
            )));
        }
        if self.fixed_length == 0 {
            return Err(KwsError::Value(
                "fixed_length must be greater than zero".into(),
            ));
        }
        if self.sampling_rate == 0 {
            return Err(KwsError::Value("sampling_rate must be positive".into()));
        }
        Ok(())
    }

    /// Number of values in one flattened feature matrix.
    pub fn flat_len(&self) -> usize {
        self.n_coefficients * self.fixed_length
    }
}

/// Outcome of scoring one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    /// Probability of `label`, in [0, 1]
    pub probability: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_params() {
        assert!(FeatureParams::new(0, 32, 16_000).validate().is_err());
        assert!(FeatureParams::new(13, 0, 16_000).validate().is_err());
        assert!(FeatureParams::new(13, 32, 0).validate().is_err());
        assert!(FeatureParams::new(13, 32, 16_000).validate().is_ok());
    }

    #[test]
    fn caps_coefficients_at_mel_band_count() {
        assert!(FeatureParams::new(MEL_BANDS, 32, 16_000).validate().is_ok());
        assert!(matches!(
            FeatureParams::new(MEL_BANDS + 1, 32, 16_000).validate(),
            Err(KwsError::Value(_))
        ));
    }

    #[test]
    fn upload_extension_is_lowercased() {
        let source = AudioSource::from_bytes(vec![0; 4], "Clip.WAV");
        match source {
            AudioSource::Memory { extension, .. } => assert_eq!(extension.as_deref(), Some("wav")),
            AudioSource::Path(_) => panic!("expected in-memory source"),
        }
    }
}
