//! MFCC feature extraction with a fixed output shape.

mod mel;

pub(crate) use mel::MEL_BANDS;

use ndarray::{s, Array2};
use tracing::debug;

use crate::audio::{decoder, resample};
use crate::error::Result;
use crate::types::{AudioClip, AudioSource, FeatureParams};

/// `(n_coefficients, fixed_length)` MFCC matrix.
pub type FeatureMatrix = Array2<f32>;

/// Turns audio sources into fixed-shape MFCC matrices.
#[derive(Debug, Clone, Copy)]
pub struct AudioFeatureExtractor {
    params: FeatureParams,
}

impl AudioFeatureExtractor {
    pub fn new(params: FeatureParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> FeatureParams {
        self.params
    }

    pub fn extract(&self, source: &AudioSource) -> Result<FeatureMatrix> {
        let clip = decoder::decode_audio(source)?;
        self.extract_clip(&clip)
    }

    /// Same as [`extract`](Self::extract) for audio that is already decoded.
    pub fn extract_clip(&self, clip: &AudioClip) -> Result<FeatureMatrix> {
        let samples = resample::linear_resample(
            &clip.samples,
            clip.sample_rate,
            self.params.sampling_rate,
        )?;
        let frames = mel::mfcc_frames(
            &samples,
            self.params.sampling_rate,
            self.params.n_coefficients,
        );
        debug!(
            natural_frames = frames.nrows(),
            fixed_length = self.params.fixed_length,
            "computed mfcc frames"
        );
        Ok(fit_frames(&frames.t().to_owned(), self.params.fixed_length))
    }
}

/// Extracts an MFCC matrix of shape `(n_coefficients, fixed_length)` from `source`.
pub fn extract(
    source: &AudioSource,
    n_coefficients: usize,
    fixed_length: usize,
    sampling_rate: u32,
) -> Result<FeatureMatrix> {
    AudioFeatureExtractor::new(FeatureParams::new(
        n_coefficients,
        fixed_length,
        sampling_rate,
    ))?
    .extract(source)
}

/// Truncates trailing columns beyond `fixed_length`, or zero-pads up to it.
pub fn fit_frames(coefficients: &Array2<f32>, fixed_length: usize) -> FeatureMatrix {
    let (rows, cols) = coefficients.dim();
    let keep = cols.min(fixed_length);
    let mut fitted = Array2::zeros((rows, fixed_length));
    fitted
        .slice_mut(s![.., ..keep])
        .assign(&coefficients.slice(s![.., ..keep]));
    fitted
}
