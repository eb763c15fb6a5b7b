use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

pub(crate) const FFT_SIZE: usize = 2048;
pub(crate) const HOP_SIZE: usize = 512;
pub(crate) const MEL_BANDS: usize = 128;
const MIN_FREQ: f64 = 0.0;

/// MFCC frames for a mono waveform already at `sample_rate`.
///
/// Returns `(frames, n_coefficients)`; the frame count follows the clip
/// duration. Waveforms shorter than one FFT window are zero-padded to a
/// single window.
pub(crate) fn mfcc_frames(samples: &[f32], sample_rate: u32, n_coefficients: usize) -> Array2<f32> {
    let mut audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    if audio.len() < FFT_SIZE {
        audio.resize(FFT_SIZE, 0.0);
    }

    let stft = spectrum::rstft(&audio, FFT_SIZE, HOP_SIZE, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(FFT_SIZE, sample_rate);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (sample_rate as f64) / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    let mfcc = analysis::mel::mfcc_spectrogram(&mel, n_coefficients, None);

    frames_to_array(&mfcc, n_coefficients)
}

/// Packs ragged frame vectors into a dense `(frames, width)` array.
///
/// Missing coefficients and non-finite values (log of silent bands) become 0.
fn frames_to_array(frames: &[Vec<f64>], width: usize) -> Array2<f32> {
    let mut array = Array2::zeros((frames.len(), width));
    for (mut row, frame) in array.outer_iter_mut().zip(frames) {
        for (slot, &value) in row.iter_mut().zip(frame.iter()) {
            *slot = if value.is_finite() { value as f32 } else { 0.0 };
        }
    }
    array
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_to_array_zeroes_gaps_and_non_finite_values() {
        let frames = vec![vec![1.0, f64::NEG_INFINITY], vec![2.0]];
        let array = frames_to_array(&frames, 3);
        assert_eq!(array.dim(), (2, 3));
        assert_eq!(array[[0, 0]], 1.0);
        assert_eq!(array[[0, 1]], 0.0);
        assert_eq!(array[[1, 0]], 2.0);
        assert_eq!(array[[1, 2]], 0.0);
    }

    #[test]
    fn tiny_waveform_yields_at_least_one_frame() {
        let samples: Vec<f32> = (0..100).map(|i| ((i as f32) * 0.3).sin() * 0.5).collect();
        let frames = mfcc_frames(&samples, 16_000, 13);
        assert!(frames.nrows() >= 1);
        assert_eq!(frames.ncols(), 13);
    }
}
