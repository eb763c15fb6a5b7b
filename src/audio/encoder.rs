use std::path::Path;

use crate::error::{KwsError, Result};
use crate::types::AudioClip;

/// Write a clip as 16-bit mono PCM WAV.
pub fn encode_wav<P: AsRef<Path>>(clip: &AudioClip, path: P) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|err| wav_error(path, "create", err))?;
    for &sample in &clip.samples {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(scaled)
            .map_err(|err| wav_error(path, "write", err))?;
    }
    writer
        .finalize()
        .map_err(|err| wav_error(path, "finalize", err))?;
    Ok(())
}

fn wav_error(path: &Path, action: &str, err: hound::Error) -> KwsError {
    match err {
        hound::Error::IoError(io) => KwsError::Io(io),
        other => KwsError::UnsupportedFormat(format!(
            "failed to {action} WAV file {}: {other}",
            path.display()
        )),
    }
}
