use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{KwsError, Result};
use crate::types::{AudioClip, AudioSource};

/// Decode an audio file or upload buffer to raw PCM samples (mono, f32)
pub fn decode_audio(source: &AudioSource) -> Result<AudioClip> {
    let (media, hint): (Box<dyn MediaSource>, Hint) = match source {
        AudioSource::Path(path) => (Box::new(open_file(path)?), hint_for_path(path)),
        AudioSource::Memory { bytes, extension } => {
            let mut hint = Hint::new();
            if let Some(extension) = extension {
                hint.with_extension(extension);
            }
            (Box::new(Cursor::new(bytes.clone())), hint)
        }
    };
    let origin = source.describe();
    let mss = MediaSourceStream::new(media, Default::default());

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| unsupported(&origin, format!("failed to probe format: {err}")))?;

    let mut format = probe_result.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| unsupported(&origin, "no audio tracks found"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| unsupported(&origin, "sample rate not specified"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| unsupported(&origin, format!("failed to create decoder: {err}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(unsupported(&origin, format!("failed to read packet: {err}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|err| unsupported(&origin, format!("failed to decode packet: {err}")))?;

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(mix_to_mono(buffer.samples(), channels));
    }

    if samples.is_empty() {
        return Err(unsupported(&origin, "stream contains no samples"));
    }

    debug!(
        source = %origin,
        samples = samples.len(),
        sample_rate,
        "decoded audio"
    );

    Ok(AudioClip {
        samples,
        sample_rate,
    })
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| {
        KwsError::Io(std::io::Error::new(
            err.kind(),
            format!("failed to open audio file {}: {err}", path.display()),
        ))
    })
}

fn hint_for_path(path: &Path) -> Hint {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }
    hint
}

/// Average interleaved frames down to a single channel.
fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn unsupported(origin: &str, reason: impl AsRef<str>) -> KwsError {
    KwsError::UnsupportedFormat(format!("{origin}: {}", reason.as_ref()))
}
