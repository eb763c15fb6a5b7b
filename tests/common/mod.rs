#![allow(dead_code)]

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use kws_spotter::audio::encoder::encode_wav;
use kws_spotter::types::{AudioClip, FeatureParams};

pub const SAMPLE_RATE: u32 = 16_000;
pub const CLIP_SECS: f32 = 0.5;
pub const CLIPS_PER_LABEL: usize = 10;

pub fn params() -> FeatureParams {
    FeatureParams::new(13, 32, SAMPLE_RATE)
}

pub fn tone(frequency: f32, seconds: f32, sample_rate: u32) -> AudioClip {
    let len = (seconds * sample_rate as f32) as usize;
    let samples = (0..len)
        .map(|n| 0.5 * (2.0 * PI * frequency * n as f32 / sample_rate as f32).sin())
        .collect();
    AudioClip::new(samples, sample_rate)
}

pub fn write_tone(path: &Path, frequency: f32) -> PathBuf {
    encode_wav(&tone(frequency, CLIP_SECS, SAMPLE_RATE), path).expect("write tone");
    path.to_path_buf()
}

/// Base frequency of the synthetic clips for each label.
pub fn label_frequency(label: &str) -> f32 {
    match label {
        "yes" => 440.0,
        "no" => 2_500.0,
        _ => 1_200.0,
    }
}

/// Writes `root/<label>/<label>_NN.wav` tones, slightly detuned per clip.
pub fn write_corpus(root: &Path, labels: &[&str], per_label: usize) {
    for label in labels {
        let dir = root.join(label);
        fs::create_dir_all(&dir).expect("create label dir");
        for index in 0..per_label {
            let frequency = label_frequency(label) + 10.0 * index as f32;
            write_tone(&dir.join(format!("{label}_{index:02}.wav")), frequency);
        }
    }
}

pub fn yes_no_corpus() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_corpus(dir.path(), &["yes", "no"], CLIPS_PER_LABEL);
    dir
}

pub fn wav_bytes(frequency: f32) -> Vec<u8> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_tone(&dir.path().join("clip.wav"), frequency);
    fs::read(path).expect("read wav")
}
