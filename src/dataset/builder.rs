use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, Axis};
use tracing::{debug, info};

use super::labels::LabelEncoding;
use super::split::{train_test_indices, validate_fraction};
use super::Dataset;
use crate::error::{KwsError, Result};
use crate::features::{AudioFeatureExtractor, FeatureMatrix};
use crate::types::{AudioSource, FeatureParams};

const AUDIO_EXTENSION: &str = "wav";

/// Builds a labeled, seeded train/test [`Dataset`] from a corpus laid out as
/// `training_root/<label>/<clip>.wav`.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    extractor: AudioFeatureExtractor,
    seed: u64,
}

struct LabeledSample {
    path: PathBuf,
    label_index: usize,
    features: FeatureMatrix,
}

impl DatasetBuilder {
    pub fn new(extractor: AudioFeatureExtractor, seed: u64) -> Self {
        Self { extractor, seed }
    }

    pub fn build(&self, training_root: &Path, test_split_fraction: f64) -> Result<Dataset> {
        validate_fraction(test_split_fraction)?;
        let labels = LabelEncoding::from_directory(training_root)?;
        info!(
            root = %training_root.display(),
            labels = labels.len(),
            "building dataset"
        );

        let samples = self.extract_corpus(training_root, &labels)?;
        if samples.is_empty() {
            return Err(KwsError::Directory(format!(
                "no .{AUDIO_EXTENSION} files found under {}",
                training_root.display()
            )));
        }

        let split = train_test_indices(samples.len(), test_split_fraction, self.seed)?;
        let params = self.extractor.params();
        let (x_train, y_train, train_files) = stack(&samples, &split.train, &labels, params);
        let (x_test, y_test, test_files) = stack(&samples, &split.test, &labels, params);

        let dataset = Dataset {
            x_train,
            y_train,
            x_test,
            y_test,
            labels,
            params,
            train_files,
            test_files,
        };
        dataset.log_shapes();
        Ok(dataset)
    }

    fn extract_corpus(
        &self,
        training_root: &Path,
        labels: &LabelEncoding,
    ) -> Result<Vec<LabeledSample>> {
        let mut samples = Vec::new();
        for (label_index, label) in labels.labels().iter().enumerate() {
            let files = collect_audio_files(&training_root.join(label))?;
            debug!(label = %label, files = files.len(), "extracting label directory");
            for path in files {
                let features = self.extractor.extract(&AudioSource::from_path(&path))?;
                samples.push(LabeledSample {
                    path,
                    label_index,
                    features,
                });
            }
        }
        Ok(samples)
    }
}

/// Builds a dataset from `training_root` with the given feature params and seed.
pub fn build(
    training_root: &Path,
    params: FeatureParams,
    test_split_fraction: f64,
    seed: u64,
) -> Result<Dataset> {
    validate_fraction(test_split_fraction)?;
    DatasetBuilder::new(AudioFeatureExtractor::new(params)?, seed)
        .build(training_root, test_split_fraction)
}

/// `.wav` files (case-insensitive) directly inside `label_dir`, sorted by name.
pub fn collect_audio_files(label_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(label_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_audio = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION));
        if is_audio {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn stack(
    samples: &[LabeledSample],
    rows: &[usize],
    labels: &LabelEncoding,
    params: FeatureParams,
) -> (Array3<f32>, Array2<f32>, Vec<PathBuf>) {
    let mut x = Array3::zeros((rows.len(), params.n_coefficients, params.fixed_length));
    let mut y = Array2::zeros((rows.len(), labels.len()));
    let mut files = Vec::with_capacity(rows.len());
    for (row, &index) in rows.iter().enumerate() {
        let sample = &samples[index];
        x.index_axis_mut(Axis(0), row).assign(&sample.features);
        y.index_axis_mut(Axis(0), row)
            .assign(&labels.one_hot(sample.label_index));
        files.push(sample.path.clone());
    }
    (x, y, files)
}
