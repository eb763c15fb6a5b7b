use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Classifier, KeywordClassifier};
use crate::dataset::LabelEncoding;
use crate::error::{KwsError, Result};
use crate::types::FeatureParams;

pub const MODEL_FILE: &str = "model.json";

/// Everything inference needs: the fitted classifier plus the feature params
/// and label encoding it was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub architecture: String,
    pub params: FeatureParams,
    pub labels: LabelEncoding,
    pub classifier: KeywordClassifier,
}

impl ModelArtifact {
    pub fn new(
        architecture: impl Into<String>,
        params: FeatureParams,
        labels: LabelEncoding,
        classifier: KeywordClassifier,
    ) -> Result<Self> {
        let artifact = Self {
            architecture: architecture.into(),
            params,
            labels,
            classifier,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Checks that the classifier's shape agrees with params and labels.
    pub fn validate(&self) -> Result<()> {
        let (n_features, n_classes) = self.classifier.shape();
        if n_features != self.params.flat_len() {
            return Err(KwsError::Value(format!(
                "classifier expects {n_features} features but params give {}",
                self.params.flat_len()
            )));
        }
        if n_classes != self.labels.len() {
            return Err(KwsError::Value(format!(
                "classifier has {n_classes} outputs for {} labels",
                self.labels.len()
            )));
        }
        Ok(())
    }

    /// Writes `model.json` into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(MODEL_FILE);
        write_json_file(&path, self)?;
        info!(path = %path.display(), architecture = %self.architecture, "saved model artifact");
        Ok(path)
    }

    /// Reads `model.json` from `dir`. Any failure is reported as `NotFound`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MODEL_FILE);
        if !path.is_file() {
            return Err(KwsError::NotFound(format!(
                "no model artifact at {}",
                path.display()
            )));
        }
        let read = || -> Result<Self> {
            let reader = BufReader::new(File::open(&path)?);
            let artifact: Self = serde_json::from_reader(reader)?;
            artifact.validate()?;
            Ok(artifact)
        };
        read().map_err(|err| {
            KwsError::NotFound(format!(
                "model artifact at {} could not be loaded: {err}",
                path.display()
            ))
        })
    }
}

/// Writes `value` as pretty JSON to `path`, surfacing flush failures.
pub(crate) fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_json(File::create(path)?, value)
}

fn write_json<W: Write, T: Serialize>(sink: W, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(sink);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Architecture, SoftmaxArchitecture};

    fn artifact() -> ModelArtifact {
        let params = FeatureParams::new(2, 3, 8_000);
        let labels = LabelEncoding::new(vec!["no".into(), "yes".into()]).unwrap();
        let classifier = SoftmaxArchitecture.define(params, labels.len());
        ModelArtifact::new("softmax", params, labels, classifier).unwrap()
    }

    #[test]
    fn save_then_load_restores_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let original = artifact();
        original.save(dir.path()).unwrap();
        let restored = ModelArtifact::load(dir.path()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn corrupt_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MODEL_FILE), "{ not json").unwrap();
        assert!(ModelArtifact::load(dir.path()).unwrap_err().is_not_found());
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn buffered_write_failure_is_reported() {
        let err = write_json(FullDisk, &artifact()).unwrap_err();
        assert!(matches!(err, KwsError::Io(_)), "{err:?}");
    }

    #[test]
    fn rejects_mismatched_label_count() {
        let mut broken = artifact();
        broken.labels = LabelEncoding::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert!(broken.validate().is_err());
    }
}
