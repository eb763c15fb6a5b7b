use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{KwsError, Result};

/// Lists keyword labels: the immediate, non-hidden subdirectories of
/// `training_root`, sorted lexicographically.
pub fn list_labels(training_root: &Path) -> Result<Vec<String>> {
    if !training_root.is_dir() {
        return Err(KwsError::Directory(format!(
            "training root {} does not exist or is not a directory",
            training_root.display()
        )));
    }

    let mut labels = Vec::new();
    for entry in fs::read_dir(training_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = ?entry.path(), "skipping non UTF-8 label directory");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        labels.push(name);
    }

    if labels.is_empty() {
        return Err(KwsError::Directory(format!(
            "training root {} contains no label directories",
            training_root.display()
        )));
    }
    labels.sort();
    Ok(labels)
}

/// Fixed label <-> index mapping shared by training and inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    labels: Vec<String>,
}

impl LabelEncoding {
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(KwsError::Value("label set must not be empty".into()));
        }
        let mut sorted = labels.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != labels.len() {
            return Err(KwsError::Value("label set contains duplicates".into()));
        }
        Ok(Self { labels })
    }

    pub fn from_directory(training_root: &Path) -> Result<Self> {
        Self::new(list_labels(training_root)?)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|candidate| candidate == label)
    }

    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn one_hot(&self, index: usize) -> Array1<f32> {
        let mut row = Array1::zeros(self.labels.len());
        if index < self.labels.len() {
            row[index] = 1.0;
        }
        row
    }
}
