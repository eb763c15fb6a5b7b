//! Experiment tracking: recording runs and ranking them by a metric.

mod file;
mod memory;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

pub use file::{resolve_tracking_uri, FileTracker};
pub use memory::MemoryTracker;

use crate::error::{KwsError, Result};
use crate::model::ModelArtifact;
use crate::training::EpochMetrics;

/// Records training runs and selects the best one by metric.
pub trait ExperimentTracker {
    /// Prepares the experiment; must be called before [`log`](Self::log).
    fn start(&mut self) -> Result<()>;

    /// Stores a finished run with its model artifact and returns the run id.
    fn log(&mut self, run: &RunRecord, model: &ModelArtifact) -> Result<String>;

    /// All runs of the experiment, sorted by `metric` descending. Runs that
    /// never reported the metric come last.
    fn find_best_model(&self, metric: &str) -> Result<ModelSelection>;
}

/// Parameters, final metrics and per-epoch history of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub history: Vec<EpochMetrics>,
}

impl RunRecord {
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRun {
    pub experiment_id: String,
    pub run_id: String,
    pub value: Option<f64>,
    /// Directory holding the run's `model.json`, when the store keeps one.
    pub model_dir: Option<PathBuf>,
}

/// Runs of one experiment ordered by a metric, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub metric: String,
    pub runs: Vec<RankedRun>,
}

impl ModelSelection {
    pub fn new(metric: impl Into<String>, mut runs: Vec<RankedRun>) -> Self {
        runs.sort_by(|a, b| compare_desc(a.value, b.value));
        Self {
            metric: metric.into(),
            runs,
        }
    }

    /// Highest-ranked run that reported a comparable value for the metric.
    pub fn best(&self) -> Option<&RankedRun> {
        self.runs
            .first()
            .filter(|run| comparable(run.value).is_some())
    }
}

/// NaN metrics rank with missing ones.
fn comparable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

fn compare_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (comparable(a), comparable(b)) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Copies the model of `run` into `destination` for serving.
pub fn promote(run: &RankedRun, destination: &Path) -> Result<PathBuf> {
    let source = run.model_dir.as_deref().ok_or_else(|| {
        KwsError::NotFound(format!("run {} has no stored model artifact", run.run_id))
    })?;
    let artifact = ModelArtifact::load(source)?;
    let path = artifact.save(destination)?;
    info!(run_id = %run.run_id, destination = %destination.display(), "promoted model");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str, value: Option<f64>) -> RankedRun {
        RankedRun {
            experiment_id: "kws".into(),
            run_id: id.into(),
            value,
            model_dir: None,
        }
    }

    #[test]
    fn selection_sorts_descending_with_missing_last() {
        let selection = ModelSelection::new(
            "val_accuracy",
            vec![run("a", Some(0.5)), run("b", None), run("c", Some(0.9))],
        );
        let order: Vec<_> = selection.runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(selection.best().map(|r| r.run_id.as_str()), Some("c"));
    }

    #[test]
    fn nan_metrics_rank_after_real_values() {
        let selection = ModelSelection::new(
            "val_loss",
            vec![
                run("a", Some(f64::NAN)),
                run("b", Some(0.3)),
                run("c", None),
                run("d", Some(0.7)),
                run("e", Some(f64::NAN)),
            ],
        );
        let order: Vec<_> = selection.runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(&order[..2], &["d", "b"]);
        assert_eq!(selection.best().map(|r| r.run_id.as_str()), Some("d"));

        let only_nan = ModelSelection::new("val_loss", vec![run("a", Some(f64::NAN))]);
        assert!(only_nan.best().is_none());
    }

    #[test]
    fn best_is_none_when_no_run_reported_metric() {
        let selection = ModelSelection::new("loss", vec![run("a", None)]);
        assert!(selection.best().is_none());
    }

    #[test]
    fn promote_requires_stored_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = promote(&run("a", Some(1.0)), dir.path()).unwrap_err();
        assert!(err.is_not_found());
    }
}
