use super::{ExperimentTracker, ModelSelection, RankedRun, RunRecord};
use crate::error::{KwsError, Result};
use crate::model::ModelArtifact;

/// Keeps runs in process memory; nothing touches the file system.
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    experiment_name: String,
    started: bool,
    runs: Vec<(String, RunRecord, ModelArtifact)>,
}

impl MemoryTracker {
    pub fn new(experiment_name: impl Into<String>) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> impl Iterator<Item = (&str, &RunRecord)> {
        self.runs.iter().map(|(id, record, _)| (id.as_str(), record))
    }

    pub fn artifact(&self, run_id: &str) -> Option<&ModelArtifact> {
        self.runs
            .iter()
            .find(|(id, _, _)| id == run_id)
            .map(|(_, _, artifact)| artifact)
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(KwsError::Tracking(format!(
                "experiment '{}' was never started",
                self.experiment_name
            )))
        }
    }
}

impl ExperimentTracker for MemoryTracker {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn log(&mut self, run: &RunRecord, model: &ModelArtifact) -> Result<String> {
        self.ensure_started()?;
        let run_id = format!("run-{:04}", self.runs.len() + 1);
        self.runs.push((run_id.clone(), run.clone(), model.clone()));
        Ok(run_id)
    }

    fn find_best_model(&self, metric: &str) -> Result<ModelSelection> {
        self.ensure_started()?;
        let runs = self
            .runs
            .iter()
            .map(|(run_id, record, _)| RankedRun {
                experiment_id: self.experiment_name.clone(),
                run_id: run_id.clone(),
                value: record.metrics.get(metric).copied(),
                model_dir: None,
            })
            .collect();
        Ok(ModelSelection::new(metric, runs))
    }
}
