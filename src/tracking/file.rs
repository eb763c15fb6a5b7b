use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ExperimentTracker, ModelSelection, RankedRun, RunRecord};
use crate::error::{KwsError, Result};
use crate::model::{write_json_file, ModelArtifact};

const EXPERIMENT_FILE: &str = "experiment.json";
const RUN_FILE: &str = "run.json";
const MODEL_DIR: &str = "model";
const RUN_PREFIX: &str = "run-";

/// On-disk run store:
/// `<root>/<experiment>/experiment.json` and
/// `<root>/<experiment>/<run_id>/{run.json, model/model.json}`.
#[derive(Debug, Clone)]
pub struct FileTracker {
    experiment_name: String,
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExperimentMeta {
    experiment_id: String,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRun {
    experiment_id: String,
    run_id: String,
    #[serde(flatten)]
    record: RunRecord,
}

impl FileTracker {
    pub fn new(experiment_name: impl Into<String>, tracking_uri: &str) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            root: resolve_tracking_uri(tracking_uri),
        }
    }

    pub fn experiment_dir(&self) -> PathBuf {
        self.root.join(&self.experiment_name)
    }

    fn read_experiment(&self) -> Result<ExperimentMeta> {
        let path = self.experiment_dir().join(EXPERIMENT_FILE);
        let file = File::open(&path).map_err(|_| {
            KwsError::Tracking(format!(
                "invalid experiment details for '{}': {} is missing",
                self.experiment_name,
                path.display()
            ))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            KwsError::Tracking(format!(
                "invalid experiment details for '{}': {err}",
                self.experiment_name
            ))
        })
    }

    fn next_run_id(&self) -> Result<String> {
        let existing = self.run_dirs()?.len();
        let dir = self.experiment_dir();
        let mut index = existing + 1;
        loop {
            let candidate = format!("{RUN_PREFIX}{index:04}");
            if !dir.join(&candidate).exists() {
                return Ok(candidate);
            }
            index += 1;
        }
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(self.experiment_dir())? {
            let entry = entry?;
            let is_run = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(RUN_PREFIX));
            if is_run && entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

impl ExperimentTracker for FileTracker {
    fn start(&mut self) -> Result<()> {
        let dir = self.experiment_dir();
        fs::create_dir_all(&dir)?;
        let meta_path = dir.join(EXPERIMENT_FILE);
        if !meta_path.exists() {
            let meta = ExperimentMeta {
                experiment_id: self.experiment_name.clone(),
                name: self.experiment_name.clone(),
            };
            write_json_file(&meta_path, &meta)?;
        }
        info!(
            experiment = %self.experiment_name,
            root = %self.root.display(),
            "tracking experiment"
        );
        Ok(())
    }

    fn log(&mut self, run: &RunRecord, model: &ModelArtifact) -> Result<String> {
        let meta = self.read_experiment()?;
        let run_id = self.next_run_id()?;
        let run_dir = self.experiment_dir().join(&run_id);
        fs::create_dir_all(&run_dir)?;

        let stored = StoredRun {
            experiment_id: meta.experiment_id,
            run_id: run_id.clone(),
            record: run.clone(),
        };
        write_json_file(&run_dir.join(RUN_FILE), &stored)?;
        model.save(&run_dir.join(MODEL_DIR))?;

        info!(run_id = %run_id, metrics = ?run.metrics, "logged run");
        Ok(run_id)
    }

    fn find_best_model(&self, metric: &str) -> Result<ModelSelection> {
        let meta = self.read_experiment()?;
        let mut runs = Vec::new();
        for dir in self.run_dirs()? {
            let path = dir.join(RUN_FILE);
            if !path.is_file() {
                debug!(dir = %dir.display(), "skipping run without run.json");
                continue;
            }
            let stored: StoredRun =
                serde_json::from_reader(BufReader::new(File::open(&path)?))?;
            let model_dir = dir.join(MODEL_DIR);
            runs.push(RankedRun {
                experiment_id: meta.experiment_id.clone(),
                run_id: stored.run_id,
                value: stored.record.metrics.get(metric).copied(),
                model_dir: model_dir.is_dir().then_some(model_dir),
            });
        }
        Ok(ModelSelection::new(metric, runs))
    }
}

/// Maps a tracking URI (`file:./artifacts`, `file:/./artifacts`,
/// `file:///abs/path` or a bare path) to a directory.
pub fn resolve_tracking_uri(uri: &str) -> PathBuf {
    let rest = uri.strip_prefix("file:").unwrap_or(uri);
    let rest = if rest.starts_with("///") { &rest[2..] } else { rest };
    let rest = if rest.starts_with("/./") || rest.starts_with("/../") {
        &rest[1..]
    } else {
        rest
    };
    Path::new(rest).to_path_buf()
}
