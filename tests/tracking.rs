use kws_spotter::dataset::LabelEncoding;
use kws_spotter::error::KwsError;
use kws_spotter::model::{Architecture, ModelArtifact, SoftmaxArchitecture, MODEL_FILE};
use kws_spotter::tracking::{promote, ExperimentTracker, FileTracker, RunRecord};
use kws_spotter::types::FeatureParams;

fn artifact() -> ModelArtifact {
    let params = FeatureParams::new(2, 4, 16_000);
    let labels = LabelEncoding::new(vec!["no".into(), "yes".into()]).unwrap();
    let classifier = SoftmaxArchitecture.define(params, labels.len());
    ModelArtifact::new(SoftmaxArchitecture.name(), params, labels, classifier).unwrap()
}

fn record(val_accuracy: Option<f64>) -> RunRecord {
    let record = RunRecord::default().with_param("architecture", "softmax");
    match val_accuracy {
        Some(value) => record.with_metric("val_accuracy", value),
        None => record,
    }
}

#[test]
fn runs_are_ranked_by_metric_descending() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file:{}", dir.path().display());
    let mut tracker = FileTracker::new("kws", &uri);
    tracker.start().unwrap();

    let low = tracker.log(&record(Some(0.6)), &artifact()).unwrap();
    let missing = tracker.log(&record(None), &artifact()).unwrap();
    let high = tracker.log(&record(Some(0.95)), &artifact()).unwrap();

    let selection = tracker.find_best_model("val_accuracy").unwrap();
    let order: Vec<_> = selection.runs.iter().map(|run| run.run_id.clone()).collect();
    assert_eq!(order, vec![high.clone(), low, missing]);
    let best = selection.best().unwrap();
    assert_eq!(best.run_id, high);
    assert_eq!(best.value, Some(0.95));
    assert_eq!(best.experiment_id, "kws");
    assert!(best.model_dir.as_ref().unwrap().join(MODEL_FILE).is_file());
}

#[test]
fn runs_survive_a_new_tracker_instance() {
    let dir = tempfile::tempdir().unwrap();
    let uri = dir.path().display().to_string();
    let mut first = FileTracker::new("kws", &uri);
    first.start().unwrap();
    let run_id = first.log(&record(Some(0.7)), &artifact()).unwrap();

    let second = FileTracker::new("kws", &uri);
    let selection = second.find_best_model("val_accuracy").unwrap();
    assert_eq!(selection.runs.len(), 1);
    assert_eq!(selection.runs[0].run_id, run_id);
}

#[test]
fn unknown_experiment_is_a_tracking_error() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = FileTracker::new("never-started", &dir.path().display().to_string());
    let err = tracker.find_best_model("val_accuracy").unwrap_err();
    assert!(matches!(err, KwsError::Tracking(_)), "{err:?}");
}

#[test]
fn promote_copies_the_best_model_for_serving() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = FileTracker::new("kws", &dir.path().join("runs").display().to_string());
    tracker.start().unwrap();
    tracker.log(&record(Some(0.8)), &artifact()).unwrap();

    let selection = tracker.find_best_model("val_accuracy").unwrap();
    let serving = dir.path().join("serving");
    let path = promote(selection.best().unwrap(), &serving).unwrap();
    assert_eq!(path, serving.join(MODEL_FILE));
    assert_eq!(ModelArtifact::load(&serving).unwrap(), artifact());
}
