mod common;

use std::fs;

use kws_spotter::dataset::build;
use kws_spotter::error::KwsError;
use kws_spotter::model::{
    flatten_batch, Architecture, CentroidArchitecture, Classifier, SoftmaxArchitecture,
};
use kws_spotter::tracking::MemoryTracker;
use kws_spotter::training::{Trainer, TrainingParams};

use common::{params, write_corpus, yes_no_corpus};

fn training_params() -> TrainingParams {
    TrainingParams::new(4, 20, 0.05).with_seed(42)
}

#[test]
fn trains_and_logs_one_run_per_call() {
    let corpus = yes_no_corpus();
    let dataset = build(corpus.path(), params(), 0.2, 42).unwrap();
    let mut tracker = MemoryTracker::new("kws");

    let outcome = Trainer::new(&dataset, training_params(), &mut tracker, "val_accuracy")
        .train(&SoftmaxArchitecture)
        .unwrap();
    assert_eq!(outcome.history.len(), 20);
    assert_eq!(outcome.selection.metric, "val_accuracy");
    assert_eq!(outcome.selection.runs.len(), 1);
    assert_eq!(outcome.selection.best().unwrap().run_id, outcome.run_id);

    let last = outcome.history.last().unwrap();
    assert!(last.loss.is_finite());
    assert!((0.0..=1.0).contains(&last.accuracy));
    assert!(last.accuracy >= 0.9, "training accuracy {}", last.accuracy);

    let second = Trainer::new(&dataset, training_params(), &mut tracker, "val_accuracy")
        .train(&CentroidArchitecture)
        .unwrap();
    assert_eq!(second.selection.runs.len(), 2);
    assert_ne!(second.run_id, outcome.run_id);
    assert_eq!(tracker.runs().count(), 2);
}

#[test]
fn logged_run_carries_params_and_final_metrics() {
    let corpus = yes_no_corpus();
    let dataset = build(corpus.path(), params(), 0.2, 42).unwrap();
    let mut tracker = MemoryTracker::new("kws");
    let outcome = Trainer::new(&dataset, training_params(), &mut tracker, "val_loss")
        .train(&CentroidArchitecture)
        .unwrap();

    let (_, record) = tracker.runs().next().unwrap();
    assert_eq!(record.params["architecture"], CentroidArchitecture.name());
    assert_eq!(record.params["epochs"], "20");
    for metric in ["loss", "accuracy", "val_loss", "val_accuracy"] {
        assert!(record.metrics.contains_key(metric), "{metric}");
    }
    let artifact = tracker.artifact(&outcome.run_id).unwrap();
    assert_eq!(artifact.params, params());
    assert_eq!(artifact.labels, dataset.labels);
}

#[test]
fn empty_metric_name_is_rejected() {
    let corpus = yes_no_corpus();
    let dataset = build(corpus.path(), params(), 0.2, 42).unwrap();
    let mut tracker = MemoryTracker::new("kws");
    let err = Trainer::new(&dataset, training_params(), &mut tracker, "")
        .train(&SoftmaxArchitecture)
        .unwrap_err();
    assert!(matches!(err, KwsError::Value(_)), "{err:?}");
    assert_eq!(tracker.runs().count(), 0);
}

#[test]
fn invalid_training_params_are_rejected() {
    let corpus = yes_no_corpus();
    let dataset = build(corpus.path(), params(), 0.2, 42).unwrap();
    let mut tracker = MemoryTracker::new("kws");
    let err = Trainer::new(
        &dataset,
        TrainingParams::new(0, 5, 0.05),
        &mut tracker,
        "val_accuracy",
    )
    .train(&SoftmaxArchitecture)
    .unwrap_err();
    assert!(matches!(err, KwsError::Value(_)), "{err:?}");
}

#[test]
fn centroid_never_predicts_a_label_without_clips() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path(), &["no", "yes"], 5);
    fs::create_dir(dir.path().join("maybe")).unwrap();
    let dataset = build(dir.path(), params(), 0.2, 42).unwrap();
    assert_eq!(dataset.labels.index_of("maybe"), Some(0));

    let mut tracker = MemoryTracker::new("kws");
    let outcome = Trainer::new(&dataset, training_params(), &mut tracker, "val_accuracy")
        .train(&CentroidArchitecture)
        .unwrap();
    let artifact = tracker.artifact(&outcome.run_id).unwrap();

    for x in [&dataset.x_train, &dataset.x_test] {
        let probs = artifact
            .classifier
            .predict_proba(&flatten_batch(x).unwrap())
            .unwrap();
        assert!(probs.column(0).iter().all(|&p| p == 0.0), "{probs:?}");
    }
}
