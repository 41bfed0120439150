use std::fs;
use std::path::Path;

use super::*;
use crate::model::{EvaluationRecord, Rating};
use crate::store::snapshot_path;

fn reset_args(data_dir: &Path, user: &str, yes: bool) -> ResetArgs {
    ResetArgs {
        data_dir: data_dir.to_path_buf(),
        user: user.to_string(),
        yes,
    }
}

#[test]
fn reset_without_yes_keeps_evaluations() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut store = EvaluationStore::empty(dir.path(), "alice");
    store
        .upsert(EvaluationRecord::new("r1", "a", Rating::Correct, ""))
        .expect("upsert persists");

    let err = run(reset_args(dir.path(), "alice", false)).expect_err("--yes is required");
    assert!(err.to_string().contains("without --yes"), "unexpected error: {err}");

    let reopened = EvaluationStore::open(dir.path(), "alice").expect("store opens");
    assert_eq!(reopened.records().len(), 1);
}

#[test]
fn reset_overwrites_an_unreadable_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = snapshot_path(dir.path(), "alice");
    fs::write(&path, "not,a,snapshot\n").expect("fixture should be written");
    assert!(EvaluationStore::open(dir.path(), "alice").is_err());

    run(reset_args(dir.path(), "alice", true)).expect("reset succeeds");

    let reopened = EvaluationStore::open(dir.path(), "alice").expect("store opens");
    assert!(reopened.records().is_empty());
    let contents = fs::read_to_string(&path).expect("snapshot exists");
    assert_eq!(contents.trim_end(), "request_id,section,rating,comment");
}

#[test]
fn reset_rejects_blank_identity() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let err = run(reset_args(dir.path(), "  ", true)).expect_err("blank identity");
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::EmptyIdentity)
    ));
}
