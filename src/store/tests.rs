use super::*;
use crate::model::Rating;

fn record(request_id: &str, section: &str, rating: Rating, comment: &str) -> EvaluationRecord {
    EvaluationRecord::new(request_id, section, rating, comment)
}

fn open(dir: &Path, user: &str) -> EvaluationStore {
    EvaluationStore::open(dir, user).expect("store should open")
}

#[test]
fn open_without_snapshot_starts_empty() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = open(dir.path(), "alice");
    assert!(store.records().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn upsert_replaces_in_place_and_appends_new_keys() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut store = open(dir.path(), "alice");

    let outcomes = [
        store.upsert(record("r1", "a", Rating::Correct, "")),
        store.upsert(record("r1", "b", Rating::Incorrect, "wrong dose")),
        store.upsert(record("r2", "a", Rating::Ambiguous, "")),
        store.upsert(record("r1", "a", Rating::Incorrect, "changed my mind")),
    ]
    .map(|outcome| outcome.expect("upsert should persist"));

    assert_eq!(
        outcomes,
        [
            UpsertOutcome::Inserted { position: 0 },
            UpsertOutcome::Inserted { position: 1 },
            UpsertOutcome::Inserted { position: 2 },
            UpsertOutcome::Replaced { position: 0 },
        ]
    );
    assert_eq!(
        store.records(),
        &[
            record("r1", "a", Rating::Incorrect, "changed my mind"),
            record("r1", "b", Rating::Incorrect, "wrong dose"),
            record("r2", "a", Rating::Ambiguous, ""),
        ]
    );
    assert_eq!(
        store.last_record(),
        Some(&record("r2", "a", Rating::Ambiguous, ""))
    );
}

#[test]
fn upserts_survive_a_fresh_store() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    {
        let mut store = open(dir.path(), "alice");
        store
            .upsert(record("r1", "a", Rating::Correct, "fine, \"quoted\"\nmultiline"))
            .expect("upsert should persist");
        store
            .upsert(record("r2", "b", Rating::Ambiguous, ""))
            .expect("upsert should persist");
    }

    let reopened = open(dir.path(), "alice");
    assert_eq!(
        reopened.records(),
        &[
            record("r1", "a", Rating::Correct, "fine, \"quoted\"\nmultiline"),
            record("r2", "b", Rating::Ambiguous, ""),
        ]
    );
}

#[test]
fn users_do_not_share_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut alice = open(dir.path(), "alice");
    alice
        .upsert(record("r1", "a", Rating::Correct, ""))
        .expect("upsert should persist");

    let bob = open(dir.path(), "bob");
    assert!(bob.records().is_empty());
    assert_ne!(alice.path(), bob.path());
}

#[test]
fn reset_leaves_header_only_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut store = open(dir.path(), "alice");
    store
        .upsert(record("r1", "a", Rating::Correct, ""))
        .expect("upsert should persist");

    store.reset().expect("reset should persist");
    assert!(store.records().is_empty());

    let contents = fs::read_to_string(store.path()).expect("snapshot should exist");
    assert_eq!(contents, "request_id,section,rating,comment\n");
    assert!(open(dir.path(), "alice").records().is_empty());
}

#[test]
fn export_uses_fixed_column_order_and_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut store = open(dir.path(), "alice");
    store
        .upsert(record("r1", "a", Rating::Incorrect, "dose, route"))
        .expect("upsert should persist");
    store
        .upsert(record("r2", "b", Rating::Correct, ""))
        .expect("upsert should persist");

    let bytes = store.export_snapshot().expect("export should encode");
    let text = String::from_utf8(bytes.clone()).expect("export is utf-8");
    assert_eq!(
        text,
        "request_id,section,rating,comment\nr1,a,Incorrect,\"dose, route\"\nr2,b,Correct,\n"
    );

    let decoded = decode_snapshot(&bytes).expect("export should decode");
    assert_eq!(decoded, store.records());
}

#[test]
fn legacy_duplicate_rows_fold_to_latest_value_at_first_position() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = snapshot_path(dir.path(), "alice");
    fs::write(
        &path,
        "request_id,section,rating,comment\n\
         r1,a,Correct,first\n\
         r2,a,Ambiguous,\n\
         r1,a,Incorrect,second\n",
    )
    .expect("fixture should be written");

    let store = open(dir.path(), "alice");
    assert_eq!(
        store.records(),
        &[
            record("r1", "a", Rating::Incorrect, "second"),
            record("r2", "a", Rating::Ambiguous, ""),
        ]
    );
}

#[test]
fn corrupt_snapshot_is_a_read_error() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = snapshot_path(dir.path(), "alice");

    fs::write(&path, "id,when\n1,now\n").expect("fixture should be written");
    let err = EvaluationStore::open(dir.path(), "alice").expect_err("header mismatch");
    assert!(matches!(
        err,
        PersistenceError::Read {
            source: SnapshotDecodeError::UnexpectedHeader { .. },
            ..
        }
    ));

    fs::write(&path, "request_id,section,rating,comment\nr1,a,Great,\n")
        .expect("fixture should be written");
    let err = EvaluationStore::open(dir.path(), "alice").expect_err("unknown rating");
    assert!(matches!(
        err,
        PersistenceError::Read {
            source: SnapshotDecodeError::Csv(_),
            ..
        }
    ));
}

#[test]
fn empty_snapshot_file_loads_as_empty_store() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    fs::write(snapshot_path(dir.path(), "alice"), "").expect("fixture should be written");
    assert!(open(dir.path(), "alice").records().is_empty());
}

#[test]
fn failed_write_is_reported_and_memory_is_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file in the way").expect("fixture should be written");

    let mut store = EvaluationStore::empty(&blocker, "alice");
    let err = store
        .upsert(record("r1", "a", Rating::Correct, ""))
        .expect_err("writing under a file must fail");
    assert!(matches!(err, PersistenceError::Write { .. }));
    assert!(store.records().is_empty());
}

#[test]
fn snapshot_names_escape_unsafe_identities() {
    assert_eq!(snapshot_file_name("alice"), "evaluations_alice.csv");
    assert_eq!(snapshot_file_name("a.b-c_d"), "evaluations_a.b-c_d.csv");

    let spaced = snapshot_file_name("a b");
    let slashed = snapshot_file_name("a/b");
    assert!(spaced.starts_with("evaluations_a_b-"), "unexpected name: {spaced}");
    assert!(slashed.starts_with("evaluations_a_b-"), "unexpected name: {slashed}");
    assert_ne!(spaced, slashed);
    assert_ne!(spaced, snapshot_file_name("a_b"));
    assert!(!slashed.contains('/'));
}

#[test]
fn long_identities_get_bounded_distinct_names_and_can_save() {
    let long_user = "a".repeat(300);
    let longer_user = "a".repeat(301);
    let name = snapshot_file_name(&long_user);
    assert!(name.len() < 128, "name too long: {} bytes", name.len());
    assert_ne!(name, snapshot_file_name(&longer_user));

    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut store = open(dir.path(), &long_user);
    store
        .upsert(record("r1", "a", Rating::Correct, ""))
        .expect("long identity should be writable");

    let reopened = open(dir.path(), &long_user);
    assert_eq!(reopened.records(), store.records());
}

#[test]
fn quarantine_moves_snapshot_aside() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = snapshot_path(dir.path(), "alice");
    fs::write(&path, "garbage").expect("fixture should be written");

    let moved = quarantine_snapshot(&path).expect("rename should succeed");
    assert!(!path.exists());
    assert!(moved.exists());
    let name = moved
        .file_name()
        .and_then(|name| name.to_str())
        .expect("utf-8 file name");
    assert!(name.starts_with("evaluations_alice.csv.corrupt-"), "unexpected name: {name}");
}

#[test]
fn rating_counts_tally_each_rating() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut store = open(dir.path(), "alice");
    for (section, rating) in [("a", Rating::Correct), ("b", Rating::Correct), ("c", Rating::Ambiguous)] {
        store
            .upsert(record("r1", section, rating, ""))
            .expect("upsert should persist");
    }

    let counts = store.rating_counts();
    assert_eq!(counts.correct, 2);
    assert_eq!(counts.incorrect, 0);
    assert_eq!(counts.ambiguous, 1);
}
