//! Integration tests for optimistic transactions

use manifold_arena::Arena;
use manifold_common::{Error, Options, COLLECTION_MAIN};
use manifold_store::{Database, TransactionOptions};

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::open(dir.path()).expect("open store")
}

#[test]
fn read_your_own_writes() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    let mut txn = db.begin_transaction();
    txn.put(COLLECTION_MAIN, 1, b"staged").unwrap();
    assert_eq!(txn.get(COLLECTION_MAIN, 1, &arena).unwrap(), Some(&b"staged"[..]));

    // Not visible outside before commit.
    assert_eq!(db.get(COLLECTION_MAIN, 1, &arena).unwrap(), None);

    txn.commit(Options::empty()).unwrap();
    assert_eq!(db.get(COLLECTION_MAIN, 1, &arena).unwrap(), Some(&b"staged"[..]));
}

#[test]
fn staged_deletes_hide_committed_values() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    db.put(COLLECTION_MAIN, 2, b"old").unwrap();
    let mut txn = db.begin_transaction();
    txn.erase(COLLECTION_MAIN, 2).unwrap();
    assert_eq!(txn.get(COLLECTION_MAIN, 2, &arena).unwrap(), None);
    txn.commit(Options::empty()).unwrap();
    assert_eq!(db.get(COLLECTION_MAIN, 2, &arena).unwrap(), None);
}

#[test]
fn watched_conflict_aborts_the_later_commit() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    // T1 reads key 7 (absent) with watching on.
    let mut t1 = db.begin_transaction();
    assert_eq!(t1.get(COLLECTION_MAIN, 7, &arena).unwrap(), None);

    // T2 writes the same key and commits first.
    let mut t2 = db.begin_transaction();
    t2.put(COLLECTION_MAIN, 7, b"x").unwrap();
    t2.commit(Options::empty()).unwrap();

    // T1's commit must observe the modified watch and fail.
    t1.put(COLLECTION_MAIN, 7, b"y").unwrap();
    assert_eq!(t1.commit(Options::empty()).unwrap_err(), Error::Conflict);
    assert_eq!(db.get(COLLECTION_MAIN, 7, &arena).unwrap(), Some(&b"x"[..]));
}

#[test]
fn exactly_one_of_two_watchers_commits() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();
    db.put(COLLECTION_MAIN, 40, b"seed").unwrap();

    let mut t1 = db.begin_transaction();
    let mut t2 = db.begin_transaction();
    t1.get(COLLECTION_MAIN, 40, &arena).unwrap();
    t2.get(COLLECTION_MAIN, 40, &arena).unwrap();
    t1.put(COLLECTION_MAIN, 40, b"one").unwrap();
    t2.put(COLLECTION_MAIN, 40, b"two").unwrap();

    assert!(t1.commit(Options::empty()).is_ok());
    assert_eq!(t2.commit(Options::empty()).unwrap_err(), Error::Conflict);
    assert_eq!(db.get(COLLECTION_MAIN, 40, &arena).unwrap(), Some(&b"one"[..]));
}

#[test]
fn unwatched_reads_do_not_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();
    db.put(COLLECTION_MAIN, 50, b"seed").unwrap();

    let mut t1 = db.begin_transaction();
    let keys = [50];
    let places = manifold_common::Places::in_collection(&COLLECTION_MAIN, &keys);
    t1.read(
        &places,
        Options::TXN_DONT_WATCH,
        manifold_store::ReadShape::Full,
        &arena,
    )
    .unwrap();

    // A concurrent writer touches the key T1 read without watching.
    let mut t2 = db.begin_transaction();
    t2.put(COLLECTION_MAIN, 50, b"other").unwrap();
    t2.commit(Options::empty()).unwrap();

    t1.put(COLLECTION_MAIN, 51, b"independent").unwrap();
    assert!(t1.commit(Options::empty()).is_ok());
}

#[test]
fn sequence_numbers_are_monotonic() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let mut t1 = db.begin_transaction();
    t1.put(COLLECTION_MAIN, 1, b"a").unwrap();
    let first = t1.commit_sequenced(Options::empty()).unwrap();

    let mut t2 = db.begin_transaction();
    t2.put(COLLECTION_MAIN, 2, b"b").unwrap();
    let second = t2.commit_sequenced(Options::empty()).unwrap();

    assert!(second > first);
    assert_eq!(db.sequence_number(), second);
}

#[test]
fn sequence_numbers_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let last = {
        let db = open_db(&dir);
        let mut txn = db.begin_transaction();
        txn.put(COLLECTION_MAIN, 3, b"c").unwrap();
        txn.commit_sequenced(Options::WRITE_FLUSH).unwrap()
    };
    let db = open_db(&dir);
    assert_eq!(db.sequence_number(), last);
}

#[test]
fn committing_an_empty_transaction_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let txn = db.begin_transaction();
    assert!(txn.commit(Options::empty()).is_ok());
}

#[test]
fn scans_observe_staged_writes() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    db.put(COLLECTION_MAIN, 1, b"a").unwrap();
    db.put(COLLECTION_MAIN, 3, b"c").unwrap();

    let mut txn = db.begin_transaction();
    txn.put(COLLECTION_MAIN, 2, b"b").unwrap();
    txn.erase(COLLECTION_MAIN, 3).unwrap();

    let start = i64::MIN;
    let limit = 10u32;
    let tasks = manifold_store::ScanTasks::new(&COLLECTION_MAIN, &start, &limit, 1);
    let result = txn.scan(&tasks, Options::empty(), &arena).unwrap();
    assert_eq!(result.task_keys(0), &[1, 2]);
}

#[test]
fn failed_writes_poison_the_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    let mut txn = db.begin_transaction();
    assert!(txn
        .put(COLLECTION_MAIN, manifold_common::KEY_UNKNOWN, b"x")
        .is_err());

    // The transaction can no longer be used or committed, only dropped.
    assert!(txn.get(COLLECTION_MAIN, 1, &arena).is_err());
    assert!(txn.commit(Options::empty()).is_err());
}

#[test]
fn snapshot_transactions_are_not_supported() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    assert!(!manifold_common::SUPPORTS_SNAPSHOTS);
    let result = db.begin_transaction_with(TransactionOptions { snapshot: true });
    assert!(matches!(result.unwrap_err(), Error::NotSupported(_)));
}

#[test]
fn generations_increase() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let t1 = db.begin_transaction();
    let t2 = db.begin_transaction();
    assert!(t2.generation() > t1.generation());
}
