//! Integration tests for batched key streams

use manifold_arena::Arena;
use manifold_common::COLLECTION_MAIN;
use manifold_store::Database;

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::open(dir.path()).expect("open store")
}

#[test]
fn concatenated_batches_equal_a_full_scan() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    for key in [-5i64, -1, 0, 3, 7, 8, 20, 21, 22] {
        db.put(COLLECTION_MAIN, key, b"v").unwrap();
    }

    let mut stream = db.keys(COLLECTION_MAIN).with_batch_limit(3);
    stream.seek_to_first().unwrap();
    let mut collected = Vec::new();
    while !stream.is_end() {
        collected.extend_from_slice(stream.keys_batch());
        stream.seek_to_next_batch().unwrap();
    }

    let scanned = db
        .scan_collection(COLLECTION_MAIN, i64::MIN, 100, &arena)
        .unwrap();
    assert_eq!(collected, scanned);
}

#[test]
fn streams_restart_from_an_arbitrary_key() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    for key in 0..10i64 {
        db.put(COLLECTION_MAIN, key, b"v").unwrap();
    }

    let mut stream = db.keys(COLLECTION_MAIN).with_batch_limit(4);
    stream.seek(6).unwrap();
    assert_eq!(stream.keys_batch(), &[6, 7, 8, 9]);
    stream.seek_to_next_batch().unwrap();
    assert!(stream.is_end());

    // Seeking back rewinds the cursor.
    stream.seek(0).unwrap();
    assert_eq!(stream.keys_batch(), &[0, 1, 2, 3]);
}

#[test]
fn empty_collections_end_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let empty = db.create_collection("empty").unwrap();
    let mut stream = db.keys(empty);
    stream.seek_to_first().unwrap();
    assert!(stream.is_end());
    assert!(stream.keys_batch().is_empty());
}
