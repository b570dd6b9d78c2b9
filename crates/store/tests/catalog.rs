//! Integration tests for the collection catalog

use manifold_arena::Arena;
use manifold_common::{Error, COLLECTION_MAIN};
use manifold_store::{Database, DropMode};

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::open(dir.path()).expect("open store")
}

#[test]
fn create_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    let graph = db.create_collection("graph").unwrap();
    let listing = db.list_collections(&arena).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing.ids[0], graph);
    assert_eq!(listing.name(0), "graph");
    assert!(db.contains_collection("graph"));
    assert_eq!(db.collection_by_name("graph"), Some(graph));
    assert_eq!(db.collection_by_name(""), Some(COLLECTION_MAIN));
}

#[test]
fn names_are_unique_and_non_empty() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    db.create_collection("dup").unwrap();
    assert!(db.create_collection("dup").is_err());
    assert!(db.create_collection("").is_err());
}

#[test]
fn drop_handle_removes_the_collection() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    let temp = db.create_collection("temp").unwrap();
    db.put(temp, 1, b"x").unwrap();
    db.drop_collection(temp, DropMode::KeysValsHandle).unwrap();

    let listing = db.list_collections(&arena).unwrap();
    assert!(listing.is_empty());
    // Reads against the dropped handle are errors.
    assert!(db.get(temp, 1, &arena).is_err());
}

#[test]
fn drop_keys_vals_keeps_the_handle() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    let logs = db.create_collection("logs").unwrap();
    db.put(logs, 1, b"x").unwrap();
    db.put(logs, 2, b"y").unwrap();
    db.drop_collection(logs, DropMode::KeysVals).unwrap();

    assert_eq!(db.get(logs, 1, &arena).unwrap(), None);
    assert!(db.scan_collection(logs, i64::MIN, 10, &arena).unwrap().is_empty());

    // The handle still works for new entries.
    db.put(logs, 3, b"z").unwrap();
    assert_eq!(db.get(logs, 3, &arena).unwrap(), Some(&b"z"[..]));
}

#[test]
fn drop_vals_preserves_keys() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    db.put(COLLECTION_MAIN, 1, b"a").unwrap();
    db.put(COLLECTION_MAIN, 2, b"bb").unwrap();
    db.drop_collection(COLLECTION_MAIN, DropMode::Vals).unwrap();

    // Keys stay enumerable; values are tombstoned to the empty value.
    assert_eq!(
        db.scan_collection(COLLECTION_MAIN, i64::MIN, 10, &arena).unwrap(),
        &[1, 2]
    );
    assert_eq!(db.get(COLLECTION_MAIN, 1, &arena).unwrap(), Some(&b""[..]));
}

#[test]
fn main_handle_cannot_be_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let result = db.drop_collection(COLLECTION_MAIN, DropMode::KeysValsHandle);
    assert!(matches!(result.unwrap_err(), Error::ArgsCombo(_)));

    // Clearing main's entries is still allowed.
    db.put(COLLECTION_MAIN, 1, b"x").unwrap();
    db.drop_collection(COLLECTION_MAIN, DropMode::KeysVals).unwrap();
}

#[test]
fn ids_are_stable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let (first, second) = {
        let db = open_db(&dir);
        let first = db.create_collection("alpha").unwrap();
        let second = db.create_collection("beta").unwrap();
        db.put(first, 1, b"payload").unwrap();
        (first, second)
    };

    let db = open_db(&dir);
    let arena = Arena::new();
    assert_eq!(db.collection_by_name("alpha"), Some(first));
    assert_eq!(db.collection_by_name("beta"), Some(second));
    assert_eq!(db.get(first, 1, &arena).unwrap(), Some(&b"payload"[..]));

    // New ids never reuse dropped ones within the run.
    let third = db.create_collection("gamma").unwrap();
    assert!(third.0 > second.0);
}
