//! Integration tests for the columnar gather

use manifold_arena::Arena;
use manifold_common::{Options, Places, COLLECTION_MAIN};
use manifold_docs::{gather, write, DocPlaces, FieldType, Modification, TableHeader};
use manifold_store::Database;
use serde_json::{json, Value};

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::open(dir.path()).expect("open store")
}

fn seed(db: &Database, key: i64, document: Value) {
    let arena = Arena::new();
    let keys = [key];
    let places = DocPlaces::in_collection(&COLLECTION_MAIN, &keys);
    let bytes = serde_json::to_vec(&document).unwrap();
    write(
        db,
        None,
        &places,
        manifold_common::Strided::Repeated(&bytes.as_slice()),
        Modification::Upsert,
        FieldType::Json,
        Options::empty(),
        &arena,
    )
    .unwrap();
}

#[test]
fn string_columns_are_compacted() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    seed(&db, 1, json!({"k": 1, "name": "ab"}));
    seed(&db, 2, json!({"k": 2, "name": "cde"}));

    let keys = [1, 2];
    let places = Places::in_collection(&COLLECTION_MAIN, &keys);
    let fields = ["name"];
    let types = [FieldType::Str];
    let header = TableHeader::new(&fields[..], &types[..], 1);
    let table = gather(&db, None, &places, &header, Options::empty(), &arena).unwrap();

    let column = &table.columns[0];
    assert!(column.valid(0) && column.valid(1));
    assert_eq!(column.offsets, &[0, 2, 5]);
    assert_eq!(column.lengths, &[2, 3]);
    assert_eq!(table.contents, b"abcde");
    assert_eq!(table.cell_bytes(0, 0), Some(&b"ab"[..]));
    assert_eq!(table.cell_bytes(0, 1), Some(&b"cde"[..]));
}

#[test]
fn gather_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    seed(&db, 1, json!({"name": "x", "n": 1}));
    seed(&db, 2, json!({"name": "yy", "n": 2}));
    seed(&db, 3, json!({"n": 3}));

    let keys = [1, 2, 3];
    let places = Places::in_collection(&COLLECTION_MAIN, &keys);
    let fields = ["name", "n"];
    let types = [FieldType::Str, FieldType::I64];
    let header = TableHeader::new(&fields[..], &types[..], 2);

    let arena_a = Arena::new();
    let first = gather(&db, None, &places, &header, Options::empty(), &arena_a).unwrap();
    let arena_b = Arena::new();
    let second = gather(&db, None, &places, &header, Options::empty(), &arena_b).unwrap();

    assert_eq!(first.contents, second.contents);
    assert_eq!(first.columns[0].offsets, second.columns[0].offsets);
    assert_eq!(first.columns[0].lengths, second.columns[0].lengths);
    assert_eq!(first.columns[1].scalars, second.columns[1].scalars);
}

#[test]
fn columns_are_contiguous_and_non_overlapping() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    seed(&db, 1, json!({"a": "one", "b": "1"}));
    seed(&db, 2, json!({"a": "two", "b": "22"}));

    let keys = [1, 2];
    let places = Places::in_collection(&COLLECTION_MAIN, &keys);
    let fields = ["a", "b"];
    let types = [FieldType::Str, FieldType::Str];
    let header = TableHeader::new(&fields[..], &types[..], 2);
    let table = gather(&db, None, &places, &header, Options::empty(), &arena).unwrap();

    // Within a column, offset deltas equal lengths for valid rows.
    for column in &table.columns {
        for row in 0..table.rows {
            if column.valid(row) {
                assert_eq!(
                    column.offsets[row + 1] - column.offsets[row],
                    column.lengths[row]
                );
            }
        }
    }

    // Column 1 begins exactly where column 0 ends.
    let first = &table.columns[0];
    let second = &table.columns[1];
    assert_eq!(second.offsets[0], first.offsets[table.rows]);
    assert_eq!(table.contents, b"onetwo122");
}

#[test]
fn invalid_rows_leave_zero_width_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    seed(&db, 1, json!({"name": "first"}));
    seed(&db, 2, json!({"other": true}));
    seed(&db, 3, json!({"name": {"not": "a string"}}));

    let keys = [1, 2, 3];
    let places = Places::in_collection(&COLLECTION_MAIN, &keys);
    let fields = ["name"];
    let types = [FieldType::Str];
    let header = TableHeader::new(&fields[..], &types[..], 1);
    let table = gather(&db, None, &places, &header, Options::empty(), &arena).unwrap();

    let column = &table.columns[0];
    assert!(column.valid(0));
    // A missing field clears everything; a composite collides.
    assert!(!column.valid(1) && !column.collided(1));
    assert!(!column.valid(2) && column.collided(2));
    assert_eq!(column.offsets, &[0, 5, 5, 5]);
    assert_eq!(table.contents, b"first");
}

#[test]
fn scalar_columns_carry_conversion_flags() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    seed(&db, 1, json!({"n": 3}));
    seed(&db, 2, json!({"n": 2.5}));
    seed(&db, 3, json!({"n": "8"}));

    let keys = [1, 2, 3];
    let places = Places::in_collection(&COLLECTION_MAIN, &keys);
    let fields = ["n"];
    let types = [FieldType::F64];
    let header = TableHeader::new(&fields[..], &types[..], 1);
    let table = gather(&db, None, &places, &header, Options::empty(), &arena).unwrap();

    let scalars = table.columns[0].as_scalars();
    assert!(scalars.valid(0) && scalars.converted(0));
    assert_eq!(scalars.cell_f64(0), 3.0);
    assert!(scalars.valid(1) && !scalars.converted(1));
    assert_eq!(scalars.cell_f64(1), 2.5);
    assert!(scalars.valid(2) && scalars.converted(2));
    assert_eq!(scalars.cell_f64(2), 8.0);
}

#[test]
fn json_columns_keep_raw_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let arena = Arena::new();

    seed(&db, 1, json!({"payload": {"nested": [1, 2]}}));

    let keys = [1];
    let places = Places::in_collection(&COLLECTION_MAIN, &keys);
    let fields = ["payload"];
    let types = [FieldType::Json];
    let header = TableHeader::new(&fields[..], &types[..], 1);
    let table = gather(&db, None, &places, &header, Options::empty(), &arena).unwrap();

    let cell = table.cell_bytes(0, 0).unwrap();
    let value: Value = serde_json::from_slice(cell).unwrap();
    assert_eq!(value, json!({"nested": [1, 2]}));
}
