//! Field-path union
//!
//! Walks the selected documents and returns the sorted, deduplicated set
//! of leaf paths (`/a/b`, `/arr/0/x`), including array indices, as a
//! NUL-terminated string tape.

use std::collections::BTreeSet;

use manifold_arena::{Arena, Tape, TapeBuilder};
use manifold_common::{Options, Places, Result};
use manifold_store::{session, Database, ReadShape, Transaction};
use serde_json::Value;

use crate::read::parse_stored;

/// The union of leaf field paths across a set of documents.
#[derive(Debug, Clone, Copy)]
pub struct Gist<'a> {
    pub paths: Tape<'a>,
}

impl<'a> Gist<'a> {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path(&self, index: usize) -> &'a str {
        std::str::from_utf8(self.paths.get(index).unwrap_or_default()).unwrap_or_default()
    }
}

fn walk(node: &Value, path: &mut String, out: &mut BTreeSet<String>) {
    match node {
        Value::Object(members) => {
            for (key, value) in members {
                let rollback = path.len();
                path.push('/');
                path.push_str(key);
                walk(value, path, out);
                path.truncate(rollback);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                let rollback = path.len();
                path.push('/');
                path.push_str(&index.to_string());
                walk(value, path, out);
                path.truncate(rollback);
            }
        }
        _ => {
            if !out.contains(path.as_str()) {
                out.insert(path.clone());
            }
        }
    }
}

/// Collect the union of leaf paths across the addressed documents.
pub fn gist<'a>(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    places: &Places<'_>,
    options: Options,
    arena: &'a Arena,
) -> Result<Gist<'a>> {
    places.validate()?;
    let fetched = session::read(db, txn, places, options, ReadShape::Full, arena)?;

    let mut paths = BTreeSet::new();
    let mut buffer = String::new();
    for index in 0..places.count {
        let Some(document) = parse_stored(fetched.get(index))? else {
            continue;
        };
        buffer.clear();
        walk(&document, &mut buffer, &mut paths);
    }

    let mut tape = TapeBuilder::with_terminator();
    tape.reserve(paths.len());
    for path in &paths {
        tape.push(path.as_bytes());
    }
    Ok(Gist {
        paths: tape.finish(arena)?,
    })
}
