//! Field-selected document reads

use manifold_arena::{Arena, Tape, TapeBuilder};
use manifold_common::{octets_for, set_bit, Error, Options, Result};
use manifold_store::{session, Database, ReadShape, Transaction};
use serde_json::Value;

use crate::extract::{scalar_cell, ScalarColumn};
use crate::field::FieldType;
use crate::path::lookup;
use crate::place::DocPlaces;

/// Outputs of a document read: a tape for `Json`/`Str` requests, a typed
/// column for scalar requests.
#[derive(Debug, Clone, Copy)]
pub enum DocsReadResult<'a> {
    Tape(Tape<'a>),
    Scalars(ScalarColumn<'a>),
}

impl<'a> DocsReadResult<'a> {
    pub fn tape(self) -> Option<Tape<'a>> {
        match self {
            DocsReadResult::Tape(tape) => Some(tape),
            DocsReadResult::Scalars(_) => None,
        }
    }

    pub fn scalars(self) -> Option<ScalarColumn<'a>> {
        match self {
            DocsReadResult::Tape(_) => None,
            DocsReadResult::Scalars(column) => Some(column),
        }
    }
}

/// Decode stored document bytes, or `None` for a missing entry.
pub(crate) fn parse_stored(bytes: Option<&[u8]>) -> Result<Option<Value>> {
    match bytes {
        None => Ok(None),
        Some([]) => Ok(None),
        Some(bytes) => serde_json::from_slice(bytes).map(Some).map_err(|_| Error::Unknown),
    }
}

/// Stringify one node the permissive way document reads do: scalars are
/// printed, composites dump as JSON, `null` is the empty string.
fn stringify(node: &Value) -> Vec<u8> {
    match node {
        Value::Null => Vec::new(),
        Value::Bool(flag) => flag.to_string().into_bytes(),
        Value::Number(number) => number.to_string().into_bytes(),
        Value::String(text) => text.clone().into_bytes(),
        composite => serde_json::to_vec(composite).unwrap_or_default(),
    }
}

/// Read each addressed field as the requested type.
pub fn read<'a>(
    db: &Database,
    mut txn: Option<&mut Transaction<'_>>,
    places: &DocPlaces<'_>,
    ty: FieldType,
    options: Options,
    arena: &'a Arena,
) -> Result<DocsReadResult<'a>> {
    places.validate()?;
    let blob_places = places.blob_places();

    // Whole documents in the internal format pass straight through to the
    // blob layer.
    if !places.has_fields() && ty == FieldType::Json {
        let result = session::read(db, txn, &blob_places, options, ReadShape::Full, arena)?;
        return Ok(DocsReadResult::Tape(Tape {
            offsets: result.offsets,
            lengths: result.lengths,
            contents: result.contents,
        }));
    }

    let fetched = session::read(
        db,
        txn.as_deref_mut(),
        &blob_places,
        options,
        ReadShape::Full,
        arena,
    )?;

    match ty {
        FieldType::Json | FieldType::Str => {
            let mut tape = TapeBuilder::with_terminator();
            tape.reserve(places.count);
            for index in 0..places.count {
                let document = parse_stored(fetched.get(index))?;
                let node = document
                    .as_ref()
                    .and_then(|document| lookup(document, places.field(index)));
                match node {
                    None => tape.push_missing(),
                    Some(node) if ty == FieldType::Json => {
                        tape.push(&serde_json::to_vec(node).unwrap_or_default());
                    }
                    Some(node) => tape.push(&stringify(node)),
                }
            }
            Ok(DocsReadResult::Tape(tape.finish(arena)?))
        }
        FieldType::Null | FieldType::Bin => {
            Err(Error::NotSupported("output type is not supported"))
        }
        scalar_ty => {
            let rows = places.count;
            let width = scalar_ty.size_bytes();
            let validities = arena.alloc_slice::<u8>(octets_for(rows))?;
            let conversions = arena.alloc_slice::<u8>(octets_for(rows))?;
            let collisions = arena.alloc_slice::<u8>(octets_for(rows))?;
            let scalars = arena.alloc_slice::<u8>(rows * width)?;

            for index in 0..rows {
                let document = parse_stored(fetched.get(index))?;
                let node = document
                    .as_ref()
                    .and_then(|document| lookup(document, places.field(index)));
                let trits = scalar_cell(node, scalar_ty, &mut scalars[index * width..(index + 1) * width]);
                set_bit(validities, index, trits.valid);
                set_bit(conversions, index, trits.convert);
                set_bit(collisions, index, trits.collide);
            }

            Ok(DocsReadResult::Scalars(ScalarColumn {
                ty: scalar_ty,
                validities,
                conversions,
                collisions,
                scalars,
            }))
        }
    }
}
