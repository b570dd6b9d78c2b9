//! Document writes
//!
//! Whole-document upserts of valid JSON pass straight through to the blob
//! layer; everything else is read-modify-write through the same
//! transaction. Inside a transaction the intermediate reads are always
//! tracked so concurrent document updates conflict instead of
//! interleaving.

use manifold_arena::Arena;
use manifold_common::{Error, Options, Place, Result, Strided};
use manifold_store::{session, Database, ReadShape, Transaction};
use serde_json::Value;

pub use crate::modify::Modification;

use crate::field::FieldType;
use crate::modify::{apply_patch, merge_patch, modify_field, FieldOp};
use crate::place::DocPlaces;
use crate::read::parse_stored;

/// Decode one task's content into a JSON value according to the declared
/// input type. Scalar inputs arrive as fixed-width little-endian bytes.
fn parse_content(bytes: &[u8], ty: FieldType) -> Result<Value> {
    const INVALID: Error = Error::ArgsWrong("invalid content payload");
    fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
        bytes.try_into().map_err(|_| INVALID)
    }

    match ty {
        FieldType::Json => serde_json::from_slice(bytes).map_err(|_| Error::ArgsWrong("invalid JSON")),
        FieldType::Str => std::str::from_utf8(bytes)
            .map(|text| Value::String(text.to_string()))
            .map_err(|_| INVALID),
        FieldType::Bool => Ok(Value::Bool(fixed::<1>(bytes)?[0] != 0)),
        FieldType::I8 => Ok(Value::from(fixed::<1>(bytes)?[0] as i8)),
        FieldType::I16 => Ok(Value::from(i16::from_le_bytes(fixed(bytes)?))),
        FieldType::I32 => Ok(Value::from(i32::from_le_bytes(fixed(bytes)?))),
        FieldType::I64 => Ok(Value::from(i64::from_le_bytes(fixed(bytes)?))),
        FieldType::U8 => Ok(Value::from(fixed::<1>(bytes)?[0])),
        FieldType::U16 => Ok(Value::from(u16::from_le_bytes(fixed(bytes)?))),
        FieldType::U32 => Ok(Value::from(u32::from_le_bytes(fixed(bytes)?))),
        FieldType::U64 => Ok(Value::from(u64::from_le_bytes(fixed(bytes)?))),
        FieldType::F32 => serde_json::Number::from_f64(f32::from_le_bytes(fixed(bytes)?) as f64)
            .map(Value::Number)
            .ok_or(INVALID),
        FieldType::F64 => serde_json::Number::from_f64(f64::from_le_bytes(fixed(bytes)?))
            .map(Value::Number)
            .ok_or(INVALID),
        FieldType::Null | FieldType::F16 | FieldType::Bin => {
            Err(Error::NotSupported("input type is not supported"))
        }
    }
}

/// Compute the new document for one task. `Ok(None)` deletes the entry.
fn apply_task(
    existing: Option<Value>,
    field: Option<&str>,
    modification: Modification,
    content: &[u8],
    ty: FieldType,
) -> Result<Option<Vec<u8>>> {
    let present = existing.is_some();

    match (field, modification) {
        (None, Modification::Insert) if present => {
            return Err(Error::ArgsWrong("key already exists"));
        }
        (None, Modification::Update) | (None, Modification::Patch) if !present => {
            return Err(Error::ArgsWrong("key does not exist"));
        }
        (Some(_), _) if !present => {
            return Err(Error::ArgsWrong("key does not exist"));
        }
        _ => {}
    }

    // Empty content deletes the document, or removes the addressed field.
    if content.is_empty() {
        return match field {
            None => Ok(None),
            Some(field) => {
                let mut document = existing.expect("presence was checked above");
                modify_field(&mut document, field, FieldOp::Remove)?;
                Ok(Some(serde_json::to_vec(&document).map_err(|_| Error::Unknown)?))
            }
        };
    }

    let content = parse_content(content, ty)?;
    let document = match field {
        None => match modification {
            Modification::Upsert | Modification::Insert | Modification::Update => content,
            Modification::Merge => {
                let mut base = existing.unwrap_or(Value::Null);
                merge_patch(&mut base, &content);
                base
            }
            Modification::Patch => {
                let mut base = existing.expect("presence was checked above");
                apply_patch(&mut base, None, &content)?;
                base
            }
        },
        Some(field) => {
            let mut base = existing.expect("presence was checked above");
            match modification {
                Modification::Upsert => modify_field(&mut base, field, FieldOp::Upsert(content))?,
                Modification::Merge => modify_field(&mut base, field, FieldOp::Merge(content))?,
                Modification::Insert => modify_field(&mut base, field, FieldOp::Insert(content))?,
                Modification::Update => modify_field(&mut base, field, FieldOp::Update(content))?,
                Modification::Patch => apply_patch(&mut base, Some(field), &content)?,
            }
            base
        }
    };

    Ok(Some(serde_json::to_vec(&document).map_err(|_| Error::Unknown)?))
}

/// Batched document write.
pub fn write(
    db: &Database,
    mut txn: Option<&mut Transaction<'_>>,
    places: &DocPlaces<'_>,
    contents: Strided<'_, &[u8]>,
    modification: Modification,
    ty: FieldType,
    options: Options,
    arena: &Arena,
) -> Result<()> {
    places.validate()?;
    contents.check(places.count)?;
    if places.count == 0 {
        return Ok(());
    }

    // Whole documents in the internal format can be handed to the blob
    // layer after validation.
    if !places.has_fields() && ty == FieldType::Json && modification == Modification::Upsert {
        for index in 0..places.count {
            let bytes = *contents.get(index);
            if !bytes.is_empty() {
                serde_json::from_slice::<Value>(bytes)
                    .map_err(|_| Error::ArgsWrong("invalid JSON"))?;
            }
        }
        return session::write(db, txn, &places.blob_places(), contents, options);
    }

    // Intermediate reads inside a transaction are always tracked.
    let read_options = if txn.is_some() {
        options.difference(Options::TXN_DONT_WATCH)
    } else {
        options
    };

    let mut addresses: Vec<Place> = places.blob_places().iter().collect();
    addresses.sort_unstable();
    addresses.dedup();
    let has_duplicates = addresses.len() != places.count;

    if has_duplicates {
        // Later tasks must observe earlier modifications of the same
        // document, so fall back to one task at a time.
        for index in 0..places.count {
            let place = places.blob_places().get(index);
            let keys = [place.key];
            let blob_places = manifold_common::Places::in_collection(&place.collection, &keys);
            let fetched = session::read(
                db,
                txn.as_deref_mut(),
                &blob_places,
                read_options,
                ReadShape::Full,
                arena,
            )?;
            let existing = parse_stored(fetched.get(0))?;
            let updated = apply_task(
                existing,
                places.field(index),
                modification,
                contents.get(index),
                ty,
            )?;
            let bytes = updated.unwrap_or_default();
            session::write(
                db,
                txn.as_deref_mut(),
                &blob_places,
                Strided::Repeated(&bytes.as_slice()),
                options,
            )?;
        }
        return Ok(());
    }

    let fetched = session::read(
        db,
        txn.as_deref_mut(),
        &places.blob_places(),
        read_options,
        ReadShape::Full,
        arena,
    )?;

    let mut updated: Vec<Vec<u8>> = Vec::with_capacity(places.count);
    for index in 0..places.count {
        let existing = parse_stored(fetched.get(index))?;
        let document = apply_task(
            existing,
            places.field(index),
            modification,
            contents.get(index),
            ty,
        )?;
        updated.push(document.unwrap_or_default());
    }

    let views: Vec<&[u8]> = updated.iter().map(Vec::as_slice).collect();
    session::write(
        db,
        txn,
        &places.blob_places(),
        Strided::Slice(&views),
        options,
    )
}
