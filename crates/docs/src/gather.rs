//! Columnar gather
//!
//! Projects `keys × (field, type)` into per-column arena arrays laid out
//! for a zero-copy handoff to a columnar in-memory format. All
//! variable-length columns share one contents tape, written column-major:
//! within a column `offsets[i+1] - offsets[i] == lengths[i]` for valid
//! rows, and each column's bytes begin immediately after the previous
//! column's.

use manifold_arena::Arena;
use manifold_common::{octets_for, set_bit, Options, Places, Result, Strided};
use manifold_store::{session, Database, ReadShape, Transaction};
use serde_json::Value;

use crate::extract::{scalar_cell, text_cell, ScalarColumn, TextCell};
use crate::field::FieldType;
use crate::path::lookup;
use crate::read::parse_stored;

/// The `(field, type)` schema of a gather.
#[derive(Debug, Clone, Copy)]
pub struct TableHeader<'a> {
    pub fields: Strided<'a, &'a str>,
    pub types: Strided<'a, FieldType>,
    pub count: usize,
}

impl<'a> TableHeader<'a> {
    pub fn new(
        fields: impl Into<Strided<'a, &'a str>>,
        types: impl Into<Strided<'a, FieldType>>,
        count: usize,
    ) -> Self {
        Self {
            fields: fields.into(),
            types: types.into(),
            count,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.fields.check(self.count)?;
        self.types.check(self.count)
    }
}

/// One gathered column. Fixed-width columns carry `scalars`;
/// variable-length columns carry `offsets`/`lengths` into the table's
/// shared contents tape.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub field: &'a str,
    pub ty: FieldType,
    pub validities: &'a [u8],
    pub conversions: &'a [u8],
    pub collisions: &'a [u8],
    pub scalars: &'a [u8],
    /// `rows + 1` entries for variable-length columns, empty otherwise.
    pub offsets: &'a [u32],
    pub lengths: &'a [u32],
}

impl<'a> Column<'a> {
    pub fn valid(&self, row: usize) -> bool {
        manifold_common::get_bit(self.validities, row)
    }

    pub fn converted(&self, row: usize) -> bool {
        manifold_common::get_bit(self.conversions, row)
    }

    pub fn collided(&self, row: usize) -> bool {
        manifold_common::get_bit(self.collisions, row)
    }

    /// View the fixed-width cells as a typed column.
    pub fn as_scalars(&self) -> ScalarColumn<'a> {
        ScalarColumn {
            ty: self.ty,
            validities: self.validities,
            conversions: self.conversions,
            collisions: self.collisions,
            scalars: self.scalars,
        }
    }
}

/// A gathered row-major table.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    pub rows: usize,
    pub columns: Vec<Column<'a>>,
    /// Shared contents tape of every variable-length column.
    pub contents: &'a [u8],
}

impl<'a> Table<'a> {
    /// Bytes of one variable-length cell; `None` for invalid rows.
    pub fn cell_bytes(&self, column: usize, row: usize) -> Option<&'a [u8]> {
        let column = &self.columns[column];
        if !column.valid(row) {
            return None;
        }
        let start = column.offsets[row] as usize;
        let length = column.lengths[row] as usize;
        Some(&self.contents[start..start + length])
    }
}

fn field_node<'d>(documents: &'d [Option<Value>], row: usize, field: &str) -> Option<&'d Value> {
    documents[row]
        .as_ref()
        .and_then(|document| lookup(document, Some(field)))
}

/// Gather the addressed documents into a compacted columnar table.
pub fn gather<'a>(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    places: &Places<'_>,
    header: &TableHeader<'_>,
    options: Options,
    arena: &'a Arena,
) -> Result<Table<'a>> {
    places.validate()?;
    header.validate()?;

    let fetched = session::read(db, txn, places, options, ReadShape::Full, arena)?;
    let rows = places.count;
    let mut documents: Vec<Option<Value>> = Vec::with_capacity(rows);
    for row in 0..rows {
        documents.push(parse_stored(fetched.get(row))?);
    }

    let mut contents: Vec<u8> = Vec::new();
    let mut columns: Vec<Column<'a>> = Vec::with_capacity(header.count);

    for column_index in 0..header.count {
        let field = *header.fields.get(column_index);
        let ty = *header.types.get(column_index);

        let validities = arena.alloc_slice::<u8>(octets_for(rows))?;
        let conversions = arena.alloc_slice::<u8>(octets_for(rows))?;
        let collisions = arena.alloc_slice::<u8>(octets_for(rows))?;

        if ty.is_variable_length() {
            let offsets = arena.alloc_slice::<u32>(rows + 1)?;
            let lengths = arena.alloc_slice::<u32>(rows)?;
            for row in 0..rows {
                offsets[row] = contents.len() as u32;
                // JSON cells keep the serialized token of any node;
                // string/binary cells collide on composites.
                let cell = if ty == FieldType::Json {
                    match field_node(&documents, row, field) {
                        None | Some(Value::Null) => TextCell::Missing,
                        Some(node) => TextCell::Valid {
                            text: serde_json::to_string(node).unwrap_or_default(),
                            convert: false,
                        },
                    }
                } else {
                    text_cell(field_node(&documents, row, field))
                };
                match cell {
                    TextCell::Missing => {}
                    TextCell::Collide => set_bit(collisions, row, true),
                    TextCell::Valid { text, convert } => {
                        lengths[row] = text.len() as u32;
                        contents.extend_from_slice(text.as_bytes());
                        set_bit(conversions, row, convert);
                        set_bit(validities, row, true);
                    }
                }
            }
            offsets[rows] = contents.len() as u32;
            columns.push(Column {
                field: arena.alloc_str(field)?,
                ty,
                validities,
                conversions,
                collisions,
                scalars: &[],
                offsets,
                lengths,
            });
        } else {
            let width = ty.size_bytes();
            let scalars = arena.alloc_slice::<u8>(rows * width)?;
            for row in 0..rows {
                let trits = scalar_cell(
                    field_node(&documents, row, field),
                    ty,
                    &mut scalars[row * width..(row + 1) * width],
                );
                set_bit(validities, row, trits.valid);
                set_bit(conversions, row, trits.convert);
                set_bit(collisions, row, trits.collide);
            }
            columns.push(Column {
                field: arena.alloc_str(field)?,
                ty,
                validities,
                conversions,
                collisions,
                scalars,
                offsets: &[],
                lengths: &[],
            });
        }
    }

    Ok(Table {
        rows,
        columns,
        contents: arena.alloc_bytes(&contents)?,
    })
}
