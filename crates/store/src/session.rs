//! Dispatch helpers for the higher modalities
//!
//! The document and graph layers run the same blob operations either
//! directly against the database or inside a caller-supplied transaction;
//! these helpers keep that choice in one place.

use manifold_arena::Arena;
use manifold_common::{Options, Places, Result, Strided};

use crate::database::Database;
use crate::read::{ReadResult, ReadShape};
use crate::scan::{ScanResult, ScanTasks};
use crate::txn::Transaction;

pub fn read<'a>(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    places: &Places<'_>,
    options: Options,
    shape: ReadShape,
    arena: &'a Arena,
) -> Result<ReadResult<'a>> {
    match txn {
        Some(txn) => txn.read(places, options, shape, arena),
        None => db.read(places, options, shape, arena),
    }
}

pub fn write(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    places: &Places<'_>,
    contents: Strided<'_, &[u8]>,
    options: Options,
) -> Result<()> {
    match txn {
        Some(txn) => txn.write(places, contents, options),
        None => db.write(places, contents, options),
    }
}

pub fn scan<'a>(
    db: &Database,
    txn: Option<&Transaction<'_>>,
    tasks: &ScanTasks<'_>,
    options: Options,
    arena: &'a Arena,
) -> Result<ScanResult<'a>> {
    match txn {
        Some(txn) => txn.scan(tasks, options, arena),
        None => db.scan(tasks, options, arena),
    }
}
