//! Approximate size measurement
//!
//! Returns lower/upper bounds per task; lower bounds may be zero and
//! upper bounds whole-collection, which stays a valid bound for any key
//! sub-range the caller asked about.

use manifold_arena::Arena;
use manifold_common::{CollectionId, Key, Result, Strided};

use crate::database::Database;

/// Arena-owned measurement bounds, one entry per task.
#[derive(Debug, Clone, Copy)]
pub struct MeasureResult<'a> {
    pub min_cardinalities: &'a [u64],
    pub max_cardinalities: &'a [u64],
    pub min_value_bytes: &'a [u64],
    pub max_value_bytes: &'a [u64],
    pub min_space_usages: &'a [u64],
    pub max_space_usages: &'a [u64],
}

pub(crate) fn measure_collections<'a>(
    db: &Database,
    collections: Strided<'_, CollectionId>,
    start_keys: Strided<'_, Key>,
    end_keys: Strided<'_, Key>,
    count: usize,
    arena: &'a Arena,
) -> Result<MeasureResult<'a>> {
    collections.check(count)?;
    start_keys.check(count)?;
    end_keys.check(count)?;

    let min_cardinalities = arena.alloc_slice::<u64>(count)?;
    let max_cardinalities = arena.alloc_slice::<u64>(count)?;
    let min_value_bytes = arena.alloc_slice::<u64>(count)?;
    let max_value_bytes = arena.alloc_slice::<u64>(count)?;
    let min_space_usages = arena.alloc_slice::<u64>(count)?;
    let max_space_usages = arena.alloc_slice::<u64>(count)?;

    for index in 0..count {
        let partition = db.partition(*collections.get(index))?;
        max_cardinalities[index] = partition.approximate_len() as u64;
        max_value_bytes[index] = u64::MAX;
        max_space_usages[index] = partition.disk_space();
    }

    Ok(MeasureResult {
        min_cardinalities,
        max_cardinalities,
        min_value_bytes,
        max_value_bytes,
        min_space_usages,
        max_space_usages,
    })
}
