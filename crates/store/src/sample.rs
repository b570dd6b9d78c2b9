//! Uniform reservoir sampling of collection keys

use manifold_arena::Arena;
use manifold_common::{decode_key, CollectionId, Key, Result, Strided};
use rand::Rng;

use crate::database::Database;
use crate::scan::ScanResult;

pub(crate) fn sample_keys<'a>(
    db: &Database,
    collections: Strided<'_, CollectionId>,
    limits: Strided<'_, u32>,
    count: usize,
    arena: &'a Arena,
) -> Result<ScanResult<'a>> {
    collections.check(count)?;
    limits.check(count)?;

    let offsets = arena.alloc_slice::<u32>(count + 1)?;
    let counts = arena.alloc_slice::<u32>(count)?;
    let mut all_keys: Vec<Key> = Vec::new();
    let mut rng = rand::thread_rng();

    for index in 0..count {
        offsets[index] = all_keys.len() as u32;
        let partition = db.partition(*collections.get(index))?;
        let limit = *limits.get(index) as usize;

        let mut reservoir: Vec<Key> = Vec::with_capacity(limit);
        let mut seen: u64 = 0;
        for item in partition.iter() {
            let (key, _) = item?;
            let key = decode_key(&key)?;
            if reservoir.len() < limit {
                reservoir.push(key);
            } else {
                let slot = rng.gen_range(0..=seen);
                if (slot as usize) < limit {
                    reservoir[slot as usize] = key;
                }
            }
            seen += 1;
        }

        counts[index] = reservoir.len() as u32;
        all_keys.extend_from_slice(&reservoir);
    }
    offsets[count] = all_keys.len() as u32;

    Ok(ScanResult {
        offsets,
        counts,
        keys: arena.alloc_copy(&all_keys)?,
    })
}
