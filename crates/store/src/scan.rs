//! Batched ordered range scans
//!
//! Each task emits up to `limit` keys ascending from its start key,
//! inclusive, never crossing the collection boundary. Tasks share one key
//! tape partitioned by per-task offsets and counts. Inside a transaction
//! the committed range is merged with the staged writes: staged deletes
//! hide keys, staged inserts appear.

use manifold_arena::Arena;
use manifold_common::{decode_key, encode_key, CollectionId, Key, Options, Result, Strided};

use crate::database::Database;
use crate::txn::Transaction;

/// A batch of scan tasks.
#[derive(Debug, Clone, Copy)]
pub struct ScanTasks<'a> {
    pub collections: Strided<'a, CollectionId>,
    pub start_keys: Strided<'a, Key>,
    pub limits: Strided<'a, u32>,
    pub count: usize,
}

impl<'a> ScanTasks<'a> {
    pub fn new(
        collections: impl Into<Strided<'a, CollectionId>>,
        start_keys: impl Into<Strided<'a, Key>>,
        limits: impl Into<Strided<'a, u32>>,
        count: usize,
    ) -> Self {
        Self {
            collections: collections.into(),
            start_keys: start_keys.into(),
            limits: limits.into(),
            count,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.collections.check(self.count)?;
        self.start_keys.check(self.count)?;
        self.limits.check(self.count)
    }
}

/// Arena-owned key tape shared by all tasks of a scan or sample.
#[derive(Debug, Clone, Copy)]
pub struct ScanResult<'a> {
    /// Per-task start offsets into `keys`, `tasks + 1` entries.
    pub offsets: &'a [u32],
    /// Keys emitted per task.
    pub counts: &'a [u32],
    pub keys: &'a [Key],
}

impl<'a> ScanResult<'a> {
    /// Keys of one task.
    pub fn task_keys(&self, index: usize) -> &'a [Key] {
        let start = self.offsets[index] as usize;
        &self.keys[start..start + self.counts[index] as usize]
    }
}

fn next_committed_key<I>(iter: &mut I) -> Result<Option<Key>>
where
    I: Iterator<Item = std::result::Result<(fjall::Slice, fjall::Slice), fjall::Error>>,
{
    match iter.next() {
        None => Ok(None),
        Some(item) => {
            let (key, _) = item?;
            Ok(Some(decode_key(&key)?))
        }
    }
}

pub(crate) fn scan_ranges<'a>(
    db: &Database,
    txn: Option<&Transaction<'_>>,
    tasks: &ScanTasks<'_>,
    _options: Options,
    arena: &'a Arena,
) -> Result<ScanResult<'a>> {
    tasks.validate()?;

    let offsets = arena.alloc_slice::<u32>(tasks.count + 1)?;
    let counts = arena.alloc_slice::<u32>(tasks.count)?;
    let mut all_keys: Vec<Key> = Vec::new();

    for index in 0..tasks.count {
        offsets[index] = all_keys.len() as u32;
        let collection = *tasks.collections.get(index);
        let start = *tasks.start_keys.get(index);
        let limit = *tasks.limits.get(index);

        let partition = db.partition(collection)?;
        let mut committed = partition.range(encode_key(start)..);
        let mut next_committed = next_committed_key(&mut committed)?;

        let staged = txn
            .map(|txn| txn.staged_keys_from(collection, start))
            .unwrap_or_default();
        let mut staged_iter = staged.into_iter().peekable();

        let mut emitted = 0u32;
        while emitted < limit {
            match (next_committed, staged_iter.peek().copied()) {
                (None, None) => break,
                (Some(key), None) => {
                    all_keys.push(key);
                    emitted += 1;
                    next_committed = next_committed_key(&mut committed)?;
                }
                (None, Some((key, present))) => {
                    staged_iter.next();
                    if present {
                        all_keys.push(key);
                        emitted += 1;
                    }
                }
                (Some(committed_key), Some((staged_key, present))) => {
                    if committed_key < staged_key {
                        all_keys.push(committed_key);
                        emitted += 1;
                        next_committed = next_committed_key(&mut committed)?;
                    } else {
                        // The staged write wins on ties: a delete hides
                        // the committed key, an insert replaces it.
                        staged_iter.next();
                        if staged_key == committed_key {
                            next_committed = next_committed_key(&mut committed)?;
                        }
                        if present {
                            all_keys.push(staged_key);
                            emitted += 1;
                        }
                    }
                }
            }
        }
        counts[index] = emitted;
    }
    offsets[tasks.count] = all_keys.len() as u32;

    Ok(ScanResult {
        offsets,
        counts,
        keys: arena.alloc_copy(&all_keys)?,
    })
}
