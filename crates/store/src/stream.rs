//! Batched key streams
//!
//! A key stream is a cursor over one collection's keys: finite, ordered
//! batches that a caller concatenates to cover the whole collection. The
//! stream is restartable from an arbitrary key via `seek`.

use manifold_arena::Arena;
use manifold_common::{CollectionId, Key, Options, Result};

use crate::database::Database;
use crate::scan::ScanTasks;

/// Cursor over the keys of a single collection.
pub struct KeyStream<'db> {
    db: &'db Database,
    collection: CollectionId,
    limit: u32,
    arena: Arena,
    batch: Vec<Key>,
    next_start: Option<Key>,
}

impl<'db> KeyStream<'db> {
    pub(crate) fn new(db: &'db Database, collection: CollectionId, limit: u32) -> Self {
        Self {
            db,
            collection,
            limit: limit.max(2),
            arena: Arena::new(),
            batch: Vec::new(),
            next_start: None,
        }
    }

    /// Override the per-batch key limit (clamped to at least 2).
    pub fn with_batch_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(2);
        self
    }

    /// Position the stream at the smallest key.
    pub fn seek_to_first(&mut self) -> Result<()> {
        self.seek(Key::MIN)
    }

    /// Position the stream at the first key `>= key` and fill the batch.
    pub fn seek(&mut self, key: Key) -> Result<()> {
        self.arena.clear();
        let tasks = ScanTasks::new(&self.collection, &key, &self.limit, 1);
        let result = self
            .db
            .scan(&tasks, Options::empty(), &self.arena)?;
        let keys = result.task_keys(0);
        self.batch.clear();
        self.batch.extend_from_slice(keys);

        self.next_start = if keys.len() < self.limit as usize {
            None
        } else {
            // A batch ending at the maximum key has nothing after it.
            keys.last().and_then(|last| last.checked_add(1))
        };
        Ok(())
    }

    /// Advance to the next batch; after the last batch the stream ends.
    pub fn seek_to_next_batch(&mut self) -> Result<()> {
        match self.next_start {
            Some(start) => self.seek(start),
            None => {
                self.batch.clear();
                Ok(())
            }
        }
    }

    /// True when the current batch is empty and nothing follows.
    pub fn is_end(&self) -> bool {
        self.batch.is_empty()
    }

    /// Keys of the current batch.
    pub fn keys_batch(&self) -> &[Key] {
        &self.batch
    }
}
