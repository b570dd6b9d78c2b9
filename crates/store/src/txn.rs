//! Optimistic transactions
//!
//! A transaction stages writes locally and validates its watched read set
//! at commit: every tracked read records a fingerprint of the committed
//! value it observed, and any concurrent change to a watched key aborts
//! the commit. Validation and application run under the database commit
//! mutex, which also makes the returned sequence number the store's
//! latest after this commit.

use std::collections::{BTreeMap, HashMap};

use manifold_arena::Arena;
use manifold_common::{
    CollectionId, Error, Key, Options, Place, Places, Result, Strided,
};
use xxhash_rust::xxh3::xxh3_64;

use crate::database::Database;
use crate::read::{self, ReadResult, ReadShape};
use crate::scan::{self, ScanResult, ScanTasks};
use crate::write;

/// Options applied at `begin`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionOptions {
    /// Request a consistent snapshot taken at begin. Unsupported by this
    /// engine; begin fails with a fixed diagnostic.
    pub snapshot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    /// A failed write or commit happened; the transaction may only be
    /// dropped.
    Poisoned,
    Committed,
    Aborted,
}

/// A value observed by a read inside a transaction.
pub(crate) enum Fetched<'t> {
    Absent,
    Staged(&'t [u8]),
    Committed(fjall::Slice),
}

impl Fetched<'_> {
    pub(crate) fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Fetched::Absent => None,
            Fetched::Staged(bytes) => Some(*bytes),
            Fetched::Committed(value) => Some(&value[..]),
        }
    }
}

fn fingerprint(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// An optimistic session over one database. Single-threaded; dropping it
/// in any state discards it.
pub struct Transaction<'db> {
    db: &'db Database,
    generation: u64,
    state: State,
    /// Pending writes in key order; `None` stages a delete. Later writes
    /// to the same place replace earlier ones, which is exactly the
    /// submission-order contract.
    writes: BTreeMap<(CollectionId, Key), Option<Vec<u8>>>,
    /// Watched reads: committed-value fingerprint at read time, `None`
    /// for absent.
    watches: HashMap<(CollectionId, Key), Option<u64>>,
}

impl<'db> std::fmt::Debug for Transaction<'db> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("generation", &self.generation)
            .field("state", &self.state)
            .finish()
    }
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db Database, generation: u64) -> Self {
        Self {
            db,
            generation,
            state: State::Active,
            writes: BTreeMap::new(),
            watches: HashMap::new(),
        }
    }

    /// Generation counter assigned at begin.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            State::Active => Ok(()),
            _ => Err(Error::ArgsWrong("transaction is no longer usable")),
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Batched read observing this transaction's staged writes. Tracked
    /// unless the options carry `TXN_DONT_WATCH`.
    pub fn read<'a>(
        &mut self,
        places: &Places<'_>,
        options: Options,
        shape: ReadShape,
        arena: &'a Arena,
    ) -> Result<ReadResult<'a>> {
        self.ensure_active()?;
        let db = self.db;
        read::read_places(db, Some(self), places, options, shape, arena)
    }

    /// Single-key tracked read.
    pub fn get<'a>(
        &mut self,
        collection: CollectionId,
        key: Key,
        arena: &'a Arena,
    ) -> Result<Option<&'a [u8]>> {
        let keys = [key];
        let places = Places::in_collection(&collection, &keys);
        let result = self.read(&places, Options::empty(), ReadShape::Full, arena)?;
        Ok(result.get(0))
    }

    /// Batched scan observing staged writes. Scans do not enroll keys
    /// into the watch set.
    pub fn scan<'a>(
        &self,
        tasks: &ScanTasks<'_>,
        options: Options,
        arena: &'a Arena,
    ) -> Result<ScanResult<'a>> {
        self.ensure_active()?;
        scan::scan_ranges(self.db, Some(self), tasks, options, arena)
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Stage a batch of writes. Empty content stages a delete. On failure
    /// the transaction is poisoned and can only be dropped.
    pub fn write(
        &mut self,
        places: &Places<'_>,
        contents: Strided<'_, &[u8]>,
        _options: Options,
    ) -> Result<()> {
        self.ensure_active()?;
        if let Err(error) = write::validate_payloads(places, &contents) {
            self.state = State::Poisoned;
            return Err(error);
        }
        for index in 0..places.count {
            let place = places.get(index);
            let bytes = *contents.get(index);
            let staged = if bytes.is_empty() {
                None
            } else {
                Some(bytes.to_vec())
            };
            self.writes.insert((place.collection, place.key), staged);
        }
        Ok(())
    }

    /// Single-key staged write; empty `value` stages a delete.
    pub fn put(&mut self, collection: CollectionId, key: Key, value: &[u8]) -> Result<()> {
        let keys = [key];
        let places = Places::in_collection(&collection, &keys);
        self.write(&places, Strided::Repeated(&value), Options::empty())
    }

    /// Single-key staged delete.
    pub fn erase(&mut self, collection: CollectionId, key: Key) -> Result<()> {
        self.put(collection, key, &[])
    }

    // ── Commit ──────────────────────────────────────────────────────────

    /// Validate the watch set and apply staged writes atomically.
    pub fn commit(mut self, options: Options) -> Result<()> {
        self.commit_inner(options).map(|_| ())
    }

    /// Commit and return the store's latest sequence number after this
    /// commit.
    pub fn commit_sequenced(mut self, options: Options) -> Result<u64> {
        self.commit_inner(options)
    }

    fn commit_inner(&mut self, options: Options) -> Result<u64> {
        self.ensure_active()?;
        let db = self.db;
        let guard = db.commit_lock().lock();

        for ((collection, key), stamp) in &self.watches {
            let place = Place {
                collection: *collection,
                key: *key,
            };
            let current = db.committed_get(place)?;
            let observed = current.as_ref().map(|value| fingerprint(value));
            if observed != *stamp {
                self.state = State::Aborted;
                tracing::debug!(
                    generation = self.generation,
                    key = *key,
                    "commit aborted: watched key was modified"
                );
                return Err(Error::Conflict);
            }
        }

        let result = self.apply(options);
        drop(guard);
        match result {
            Ok(seq) => {
                self.state = State::Committed;
                Ok(seq)
            }
            Err(error) => {
                self.state = State::Aborted;
                Err(error)
            }
        }
    }

    fn apply(&mut self, options: Options) -> Result<u64> {
        let db = self.db;
        let seq = db.next_sequence_number();
        let mut batch = db.keyspace().batch();
        for ((collection, key), value) in &self.writes {
            let partition = db.partition(*collection)?;
            let encoded = manifold_common::encode_key(*key);
            match value {
                Some(bytes) => batch.insert(&partition, &encoded[..], bytes.as_slice()),
                None => batch.remove(&partition, &encoded[..]),
            }
        }
        batch.insert(db.meta(), crate::catalog::META_COMMIT_SEQ, seq.to_le_bytes());
        batch.commit()?;
        db.store_sequence_number(seq);

        if options.flush() {
            db.keyspace().persist(fjall::PersistMode::SyncAll)?;
        }
        Ok(seq)
    }

    // ── Crate internals ─────────────────────────────────────────────────

    /// Read one place through the transaction, recording a watch stamp
    /// when tracking is requested.
    pub(crate) fn fetch(&mut self, place: Place, watch: bool) -> Result<Fetched<'_>> {
        self.ensure_active()?;
        let slot = (place.collection, place.key);
        let needs_stamp = watch && !self.watches.contains_key(&slot);

        let committed = if needs_stamp || !self.writes.contains_key(&slot) {
            self.db.committed_get(place)?
        } else {
            None
        };
        if needs_stamp {
            let stamp = committed.as_ref().map(|value| fingerprint(value));
            self.watches.insert(slot, stamp);
        }

        if let Some(staged) = self.writes.get(&slot) {
            return Ok(match staged {
                Some(bytes) => Fetched::Staged(bytes),
                None => Fetched::Absent,
            });
        }
        Ok(match committed {
            Some(value) => Fetched::Committed(value),
            None => Fetched::Absent,
        })
    }

    /// Staged keys of `collection` from `start` upward, with presence.
    pub(crate) fn staged_keys_from(&self, collection: CollectionId, start: Key) -> Vec<(Key, bool)> {
        self.writes
            .range((collection, start)..=(collection, Key::MAX))
            .map(|((_, key), value)| (*key, value.is_some()))
            .collect()
    }
}
