//! Database handle
//!
//! Owns the keyspace, the collection catalog and the commit machinery. The
//! handle is safe for concurrent use; open and close are the caller's to
//! serialize, and the handle must outlive every transaction, stream and
//! collection id it produced (the borrow checker enforces the first two).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fjall::{Keyspace, PartitionHandle};
use manifold_arena::Arena;
use manifold_common::{CollectionId, Key, Options, Place, Places, Result, Strided};
use parking_lot::Mutex;

use crate::catalog::{Catalog, CollectionList, DropMode, META_COMMIT_SEQ, META_PARTITION};
use crate::config::DatabaseConfig;
use crate::measure::{self, MeasureResult};
use crate::read::{self, ReadResult, ReadShape};
use crate::sample;
use crate::scan::{self, ScanResult, ScanTasks};
use crate::stream::KeyStream;
use crate::txn::{Transaction, TransactionOptions};
use crate::write;

/// Process-local handle to one store root.
pub struct Database {
    keyspace: Keyspace,
    meta: PartitionHandle,
    catalog: Mutex<Catalog>,
    commit_lock: Mutex<()>,
    commit_seq: AtomicU64,
    txn_seq: AtomicU64,
    config: DatabaseConfig,
    root: PathBuf,
}

impl Database {
    /// Open (or create) the store at `root` with default configuration;
    /// the well-known config file inside `root` still applies.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(root, DatabaseConfig::default())
    }

    /// Open (or create) the store at `root`. `defaults` are used for any
    /// setting the config file does not override.
    pub fn open_with(root: impl AsRef<Path>, defaults: DatabaseConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let config = DatabaseConfig::load_from_root(&root, defaults)?;

        let keyspace = fjall::Config::new(&root)
            .cache_size(config.cache_size_bytes)
            .open()?;
        let meta = keyspace.open_partition(
            META_PARTITION,
            fjall::PartitionCreateOptions::default()
                .block_size(16 * 1024)
                .compression(fjall::CompressionType::None),
        )?;

        let commit_seq = match meta.get(META_COMMIT_SEQ)? {
            Some(bytes) => {
                let array: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| manifold_common::Error::Corruption)?;
                u64::from_le_bytes(array)
            }
            None => 0,
        };

        let catalog = Catalog::load(&keyspace, &meta, &config)?;
        tracing::info!(root = %root.display(), commit_seq, "opened store");

        Ok(Self {
            keyspace,
            meta,
            catalog: Mutex::new(catalog),
            commit_lock: Mutex::new(()),
            commit_seq: AtomicU64::new(commit_seq),
            txn_seq: AtomicU64::new(0),
            config,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    // ── Collection catalog ──────────────────────────────────────────────

    /// Create a named collection. Names are unique; the empty name refers
    /// to *main* and is rejected.
    pub fn create_collection(&self, name: &str) -> Result<CollectionId> {
        self.catalog
            .lock()
            .create(&self.keyspace, &self.meta, name, &self.config)
    }

    /// Drop a collection according to `mode`.
    pub fn drop_collection(&self, id: CollectionId, mode: DropMode) -> Result<()> {
        self.catalog
            .lock()
            .drop_collection(&self.keyspace, &self.meta, id, mode)
    }

    /// List collections in catalog order; *main* is omitted.
    pub fn list_collections<'a>(&self, arena: &'a Arena) -> Result<CollectionList<'a>> {
        self.catalog.lock().list(arena)
    }

    pub fn contains_collection(&self, name: &str) -> bool {
        self.catalog.lock().contains(name)
    }

    /// Resolve a name to a collection id; the empty name is *main*.
    pub fn collection_by_name(&self, name: &str) -> Option<CollectionId> {
        self.catalog.lock().resolve(name)
    }

    // ── Blob operations ─────────────────────────────────────────────────

    /// Batched point read outside a transaction.
    pub fn read<'a>(
        &self,
        places: &Places<'_>,
        options: Options,
        shape: ReadShape,
        arena: &'a Arena,
    ) -> Result<ReadResult<'a>> {
        read::read_places(self, None, places, options, shape, arena)
    }

    /// Batched point write outside a transaction: one atomic batch. Empty
    /// content deletes the entry.
    pub fn write(
        &self,
        places: &Places<'_>,
        contents: Strided<'_, &[u8]>,
        options: Options,
    ) -> Result<()> {
        write::write_places(self, places, contents, options)
    }

    /// Batched ordered range scan.
    pub fn scan<'a>(
        &self,
        tasks: &ScanTasks<'_>,
        options: Options,
        arena: &'a Arena,
    ) -> Result<ScanResult<'a>> {
        scan::scan_ranges(self, None, tasks, options, arena)
    }

    /// Uniform reservoir sample of keys per collection.
    pub fn sample<'a>(
        &self,
        collections: Strided<'_, CollectionId>,
        limits: Strided<'_, u32>,
        count: usize,
        arena: &'a Arena,
    ) -> Result<ScanResult<'a>> {
        sample::sample_keys(self, collections, limits, count, arena)
    }

    /// Lower/upper bounds on cardinality, value bytes and space usage for
    /// each `[start_key, end_key)` task.
    pub fn measure<'a>(
        &self,
        collections: Strided<'_, CollectionId>,
        start_keys: Strided<'_, Key>,
        end_keys: Strided<'_, Key>,
        count: usize,
        arena: &'a Arena,
    ) -> Result<MeasureResult<'a>> {
        measure::measure_collections(self, collections, start_keys, end_keys, count, arena)
    }

    /// Single-task scan convenience: keys of `collection` ascending from
    /// `start`, at most `limit` of them.
    pub fn scan_collection<'a>(
        &self,
        collection: CollectionId,
        start: Key,
        limit: u32,
        arena: &'a Arena,
    ) -> Result<&'a [Key]> {
        let tasks = ScanTasks::new(&collection, &start, &limit, 1);
        let result = self.scan(&tasks, Options::empty(), arena)?;
        Ok(result.task_keys(0))
    }

    /// Batched cursor over one collection's keys.
    pub fn keys(&self, collection: CollectionId) -> KeyStream<'_> {
        KeyStream::new(self, collection, self.config.stream_batch_limit)
    }

    // ── Transactions ────────────────────────────────────────────────────

    /// Begin an optimistic transaction.
    pub fn begin_transaction(&self) -> Transaction<'_> {
        let generation = self.txn_seq.fetch_add(1, Ordering::Relaxed) + 1;
        Transaction::new(self, generation)
    }

    /// Begin with explicit options; requesting a snapshot fails while
    /// `SUPPORTS_SNAPSHOTS` is false.
    pub fn begin_transaction_with(&self, options: TransactionOptions) -> Result<Transaction<'_>> {
        if options.snapshot {
            return Err(manifold_common::Error::NotSupported(
                "snapshot transactions are not supported by this engine",
            ));
        }
        Ok(self.begin_transaction())
    }

    /// Latest commit sequence number.
    pub fn sequence_number(&self) -> u64 {
        self.commit_seq.load(Ordering::Acquire)
    }

    // ── Conveniences ────────────────────────────────────────────────────

    /// Single-key read; `None` when the key is absent.
    pub fn get<'a>(
        &self,
        collection: CollectionId,
        key: Key,
        arena: &'a Arena,
    ) -> Result<Option<&'a [u8]>> {
        let keys = [key];
        let places = Places::in_collection(&collection, &keys);
        let result = self.read(&places, Options::empty(), ReadShape::Full, arena)?;
        Ok(result.get(0))
    }

    /// Single-key write; empty `value` deletes.
    pub fn put(&self, collection: CollectionId, key: Key, value: &[u8]) -> Result<()> {
        let keys = [key];
        let places = Places::in_collection(&collection, &keys);
        self.write(&places, Strided::Repeated(&value), Options::empty())
    }

    /// Single-key delete.
    pub fn erase(&self, collection: CollectionId, key: Key) -> Result<()> {
        self.put(collection, key, &[])
    }

    // ── Crate internals ─────────────────────────────────────────────────

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub(crate) fn meta(&self) -> &PartitionHandle {
        &self.meta
    }

    pub(crate) fn partition(&self, id: CollectionId) -> Result<PartitionHandle> {
        self.catalog.lock().partition(id)
    }

    /// Latest committed value of a place, bypassing any transaction.
    pub(crate) fn committed_get(&self, place: Place) -> Result<Option<fjall::Slice>> {
        let partition = self.partition(place.collection)?;
        Ok(partition.get(manifold_common::encode_key(place.key))?)
    }

    pub(crate) fn commit_lock(&self) -> &Mutex<()> {
        &self.commit_lock
    }

    pub(crate) fn next_sequence_number(&self) -> u64 {
        self.commit_seq.load(Ordering::Acquire) + 1
    }

    pub(crate) fn store_sequence_number(&self, seq: u64) {
        self.commit_seq.store(seq, Ordering::Release);
    }
}
