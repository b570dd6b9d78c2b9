//! Collection catalog
//!
//! Collections are named partitions of the key space, backed by keyspace
//! partitions. The anonymous *main* collection (id 0) always exists and its
//! handle cannot be dropped. Name→id assignments are persisted in the meta
//! partition so ids stay stable across reopen.

use std::collections::BTreeMap;

use fjall::{Keyspace, PartitionHandle};
use manifold_arena::{Arena, Tape, TapeBuilder};
use manifold_common::{CollectionId, Error, Result, COLLECTION_MAIN};

use crate::config::DatabaseConfig;

pub(crate) const META_PARTITION: &str = "catalog";
pub(crate) const META_NEXT_ID: &[u8] = b"next_collection_id";
pub(crate) const META_COMMIT_SEQ: &[u8] = b"commit_seq";
const META_NAME_PREFIX: &[u8] = b"name:";

/// How a drop affects keys, values and the handle itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropMode {
    /// Remove all entries and the handle. Forbidden on *main*.
    KeysValsHandle,
    /// Remove all entries, keep the handle.
    KeysVals,
    /// Overwrite every value with the empty value, preserving keys.
    Vals,
}

/// One listing of the catalog: ids in catalog order plus a packed
/// NUL-terminated name tape. *Main* is omitted.
#[derive(Debug, Clone, Copy)]
pub struct CollectionList<'a> {
    pub ids: &'a [CollectionId],
    pub names: Tape<'a>,
}

impl<'a> CollectionList<'a> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn name(&self, index: usize) -> &'a str {
        std::str::from_utf8(self.names.get(index).unwrap_or_default()).unwrap_or_default()
    }
}

struct Entry {
    name: Option<String>,
    partition: PartitionHandle,
}

/// In-memory view of the catalog, guarded by the database mutex.
pub(crate) struct Catalog {
    entries: BTreeMap<u64, Entry>,
    next_id: u64,
}

fn partition_name(id: u64) -> String {
    format!("col_{id}")
}

fn data_options(config: &DatabaseConfig) -> fjall::PartitionCreateOptions {
    fjall::PartitionCreateOptions::default()
        .block_size(64 * 1024)
        .compression(config.compression.into())
}

fn name_key(name: &str) -> Vec<u8> {
    let mut key = META_NAME_PREFIX.to_vec();
    key.extend_from_slice(name.as_bytes());
    key
}

impl Catalog {
    /// Rebuild the catalog from the meta partition, opening every known
    /// collection partition (including *main*).
    pub(crate) fn load(
        keyspace: &Keyspace,
        meta: &PartitionHandle,
        config: &DatabaseConfig,
    ) -> Result<Self> {
        let next_id = match meta.get(META_NEXT_ID)? {
            Some(bytes) => decode_u64(&bytes)?,
            None => 1,
        };

        let mut entries = BTreeMap::new();
        let main = keyspace.open_partition(&partition_name(0), data_options(config))?;
        entries.insert(
            0,
            Entry {
                name: None,
                partition: main,
            },
        );

        for item in meta.prefix(META_NAME_PREFIX) {
            let (key, value) = item?;
            let name = std::str::from_utf8(&key[META_NAME_PREFIX.len()..])
                .map_err(|_| Error::Corruption)?
                .to_string();
            let id = decode_u64(&value)?;
            let partition = keyspace.open_partition(&partition_name(id), data_options(config))?;
            entries.insert(
                id,
                Entry {
                    name: Some(name),
                    partition,
                },
            );
        }

        Ok(Self { entries, next_id })
    }

    pub(crate) fn partition(&self, id: CollectionId) -> Result<PartitionHandle> {
        self.entries
            .get(&id.0)
            .map(|entry| entry.partition.clone())
            .ok_or(Error::ArgsWrong("unknown collection"))
    }

    pub(crate) fn create(
        &mut self,
        keyspace: &Keyspace,
        meta: &PartitionHandle,
        name: &str,
        config: &DatabaseConfig,
    ) -> Result<CollectionId> {
        if name.is_empty() {
            return Err(Error::ArgsWrong("the main collection is always present"));
        }
        let duplicate = self
            .entries
            .values()
            .any(|entry| entry.name.as_deref() == Some(name));
        if duplicate {
            return Err(Error::ArgsWrong("such collection already exists"));
        }

        let id = self.next_id;
        let partition = keyspace.open_partition(&partition_name(id), data_options(config))?;
        self.next_id += 1;
        meta.insert(name_key(name), id.to_le_bytes())?;
        meta.insert(META_NEXT_ID, self.next_id.to_le_bytes())?;
        self.entries.insert(
            id,
            Entry {
                name: Some(name.to_string()),
                partition,
            },
        );
        tracing::debug!(collection = name, id, "created collection");
        Ok(CollectionId(id))
    }

    pub(crate) fn drop_collection(
        &mut self,
        keyspace: &Keyspace,
        meta: &PartitionHandle,
        id: CollectionId,
        mode: DropMode,
    ) -> Result<()> {
        if id == COLLECTION_MAIN && mode == DropMode::KeysValsHandle {
            return Err(Error::ArgsCombo("the main collection can't be invalidated"));
        }
        let entry = self
            .entries
            .get(&id.0)
            .ok_or(Error::ArgsWrong("unknown collection"))?;
        let partition = entry.partition.clone();

        match mode {
            DropMode::KeysValsHandle => {
                if let Some(entry) = self.entries.remove(&id.0) {
                    if let Some(name) = &entry.name {
                        meta.remove(name_key(name))?;
                    }
                    keyspace.delete_partition(entry.partition)?;
                    tracing::debug!(id = id.0, "dropped collection handle");
                }
            }
            DropMode::KeysVals => {
                let mut batch = keyspace.batch();
                for item in partition.iter() {
                    let (key, _) = item?;
                    batch.remove(&partition.clone(), key);
                }
                batch.commit()?;
            }
            DropMode::Vals => {
                let empty: &[u8] = &[];
                let mut batch = keyspace.batch();
                for item in partition.iter() {
                    let (key, _) = item?;
                    batch.insert(&partition, key, empty);
                }
                batch.commit()?;
            }
        }
        keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    pub(crate) fn list<'a>(&self, arena: &'a Arena) -> Result<CollectionList<'a>> {
        let mut ids = Vec::new();
        let mut names = TapeBuilder::with_terminator();
        for (id, entry) in &self.entries {
            let Some(name) = &entry.name else {
                continue;
            };
            ids.push(CollectionId(*id));
            names.push(name.as_bytes());
        }
        Ok(CollectionList {
            ids: arena.alloc_copy(&ids)?,
            names: names.finish(arena)?,
        })
    }

    /// Linear search over the listing, as the boundary promises.
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries
            .values()
            .any(|entry| entry.name.as_deref() == Some(name))
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<CollectionId> {
        if name.is_empty() {
            return Some(COLLECTION_MAIN);
        }
        self.entries
            .iter()
            .find(|(_, entry)| entry.name.as_deref() == Some(name))
            .map(|(id, _)| CollectionId(*id))
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| Error::Corruption)?;
    Ok(u64::from_le_bytes(array))
}
