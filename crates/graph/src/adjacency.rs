//! Adjacency list codec
//!
//! A vertex's blob value is a one-byte format tag followed by packed
//! 17-byte records: neighbor key (LE), edge id (LE), direction byte. The
//! tag keeps a zero-degree vertex representable: an empty record list is
//! still a non-empty blob, distinct from an absent vertex. Records are
//! kept sorted and deduplicated.

use manifold_common::{Error, Key, Result};

const FORMAT_TAG: u8 = 1;
const RECORD_LEN: usize = 17;

/// One adjacency record stored under a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct AdjRecord {
    pub neighbor: Key,
    pub edge_id: Key,
    /// True when the owning vertex is the edge's source.
    pub outgoing: bool,
}

pub(crate) fn decode_list(bytes: &[u8]) -> Result<Vec<AdjRecord>> {
    if bytes.is_empty() || bytes[0] != FORMAT_TAG || (bytes.len() - 1) % RECORD_LEN != 0 {
        return Err(Error::Corruption);
    }
    let mut records = Vec::with_capacity((bytes.len() - 1) / RECORD_LEN);
    for chunk in bytes[1..].chunks_exact(RECORD_LEN) {
        records.push(AdjRecord {
            neighbor: Key::from_le_bytes(chunk[0..8].try_into().expect("chunk is 17 bytes")),
            edge_id: Key::from_le_bytes(chunk[8..16].try_into().expect("chunk is 17 bytes")),
            outgoing: chunk[16] != 0,
        });
    }
    Ok(records)
}

pub(crate) fn encode_list(records: &[AdjRecord]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(1 + records.len() * RECORD_LEN);
    bytes.push(FORMAT_TAG);
    for record in records {
        bytes.extend_from_slice(&record.neighbor.to_le_bytes());
        bytes.extend_from_slice(&record.edge_id.to_le_bytes());
        bytes.push(record.outgoing as u8);
    }
    bytes
}

/// Insert keeping the list sorted; identical records are idempotent.
pub(crate) fn insert_record(records: &mut Vec<AdjRecord>, record: AdjRecord) {
    if let Err(slot) = records.binary_search(&record) {
        records.insert(slot, record);
    }
}

/// Remove one record if present.
pub(crate) fn remove_record(records: &mut Vec<AdjRecord>, record: &AdjRecord) {
    if let Ok(slot) = records.binary_search(record) {
        records.remove(slot);
    }
}
