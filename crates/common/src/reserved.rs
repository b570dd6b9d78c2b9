//! Reserved sentinel values and capability flags
//!
//! Sentinels are bit-exact and must never be used as ordinary payload.

/// A key within a collection: signed 64-bit, ordered numerically.
pub type Key = i64;

/// Stable opaque identifier of a collection. Id 0 is the anonymous *main*
/// collection, which always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CollectionId(pub u64);

/// The anonymous *main* collection.
pub const COLLECTION_MAIN: CollectionId = CollectionId(0);

/// Value length encoding a missing entry. Real lengths are in [0, 2^32 - 2].
pub const LENGTH_MISSING: u32 = u32::MAX;

/// Reserved key that no entry may use.
pub const KEY_UNKNOWN: Key = i64::MAX;

/// Reserved edge identifier marking an unlabeled edge.
pub const DEFAULT_EDGE_ID: Key = KEY_UNKNOWN;

/// Degree reported for a vertex that is absent from the graph.
pub const DEGREE_MISSING: u32 = u32::MAX;

pub const SUPPORTS_TRANSACTIONS: bool = true;
pub const SUPPORTS_NAMED_COLLECTIONS: bool = true;
pub const SUPPORTS_SNAPSHOTS: bool = false;
