//! Common types for the manifold substrate
//!
//! This crate defines:
//! - The error taxonomy shared by every layer
//! - Reserved sentinel values and capability flags
//! - The order-preserving key codec
//! - Strided batch views and place descriptors
//! - The options bitset accepted by every batched call

mod bits;
mod error;
mod keys;
mod options;
mod reserved;
mod strided;

pub use bits::{get_bit, octets_for, set_bit};
pub use error::{Error, Result};
pub use keys::{decode_key, encode_key, ENCODED_KEY_LEN};
pub use options::Options;
pub use reserved::{
    CollectionId, Key, COLLECTION_MAIN, DEFAULT_EDGE_ID, DEGREE_MISSING, KEY_UNKNOWN,
    LENGTH_MISSING, SUPPORTS_NAMED_COLLECTIONS, SUPPORTS_SNAPSHOTS, SUPPORTS_TRANSACTIONS,
};
pub use strided::{Place, Places, Strided};
