//! Document layer
//!
//! Maps keys to self-describing JSON objects stored as blob values.
//! Addressing is `(collection, key[, field])` where a field is a flat name
//! or a JSON-pointer path with a leading `/`. Provides:
//! - Merge/upsert/insert/update/patch writes over whole documents or
//!   sub-paths
//! - Field-selected reads as JSON substrings, strings or typed scalars
//! - `gist`: the union of field paths across documents
//! - `gather`: projection into a compacted columnar table

mod extract;
mod field;
mod gather;
mod gist;
mod modify;
mod path;
mod place;
mod read;
mod write;

pub use extract::ScalarColumn;
pub use field::FieldType;
pub use gather::{gather, Column, Table, TableHeader};
pub use gist::{gist, Gist};
pub use place::DocPlaces;
pub use read::{read, DocsReadResult};
pub use write::{write, Modification};
