//! Request-scoped memory for batched calls
//!
//! Every batched operation writes its outputs into a caller-owned [`Arena`]
//! and returns views that stay valid until the arena is cleared. Nested
//! calls reuse the same arena without freeing. [`TapeBuilder`] accumulates
//! variable-length entries and publishes them as one arena-owned
//! offsets/lengths/contents triple.

mod arena;
mod tape;

pub use arena::Arena;
pub use tape::{Tape, TapeBuilder};
