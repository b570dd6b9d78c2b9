//! Graph layer
//!
//! Stores a directed multigraph as an adjacency index over blob entries:
//! each vertex key maps to a packed, sorted list of
//! `(neighbor, edge id, direction)` records, so neighborhood enumeration
//! is O(degree). Every edge mutation updates both endpoints' lists under
//! one transaction; no observable state shows an edge from only one side.

mod adjacency;
mod edges;
mod ops;

pub use edges::{Edge, Edges, Role};
pub use ops::{find_edges, remove_edges, remove_vertices, upsert_edges, Neighborhoods};
