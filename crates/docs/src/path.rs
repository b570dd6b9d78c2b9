//! Field addressing
//!
//! A field is either a flat object member name or a JSON-pointer path,
//! detected by the leading `/`.

use serde_json::Value;

/// Resolve a field within a document. `None` addresses the root.
pub(crate) fn lookup<'v>(root: &'v Value, field: Option<&str>) -> Option<&'v Value> {
    match field {
        None => Some(root),
        Some(path) if path.starts_with('/') => root.pointer(path),
        Some(name) => root.get(name),
    }
}

/// Split a field into its parent path and the final token.
///
/// The split happens at the last `/`: `/a/b/c` resolves the parent
/// `/a/b` (a pointer) and the token `c`, while `cfg/b` resolves the
/// parent `cfg` (a flat name, as produced by concatenating a flat base
/// field with a patch-op path) and the token `b`.
pub(crate) fn split_parent(field: &str) -> (Option<&str>, &str) {
    match field.rfind('/') {
        None => (None, field),
        Some(0) => (None, &field[1..]),
        Some(split) => (Some(&field[..split]), &field[split + 1..]),
    }
}

/// Resolve a field mutably.
pub(crate) fn lookup_mut<'v>(root: &'v mut Value, field: Option<&str>) -> Option<&'v mut Value> {
    match field {
        None => Some(root),
        Some(path) if path.starts_with('/') => root.pointer_mut(path),
        Some(name) => root.get_mut(name),
    }
}

/// Unescape one JSON-pointer token (`~1` is `/`, `~0` is `~`).
pub(crate) fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
