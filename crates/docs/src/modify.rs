//! Document mutation
//!
//! Five modification modes over whole documents or addressed fields:
//! upsert, deep merge (RFC 7396), insert, update, and JSON Patch
//! (RFC 6902) with add/remove/replace/copy/move/test operations.

use manifold_common::{Error, Result};
use serde_json::{Map, Value};

use crate::path::{lookup, lookup_mut, split_parent, unescape_token};

/// How a write changes the addressed document or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    /// Create or fully replace.
    Upsert,
    /// Deep-merge an object into the existing value.
    Merge,
    /// Fail when the target already exists.
    Insert,
    /// Fail when the target does not exist.
    Update,
    /// Apply a JSON Patch document.
    Patch,
}

/// A single field-level mutation.
pub(crate) enum FieldOp {
    Upsert(Value),
    Merge(Value),
    Insert(Value),
    Update(Value),
    Remove,
}

/// RFC 7396 merge patch: objects merge member-wise, `null` removes, any
/// other patch value replaces the target entirely.
pub(crate) fn merge_patch(target: &mut Value, patch: &Value) {
    if let Value::Object(members) = patch {
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        let map = target.as_object_mut().expect("target was just made an object");
        for (key, value) in members {
            if value.is_null() {
                map.remove(key);
            } else {
                merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    } else {
        *target = patch.clone();
    }
}

/// Mutate the value addressed by `field` inside `root`.
pub(crate) fn modify_field(root: &mut Value, field: &str, op: FieldOp) -> Result<()> {
    let is_pointer = field.starts_with('/');
    let (parent_path, token) = split_parent(field);
    let parent = lookup_mut(root, parent_path).ok_or(Error::ArgsWrong("invalid field"))?;

    match parent {
        Value::Array(items) => {
            let is_index = !token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit());
            let index: usize = if is_index { token.parse().unwrap_or(usize::MAX) } else { 0 };
            match op {
                FieldOp::Merge(value) => {
                    let item = items
                        .get_mut(index)
                        .filter(|_| is_index)
                        .ok_or(Error::ArgsWrong("invalid field"))?;
                    merge_patch(item, &value);
                }
                FieldOp::Insert(value) => {
                    if is_index && index <= items.len() {
                        items.insert(index, value);
                    } else if token == "-" {
                        items.push(value);
                    } else {
                        return Err(Error::ArgsWrong("failed to insert"));
                    }
                }
                FieldOp::Remove => {
                    if !is_index || index >= items.len() {
                        return Err(Error::ArgsWrong("failed to remove"));
                    }
                    items.remove(index);
                }
                FieldOp::Update(value) => {
                    let item = items
                        .get_mut(index)
                        .filter(|_| is_index)
                        .ok_or(Error::ArgsWrong("failed to update"))?;
                    *item = value;
                }
                FieldOp::Upsert(value) => {
                    if is_index && index < items.len() {
                        items[index] = value;
                    } else {
                        items.push(value);
                    }
                }
            }
        }
        Value::Object(map) => {
            let key = if is_pointer {
                unescape_token(token)
            } else {
                token.to_string()
            };
            match op {
                FieldOp::Merge(value) => {
                    merge_patch(map.entry(key).or_insert(Value::Null), &value);
                }
                FieldOp::Insert(value) | FieldOp::Upsert(value) => {
                    map.insert(key, value);
                }
                FieldOp::Remove => {
                    map.remove(&key).ok_or(Error::ArgsWrong("failed to remove"))?;
                }
                FieldOp::Update(value) => {
                    let slot = map
                        .get_mut(&key)
                        .ok_or(Error::ArgsWrong("failed to update"))?;
                    *slot = value;
                }
            }
        }
        _ => return Err(Error::ArgsWrong("invalid field")),
    }
    Ok(())
}

/// Apply a field op at an optional address; `None` targets the root.
fn apply_at(root: &mut Value, field: Option<&str>, op: FieldOp) -> Result<()> {
    match field {
        Some(field) => modify_field(root, field, op),
        None => {
            match op {
                FieldOp::Upsert(value) | FieldOp::Insert(value) | FieldOp::Update(value) => {
                    *root = value;
                }
                FieldOp::Merge(value) => merge_patch(root, &value),
                FieldOp::Remove => *root = Value::Null,
            }
            Ok(())
        }
    }
}

/// Concatenate a base field with a patch-op path, as raw strings.
fn concat_field(base: Option<&str>, path: &str) -> Option<String> {
    match base {
        None if path.is_empty() => None,
        None => Some(path.to_string()),
        Some(base) if path.is_empty() => Some(base.to_string()),
        Some(base) => Some(format!("{base}{path}")),
    }
}

const INVALID_PATCH: Error = Error::ArgsWrong("invalid patch document");

/// RFC 6902 JSON Patch relative to an optional base field.
pub(crate) fn apply_patch(root: &mut Value, base: Option<&str>, patch: &Value) -> Result<()> {
    let operations = patch.as_array().ok_or(INVALID_PATCH)?;
    for operation in operations {
        let members = operation.as_object().ok_or(INVALID_PATCH)?;
        let kind = members.get("op").and_then(Value::as_str).ok_or(INVALID_PATCH)?;
        let path = members
            .get("path")
            .and_then(Value::as_str)
            .ok_or(INVALID_PATCH)?;
        let target = concat_field(base, path);

        let value_member = || members.get("value").cloned().ok_or(INVALID_PATCH);
        let from_member = || -> Result<Option<String>> {
            let from = members.get("from").and_then(Value::as_str).ok_or(INVALID_PATCH)?;
            Ok(concat_field(base, from))
        };

        match kind {
            "add" => apply_at(root, target.as_deref(), FieldOp::Insert(value_member()?))?,
            "remove" => apply_at(root, target.as_deref(), FieldOp::Remove)?,
            "replace" => apply_at(root, target.as_deref(), FieldOp::Update(value_member()?))?,
            "copy" => {
                let from = from_member()?;
                let value = lookup(root, from.as_deref())
                    .cloned()
                    .ok_or(INVALID_PATCH)?;
                apply_at(root, target.as_deref(), FieldOp::Upsert(value))?;
            }
            "move" => {
                let from = from_member()?;
                let value = lookup(root, from.as_deref())
                    .cloned()
                    .ok_or(INVALID_PATCH)?;
                apply_at(root, from.as_deref(), FieldOp::Remove)?;
                apply_at(root, target.as_deref(), FieldOp::Upsert(value))?;
            }
            "test" => {
                let expected = value_member()?;
                let current = lookup(root, target.as_deref()).ok_or(INVALID_PATCH)?;
                if *current != expected {
                    return Err(Error::ArgsWrong("patch test failed"));
                }
            }
            _ => return Err(INVALID_PATCH),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_patch_follows_rfc_7396() {
        let mut doc = json!({"a": 1, "b": {"x": 0}});
        merge_patch(&mut doc, &json!({"b": {"y": 1}, "c": 2}));
        assert_eq!(doc, json!({"a": 1, "b": {"x": 0, "y": 1}, "c": 2}));

        // Null removes, scalars replace.
        merge_patch(&mut doc, &json!({"a": null, "b": 3}));
        assert_eq!(doc, json!({"b": 3, "c": 2}));
    }

    #[test]
    fn field_ops_cover_arrays() {
        let mut doc = json!({"arr": [1, 2, 3]});
        modify_field(&mut doc, "/arr/1", FieldOp::Update(json!(20))).unwrap();
        assert_eq!(doc, json!({"arr": [1, 20, 3]}));

        modify_field(&mut doc, "/arr/-", FieldOp::Insert(json!(4))).unwrap();
        assert_eq!(doc, json!({"arr": [1, 20, 3, 4]}));

        modify_field(&mut doc, "/arr/0", FieldOp::Remove).unwrap();
        assert_eq!(doc, json!({"arr": [20, 3, 4]}));

        assert!(modify_field(&mut doc, "/arr/9", FieldOp::Update(json!(0))).is_err());
    }

    #[test]
    fn patch_operations_apply_in_order() {
        let mut doc = json!({"a": {"b": 1}, "keep": true});
        let patch = json!([
            {"op": "test", "path": "/a/b", "value": 1},
            {"op": "add", "path": "/a/c", "value": 2},
            {"op": "move", "path": "/moved", "from": "/a/b"},
            {"op": "copy", "path": "/copied", "from": "/moved"},
            {"op": "replace", "path": "/keep", "value": false},
            {"op": "remove", "path": "/a/c"}
        ]);
        apply_patch(&mut doc, None, &patch).unwrap();
        assert_eq!(
            doc,
            json!({"a": {}, "keep": false, "moved": 1, "copied": 1})
        );
    }

    #[test]
    fn failed_test_op_aborts() {
        let mut doc = json!({"a": 1});
        let patch = json!([{"op": "test", "path": "/a", "value": 2}]);
        assert!(apply_patch(&mut doc, None, &patch).is_err());
    }
}
