//! Structural application of patch operations.
//!
//! `add` and `replace` create missing intermediate containers on the way
//! down: an array when the following segment is all digits, an object
//! otherwise. `add` into an array inserts (or appends for `-`); `replace`
//! overwrites. `remove` splices an array index or deletes an object key.

use serde_json::{Map, Value};

use curate_pointer::{format_path, is_integer, parse_index};

use super::types::{Operation, PatchError};

// ── Path navigation ───────────────────────────────────────────────────────

fn empty_container_for(next_step: &str) -> Value {
    if is_integer(next_step) {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Walk to the parent of `path`, creating missing containers.
///
/// `path` must be non-empty.
fn parent_mut_creating<'a>(doc: &'a mut Value, path: &[String]) -> Result<&'a mut Value, PatchError> {
    let mut current = doc;
    for (i, step) in path[..path.len() - 1].iter().enumerate() {
        let next_step = &path[i + 1];
        let child = match current {
            Value::Object(map) => map.entry(step.clone()).or_insert(Value::Null),
            Value::Array(arr) => {
                let idx = parse_index(step)?;
                if idx > arr.len() {
                    return Err(PatchError::InvalidIndex(format_path(&path[..=i])));
                }
                if idx == arr.len() {
                    arr.push(Value::Null);
                }
                &mut arr[idx]
            }
            _ => return Err(PatchError::InvalidTarget(format_path(&path[..=i]))),
        };
        if child.is_null() {
            *child = empty_container_for(next_step);
        }
        current = child;
    }
    Ok(current)
}

/// Walk to the parent of `path` without creating anything.
fn parent_mut<'a>(doc: &'a mut Value, path: &[String]) -> Result<&'a mut Value, PatchError> {
    let parent_path = &path[..path.len() - 1];
    curate_pointer::get_mut(doc, parent_path)
        .ok_or_else(|| PatchError::NotFound(format_path(parent_path)))
}

// ── Individual operation applicators ─────────────────────────────────────

fn apply_add(doc: &mut Value, path: &[String], value: Value) -> Result<(), PatchError> {
    let Some(key) = path.last() else {
        *doc = value;
        return Ok(());
    };
    match parent_mut_creating(doc, path)? {
        Value::Object(map) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if key == "-" {
                arr.push(value);
                return Ok(());
            }
            let idx = parse_index(key)?;
            if idx > arr.len() {
                return Err(PatchError::InvalidIndex(format_path(path)));
            }
            arr.insert(idx, value);
            Ok(())
        }
        _ => Err(PatchError::InvalidTarget(format_path(path))),
    }
}

fn apply_replace(doc: &mut Value, path: &[String], value: Value) -> Result<(), PatchError> {
    let Some(key) = path.last() else {
        *doc = value;
        return Ok(());
    };
    match parent_mut_creating(doc, path)? {
        Value::Object(map) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let idx = parse_index(key)?;
            match arr.get_mut(idx) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(PatchError::NotFound(format_path(path))),
            }
        }
        _ => Err(PatchError::InvalidTarget(format_path(path))),
    }
}

fn apply_remove(doc: &mut Value, path: &[String]) -> Result<(), PatchError> {
    let Some(key) = path.last() else {
        return Err(PatchError::InvalidTarget("cannot remove the document root".into()));
    };
    match parent_mut(doc, path)? {
        Value::Object(map) => map
            .shift_remove(key)
            .map(|_| ())
            .ok_or_else(|| PatchError::NotFound(format_path(path))),
        Value::Array(arr) => {
            let idx = parse_index(key)?;
            if idx >= arr.len() {
                return Err(PatchError::NotFound(format_path(path)));
            }
            arr.remove(idx);
            Ok(())
        }
        _ => Err(PatchError::InvalidTarget(format_path(path))),
    }
}

// ── Main apply functions ──────────────────────────────────────────────────

/// Apply a single operation to the document in place.
///
/// On error the document may have gained empty intermediate containers but
/// the target itself is untouched.
pub fn apply_operation(doc: &mut Value, op: &Operation) -> Result<(), PatchError> {
    match op {
        Operation::Add { path, value } => apply_add(doc, path, value.clone()),
        Operation::Remove { path, .. } => apply_remove(doc, path),
        Operation::Replace { path, value, .. } => apply_replace(doc, path, value.clone()),
    }
}

/// Apply a sequence of operations onto a copy of `doc`, stopping at the
/// first failure.
pub fn apply_operations(doc: &Value, ops: &[Operation]) -> Result<Value, PatchError> {
    let mut working = doc.clone();
    for op in ops {
        apply_operation(&mut working, op)?;
    }
    Ok(working)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use curate_pointer::parse_path as path;
    use serde_json::json;

    #[test]
    fn add_to_object() {
        let mut doc = json!({"a": 1});
        apply_operation(&mut doc, &Operation::add(path("/b"), json!(2))).unwrap();
        assert_eq!(doc, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn add_inserts_into_array() {
        let mut doc = json!([1, 2, 3]);
        apply_operation(&mut doc, &Operation::add(path("/1"), json!(99))).unwrap();
        assert_eq!(doc, json!([1, 99, 2, 3]));
    }

    #[test]
    fn add_appends_with_dash() {
        let mut doc = json!([1, 2]);
        apply_operation(&mut doc, &Operation::add(path("/-"), json!(3))).unwrap();
        assert_eq!(doc, json!([1, 2, 3]));
    }

    #[test]
    fn add_past_array_end_fails() {
        let mut doc = json!([1]);
        let err = apply_operation(&mut doc, &Operation::add(path("/5"), json!(3))).unwrap_err();
        assert!(matches!(err, PatchError::InvalidIndex(_)));
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn add_creates_intermediate_containers() {
        let mut doc = json!({});
        apply_operation(&mut doc, &Operation::add(path("/a/b/0/c"), json!(true))).unwrap();
        assert_eq!(doc, json!({"a": {"b": [{"c": true}]}}));
    }

    #[test]
    fn add_replaces_null_intermediate() {
        let mut doc = json!({"a": null});
        apply_operation(&mut doc, &Operation::add(path("/a/x"), json!(1))).unwrap();
        assert_eq!(doc, json!({"a": {"x": 1}}));
    }

    #[test]
    fn add_through_scalar_fails() {
        let mut doc = json!({"a": 5});
        let err = apply_operation(&mut doc, &Operation::add(path("/a/b/c"), json!(1))).unwrap_err();
        assert!(matches!(err, PatchError::InvalidTarget(_)));
    }

    #[test]
    fn add_at_root_replaces_document() {
        let mut doc = json!({"a": 1});
        apply_operation(&mut doc, &Operation::add(vec![], json!([1]))).unwrap();
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn replace_object_value() {
        let mut doc = json!({"a": {"value": 1}});
        let op = Operation::replace(path("/a/value"), json!(2), Some(json!(1)));
        apply_operation(&mut doc, &op).unwrap();
        assert_eq!(doc, json!({"a": {"value": 2}}));
    }

    #[test]
    fn replace_array_element_overwrites() {
        let mut doc = json!([1, 2, 3]);
        apply_operation(&mut doc, &Operation::replace(path("/1"), json!(9), None)).unwrap();
        assert_eq!(doc, json!([1, 9, 3]));
    }

    #[test]
    fn replace_missing_array_element_fails() {
        let mut doc = json!([1]);
        let err = apply_operation(&mut doc, &Operation::replace(path("/4"), json!(9), None)).unwrap_err();
        assert!(matches!(err, PatchError::NotFound(_)));
    }

    #[test]
    fn remove_object_key_preserves_order() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        apply_operation(&mut doc, &Operation::remove(path("/b"), None)).unwrap();
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn remove_splices_array() {
        let mut doc = json!({"list": [1, 2, 3]});
        apply_operation(&mut doc, &Operation::remove(path("/list/0"), None)).unwrap();
        assert_eq!(doc, json!({"list": [2, 3]}));
    }

    #[test]
    fn remove_missing_fails() {
        let mut doc = json!({"a": 1});
        assert!(apply_operation(&mut doc, &Operation::remove(path("/b"), None)).is_err());
        assert!(apply_operation(&mut doc, &Operation::remove(path("/x/y"), None)).is_err());
        assert!(apply_operation(&mut doc, &Operation::remove(vec![], None)).is_err());
    }

    #[test]
    fn apply_operations_stops_on_error() {
        let doc = json!({"a": 1});
        let ops = vec![
            Operation::add(path("/b"), json!(2)),
            Operation::remove(path("/zzz"), None),
        ];
        assert!(apply_operations(&doc, &ops).is_err());
        let ok = apply_operations(&doc, &ops[..1]).unwrap();
        assert_eq!(ok, json!({"a": 1, "b": 2}));
        assert_eq!(doc, json!({"a": 1}));
    }
}
