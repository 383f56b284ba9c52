//! JSON codec for patch operations.
//!
//! Decoding is hand-rolled rather than derived so that malformed input
//! produces a specific `INVALID_OP` message per field.

use serde_json::{json, Value};

use super::types::{Operation, PatchError};

// ── Serialization ─────────────────────────────────────────────────────────

/// Serialize an [`Operation`] into `{op, path, value?, oldValue?}`.
pub fn to_json(op: &Operation) -> Value {
    let mut out = json!({
        "op": op.op_name(),
        "path": op.pointer(),
    });
    if let Value::Object(map) = &mut out {
        if let Some(value) = op.value() {
            map.insert("value".into(), value.clone());
        }
        if let Some(old) = op.old_value() {
            map.insert("oldValue".into(), old.clone());
        }
    }
    out
}

/// Serialize a list of operations into a JSON array.
pub fn to_json_patch(ops: &[Operation]) -> Value {
    Value::Array(ops.iter().map(to_json).collect())
}

// ── Deserialization ───────────────────────────────────────────────────────

fn decode_path(v: Option<&Value>) -> Result<Vec<String>, PatchError> {
    let s = v
        .and_then(Value::as_str)
        .ok_or_else(|| PatchError::InvalidOp("path must be a string".into()))?;
    curate_pointer::validate_pointer(s)?;
    let path = curate_pointer::parse_path(s);
    curate_pointer::validate_path(&path)?;
    Ok(path)
}

fn required_value(obj: &serde_json::Map<String, Value>, op: &str) -> Result<Value, PatchError> {
    obj.get("value")
        .cloned()
        .ok_or_else(|| PatchError::InvalidOp(format!("{op} requires a value")))
}

/// Deserialize one operation.
///
/// # Errors
///
/// [`PatchError::InvalidOp`] when the shape is not an add/remove/replace
/// object with a string path, or when `add`/`replace` lack a `value`.
pub fn from_json(v: &Value) -> Result<Operation, PatchError> {
    let obj = v
        .as_object()
        .ok_or_else(|| PatchError::InvalidOp("operation must be an object".into()))?;
    let name = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| PatchError::InvalidOp("missing op".into()))?;
    let path = decode_path(obj.get("path"))?;
    let old_value = obj.get("oldValue").filter(|v| !v.is_null()).cloned();
    match name {
        "add" => Ok(Operation::Add {
            path,
            value: required_value(obj, name)?,
        }),
        "remove" => Ok(Operation::Remove { path, old_value }),
        "replace" => Ok(Operation::Replace {
            path,
            value: required_value(obj, name)?,
            old_value,
        }),
        other => Err(PatchError::InvalidOp(format!("unsupported op: {other}"))),
    }
}

/// Deserialize a JSON array of operations.
pub fn from_json_patch(v: &Value) -> Result<Vec<Operation>, PatchError> {
    v.as_array()
        .ok_or_else(|| PatchError::InvalidOp("patch must be an array".into()))?
        .iter()
        .map(from_json)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_serde_form() {
        let op = Operation::replace(vec!["a".into()], json!(2), Some(json!(1)));
        assert_eq!(to_json(&op), serde_json::to_value(&op).unwrap());
    }

    #[test]
    fn decode_each_kind() {
        let ops = from_json_patch(&json!([
            {"op": "add", "path": "/a", "value": 1},
            {"op": "remove", "path": "/b", "oldValue": "x"},
            {"op": "replace", "path": "/c/0", "value": null},
        ]))
        .unwrap();
        assert_eq!(ops[0], Operation::add(vec!["a".into()], json!(1)));
        assert_eq!(ops[1], Operation::remove(vec!["b".into()], Some(json!("x"))));
        assert_eq!(ops[2], Operation::replace(vec!["c".into(), "0".into()], Value::Null, None));
    }

    #[test]
    fn decode_rejects_malformed() {
        let cases = [
            json!("add"),
            json!({"path": "/a"}),
            json!({"op": "add", "path": 3, "value": 1}),
            json!({"op": "add", "path": "/a"}),
            json!({"op": "replace", "path": "/a"}),
            json!({"op": "move", "path": "/a", "from": "/b"}),
        ];
        for case in cases {
            assert!(
                matches!(from_json(&case), Err(PatchError::InvalidOp(_))),
                "{case}"
            );
        }
    }

    #[test]
    fn decode_rejects_non_array_patch() {
        assert!(from_json_patch(&json!({})).is_err());
    }

    #[test]
    fn roundtrip_patch() {
        let ops = vec![
            Operation::add(vec!["x/y".into()], json!({"k": [1]})),
            Operation::remove(vec!["list".into(), "3".into()], Some(json!(4))),
        ];
        assert_eq!(from_json_patch(&to_json_patch(&ops)).unwrap(), ops);
    }
}
