//! Core types for patch operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use curate_pointer::Path;
use curate_pointer::PointerError;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error("INVALID_TARGET: {0}")]
    InvalidTarget(String),
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
}

impl From<PointerError> for PatchError {
    fn from(err: PointerError) -> Self {
        match err {
            PointerError::InvalidIndex(step) => PatchError::InvalidIndex(step),
            PointerError::NotFound => PatchError::NotFound(String::new()),
            other => PatchError::InvalidOp(other.to_string()),
        }
    }
}

// ── Operation ─────────────────────────────────────────────────────────────

/// A single add/remove/replace instruction.
///
/// `old_value` is carried for display only; applying never reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Add {
        #[serde(with = "path_string")]
        path: Path,
        value: Value,
    },
    Remove {
        #[serde(with = "path_string")]
        path: Path,
        #[serde(rename = "oldValue", default, skip_serializing_if = "Option::is_none")]
        old_value: Option<Value>,
    },
    Replace {
        #[serde(with = "path_string")]
        path: Path,
        value: Value,
        #[serde(rename = "oldValue", default, skip_serializing_if = "Option::is_none")]
        old_value: Option<Value>,
    },
}

/// The three operation kinds, without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Add,
    Remove,
    Replace,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Replace => "replace",
        }
    }

    /// Verb used in human-facing conflict messages.
    pub fn verb(&self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Replace => "change",
        }
    }
}

impl Operation {
    pub fn add(path: Path, value: Value) -> Self {
        Operation::Add { path, value }
    }

    pub fn remove(path: Path, old_value: Option<Value>) -> Self {
        Operation::Remove { path, old_value }
    }

    pub fn replace(path: Path, value: Value, old_value: Option<Value>) -> Self {
        Operation::Replace { path, value, old_value }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Add { .. } => OpKind::Add,
            Operation::Remove { .. } => OpKind::Remove,
            Operation::Replace { .. } => OpKind::Replace,
        }
    }

    /// Returns the operation name string.
    pub fn op_name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn path(&self) -> &Path {
        match self {
            Operation::Add { path, .. }
            | Operation::Remove { path, .. }
            | Operation::Replace { path, .. } => path,
        }
    }

    /// The path in string form (`/a/b`).
    pub fn pointer(&self) -> String {
        curate_pointer::format_path(self.path())
    }

    /// The value written by this operation, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Operation::Add { value, .. } | Operation::Replace { value, .. } => Some(value),
            Operation::Remove { .. } => None,
        }
    }

    pub fn old_value(&self) -> Option<&Value> {
        match self {
            Operation::Remove { old_value, .. } | Operation::Replace { old_value, .. } => {
                old_value.as_ref()
            }
            Operation::Add { .. } => None,
        }
    }
}

/// Serde adapter storing a [`Path`] as its string form.
pub(crate) mod path_string {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Path;

    pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&curate_pointer::format_path(path))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Path, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(curate_pointer::parse_path(&s))
    }
}
