//! Write-contract violations.
//!
//! A violation is the fail-fast error for call sites that must stop
//! immediately: stale revisions, attempts to push conflicting proposals,
//! malformed operations, and proposals that are no longer valid. It
//! serialises as `{type, message, conflicts, baseRevisionId?, currentRevisionId?}`
//! so it can cross a transport boundary unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proposal::types::Conflict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    StaleRevision,
    LockedField,
    InvalidOperation,
    InvalidProposal,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::StaleRevision => "STALE_REVISION",
            ViolationKind::LockedField => "LOCKED_FIELD",
            ViolationKind::InvalidOperation => "INVALID_OPERATION",
            ViolationKind::InvalidProposal => "INVALID_PROPOSAL",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct WriteContractViolation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub message: String,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_revision_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_revision_id: Option<String>,
}

impl WriteContractViolation {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            conflicts: Vec::new(),
            base_revision_id: None,
            current_revision_id: None,
        }
    }

    pub fn stale_revision(base: &str, current: &str, message: impl Into<String>) -> Self {
        Self {
            base_revision_id: Some(base.to_string()),
            current_revision_id: Some(current.to_string()),
            ..Self::new(ViolationKind::StaleRevision, message)
        }
    }

    pub fn locked_fields(conflicts: Vec<Conflict>) -> Self {
        let message = match conflicts.len() {
            1 => "1 field is locked".to_string(),
            n => format!("{n} fields are locked"),
        };
        Self {
            conflicts,
            ..Self::new(ViolationKind::LockedField, message)
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::InvalidOperation, message)
    }

    pub fn invalid_proposal(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::InvalidProposal, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stale_revision_wire_form() {
        let v = WriteContractViolation::stale_revision("a-1", "b-2", "Document changed");
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({
                "type": "STALE_REVISION",
                "message": "Document changed",
                "conflicts": [],
                "baseRevisionId": "a-1",
                "currentRevisionId": "b-2",
            })
        );
        assert_eq!(v.to_string(), "STALE_REVISION: Document changed");
    }

    #[test]
    fn decodes_without_optional_fields() {
        let v: WriteContractViolation =
            serde_json::from_value(json!({"type": "INVALID_OPERATION", "message": "bad"})).unwrap();
        assert_eq!(v, WriteContractViolation::invalid_operation("bad"));
    }

    #[test]
    fn locked_fields_message_counts() {
        assert_eq!(WriteContractViolation::locked_fields(vec![]).message, "0 fields are locked");
    }
}
