//! Proposal records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lock::LockStatus;
use crate::patch::types::path_string;
use crate::patch::{Operation, Path};

use super::summary::ProposalSummary;

// ── Status ────────────────────────────────────────────────────────────────

/// Review state of a proposal. Every state but `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    PartiallyAccepted,
    Rejected,
    Expired,
    Superseded,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::PartiallyAccepted => "partially_accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
            ProposalStatus::Superseded => "superseded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }

    /// Transitions only ever leave `Pending`.
    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        *self == ProposalStatus::Pending && next != ProposalStatus::Pending
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Conflict ──────────────────────────────────────────────────────────────

/// A diff operation withheld from the patch because its path is locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    #[serde(with = "path_string")]
    pub path: Path,
    pub operation: Operation,
    pub lock_status: LockStatus,
    pub message: String,
}

// ── Proposal ──────────────────────────────────────────────────────────────

/// A reviewable, time-boxed bundle of changes for one entity.
///
/// `patch` and `conflicts` partition the underlying diff: every operation in
/// `patch` was unlocked when the proposal was built, every conflict locked.
/// Path lists (`accepted_paths`, `rejected_paths`) hold canonical path
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub scope_id: String,
    pub entity_kind: String,
    pub entity_id: String,
    pub patch: Vec<Operation>,
    pub conflicts: Vec<Conflict>,
    pub summary: ProposalSummary,
    pub base_revision_id: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_paths: Option<Vec<String>>,
}

impl Proposal {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Path strings of the applicable operations, in patch order.
    pub fn patch_paths(&self) -> Vec<String> {
        self.patch.iter().map(Operation::pointer).collect()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_value(ProposalStatus::PartiallyAccepted).unwrap(),
            json!("partially_accepted")
        );
        assert_eq!(ProposalStatus::Superseded.to_string(), "superseded");
    }

    #[test]
    fn transitions_leave_pending_only() {
        use ProposalStatus::*;
        let all = [Pending, Accepted, PartiallyAccepted, Rejected, Expired, Superseded];
        for next in all {
            assert_eq!(Pending.can_transition_to(next), next != Pending);
        }
        for from in &all[1..] {
            assert!(from.is_terminal());
            assert!(all.iter().all(|next| !from.can_transition_to(*next)));
        }
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn conflict_wire_form() {
        let conflict = Conflict {
            path: vec!["a".into(), "value".into()],
            operation: Operation::replace(vec!["a".into(), "value".into()], json!(2), Some(json!(1))),
            lock_status: LockStatus::locked(crate::lock::LockReason::UserConfirmed),
            message: "locked".into(),
        };
        let wire = serde_json::to_value(&conflict).unwrap();
        assert_eq!(wire["path"], json!("/a/value"));
        assert_eq!(wire["operation"]["op"], json!("replace"));
        assert_eq!(wire["lockStatus"]["reason"], json!("user_confirmed"));
        let back: Conflict = serde_json::from_value(wire).unwrap();
        assert_eq!(back, conflict);
    }
}
