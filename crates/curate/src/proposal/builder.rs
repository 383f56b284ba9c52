//! Building proposals from a base/candidate pair and a lock snapshot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lock::{LockEvaluator, LockMeta, LockStatus};
use crate::patch::Operation;
use crate::patch_diff::diff;

use super::summary::{summarize, ROOT_SECTION};
use super::types::{Conflict, Proposal, ProposalStatus};

// ── Configuration ─────────────────────────────────────────────────────────

/// Builder settings. Missing fields take their defaults when loaded from a
/// host configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProposalConfig {
    /// Lifetime of a new proposal.
    pub expires_in_days: u32,
    /// Maximum characters of a value quoted in a conflict message.
    pub display_value_limit: usize,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            expires_in_days: 7,
            display_value_limit: 50,
        }
    }
}

/// Identifiers and authorship for a new proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub scope_id: String,
    pub entity_id: String,
    pub base_revision_id: String,
    pub created_by: String,
    /// Overrides [`ProposalConfig::expires_in_days`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<u32>,
}

// ── Conflict messages ─────────────────────────────────────────────────────

fn display_value(value: &Value, limit: usize) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= limit {
        return text;
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

/// `Cannot {verb} "{field}" ({reason}). Current value: "{value}"`
///
/// The quoted value is the lock's confirmed value, else the operation's old
/// value; the clause is dropped when neither exists.
pub fn conflict_message(op: &Operation, status: &LockStatus, limit: usize) -> String {
    let field = match op.pointer() {
        p if p.is_empty() => ROOT_SECTION.to_string(),
        p => p,
    };
    let reason = status.reason.map(|r| r.describe()).unwrap_or("locked");
    let mut message = format!("Cannot {} \"{}\" ({}).", op.kind().verb(), field, reason);
    if let Some(current) = status.confirmed_value.as_ref().or(op.old_value()) {
        message.push_str(&format!(" Current value: \"{}\"", display_value(current, limit)));
    }
    message
}

/// `now` plus `days`, saturating at the latest representable instant.
fn expiry(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// ── Builder ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ProposalBuilder {
    config: ProposalConfig,
}

impl ProposalBuilder {
    pub fn new(config: ProposalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProposalConfig {
        &self.config
    }

    /// Split `candidate - base` into applicable operations and conflicts.
    ///
    /// Never fails: locked paths become [`Conflict`] entries.
    pub fn partition(
        &self,
        base: &Value,
        candidate: &Value,
        meta: &LockMeta,
    ) -> (Vec<Operation>, Vec<Conflict>) {
        let evaluator = LockEvaluator::new(meta);
        let mut patch = Vec::new();
        let mut conflicts = Vec::new();
        for op in diff(base, candidate) {
            let status = evaluator.status_of(op.path());
            if status.locked {
                conflicts.push(Conflict {
                    path: op.path().clone(),
                    message: conflict_message(&op, &status, self.config.display_value_limit),
                    lock_status: status,
                    operation: op,
                });
            } else {
                patch.push(op);
            }
        }
        (patch, conflicts)
    }

    pub fn build(
        &self,
        base: &Value,
        candidate: &Value,
        meta: &LockMeta,
        request: &ProposalRequest,
    ) -> Proposal {
        self.build_at(base, candidate, meta, request, Utc::now())
    }

    /// [`ProposalBuilder::build`] with an explicit creation time.
    pub fn build_at(
        &self,
        base: &Value,
        candidate: &Value,
        meta: &LockMeta,
        request: &ProposalRequest,
        now: DateTime<Utc>,
    ) -> Proposal {
        let (patch, conflicts) = self.partition(base, candidate, meta);
        let summary = summarize(&patch, &conflicts);
        let days = request.expires_in_days.unwrap_or(self.config.expires_in_days);
        let expires_at = expiry(now, days);
        let proposal = Proposal {
            id: uuid::Uuid::new_v4().to_string(),
            scope_id: request.scope_id.clone(),
            entity_kind: meta.entity_kind.clone(),
            entity_id: request.entity_id.clone(),
            patch,
            conflicts,
            summary,
            base_revision_id: request.base_revision_id.clone(),
            status: ProposalStatus::Pending,
            created_at: now,
            created_by: request.created_by.clone(),
            expires_at,
            reviewed_at: None,
            accepted_paths: None,
            rejected_paths: None,
        };
        tracing::info!(
            proposal_id = %proposal.id,
            entity_kind = %proposal.entity_kind,
            entity_id = %proposal.entity_id,
            applicable = proposal.patch.len(),
            conflicts = proposal.conflicts.len(),
            "built proposal"
        );
        proposal
    }
}
