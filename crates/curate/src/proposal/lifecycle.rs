//! Proposal lifecycle: status transitions and validity checks.
//!
//! Proposals are never changed in place. Every transition returns a new
//! record and refuses to leave a terminal state. Expiry is evaluated lazily
//! against the clock passed in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::apply::ApplyResult;
use crate::contract::WriteContractViolation;

use super::types::{Proposal, ProposalStatus};

impl Proposal {
    /// A copy of this proposal moved to `next`, stamped as reviewed at `at`.
    pub fn transition(
        &self,
        next: ProposalStatus,
        at: DateTime<Utc>,
    ) -> Result<Proposal, WriteContractViolation> {
        if !self.status.can_transition_to(next) {
            return Err(WriteContractViolation::invalid_proposal(format!(
                "Proposal {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        tracing::info!(proposal_id = %self.id, from = %self.status, to = %next, "proposal transition");
        Ok(Proposal {
            status: next,
            reviewed_at: Some(at),
            ..self.clone()
        })
    }

    /// Reject every applicable path.
    pub fn reject(&self, at: DateTime<Utc>) -> Result<Proposal, WriteContractViolation> {
        let mut next = self.transition(ProposalStatus::Rejected, at)?;
        next.accepted_paths = Some(Vec::new());
        next.rejected_paths = Some(self.patch_paths());
        Ok(next)
    }

    /// Mark as replaced by a newer proposal for the same entity.
    pub fn supersede(&self, at: DateTime<Utc>) -> Result<Proposal, WriteContractViolation> {
        self.transition(ProposalStatus::Superseded, at)
    }

    /// Mark as expired, if the expiry time has passed.
    pub fn expire(&self, now: DateTime<Utc>) -> Result<Proposal, WriteContractViolation> {
        if !self.is_expired_at(now) {
            return Err(WriteContractViolation::invalid_proposal(format!(
                "Proposal {} does not expire until {}",
                self.id,
                self.expires_at.to_rfc3339()
            )));
        }
        self.transition(ProposalStatus::Expired, now)
    }

    /// Record the outcome of applying this proposal.
    ///
    /// All applied ⇒ `accepted`; nothing applied ⇒ `rejected`; otherwise
    /// `partially_accepted`. Skipped paths are recorded as rejected.
    pub fn resolve(
        &self,
        result: &ApplyResult,
        at: DateTime<Utc>,
    ) -> Result<Proposal, WriteContractViolation> {
        let status = if result.skipped.is_empty() {
            ProposalStatus::Accepted
        } else if result.applied.is_empty() {
            ProposalStatus::Rejected
        } else {
            ProposalStatus::PartiallyAccepted
        };
        let mut next = self.transition(status, at)?;
        next.accepted_paths = Some(result.applied.clone());
        next.rejected_paths = Some(result.skipped.iter().map(|s| s.path.clone()).collect());
        Ok(next)
    }
}

// ── Validity ──────────────────────────────────────────────────────────────

/// Outcome of a non-failing validity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalValidity {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A proposal is valid while it is pending and not yet expired.
pub fn check_proposal_validity(proposal: &Proposal, now: DateTime<Utc>) -> ProposalValidity {
    let reason = if proposal.status != ProposalStatus::Pending {
        Some(format!("Proposal is already {}", proposal.status))
    } else if proposal.is_expired_at(now) {
        Some(format!("Proposal expired at {}", proposal.expires_at.to_rfc3339()))
    } else {
        None
    };
    ProposalValidity {
        valid: reason.is_none(),
        reason,
    }
}

/// Fail-fast form of [`check_proposal_validity`].
pub fn ensure_proposal_valid(
    proposal: &Proposal,
    now: DateTime<Utc>,
) -> Result<(), WriteContractViolation> {
    match check_proposal_validity(proposal, now).reason {
        None => Ok(()),
        Some(reason) => Err(WriteContractViolation::invalid_proposal(format!(
            "Proposal is no longer valid: {reason}"
        ))),
    }
}

/// Fail with `LOCKED_FIELD` when the proposal carries any conflict.
pub fn assert_no_conflicts(proposal: &Proposal) -> Result<(), WriteContractViolation> {
    if proposal.conflicts.is_empty() {
        return Ok(());
    }
    Err(WriteContractViolation::locked_fields(proposal.conflicts.clone()))
}
