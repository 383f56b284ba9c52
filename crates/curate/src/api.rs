//! Entry points for the surrounding system.
//!
//! These wrap the builder, evaluator and applicator with the checks a host
//! needs at its boundary: validity and revision checks before an accepted
//! proposal is applied, and shape validation of externally supplied
//! operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::apply::{apply_proposal, preview_proposal, ApplyProposalOptions, ApplyResult};
use crate::contract::WriteContractViolation;
use crate::lock::{ExtractorRegistry, LockMeta};
use crate::patch::{from_json_patch, Operation};
use crate::proposal::{check_proposal_validity, Proposal, ProposalBuilder, ProposalRequest};
use crate::revision::validate_revision;

/// A freshly built proposal plus the counts a caller usually branches on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedProposal {
    pub proposal: Proposal,
    pub has_conflicts: bool,
    pub applicable_count: usize,
    pub conflict_count: usize,
}

impl From<Proposal> for ComputedProposal {
    fn from(proposal: Proposal) -> Self {
        Self {
            has_conflicts: proposal.has_conflicts(),
            applicable_count: proposal.patch.len(),
            conflict_count: proposal.conflicts.len(),
            proposal,
        }
    }
}

/// Diff an AI-generated candidate against the canonical document.
pub fn compute_proposal_for_ai(
    base: &Value,
    candidate: &Value,
    meta: &LockMeta,
    request: &ProposalRequest,
) -> ComputedProposal {
    compute_proposal_with(&ProposalBuilder::default(), base, candidate, meta, request)
}

/// [`compute_proposal_for_ai`] with a configured builder.
pub fn compute_proposal_with(
    builder: &ProposalBuilder,
    base: &Value,
    candidate: &Value,
    meta: &LockMeta,
    request: &ProposalRequest,
) -> ComputedProposal {
    builder.build(base, candidate, meta, request).into()
}

/// A user's acceptance of (part of) a proposal.
#[derive(Debug, Clone)]
pub struct AcceptRequest<'a> {
    pub base: &'a Value,
    pub proposal: &'a Proposal,
    /// See [`ApplyProposalOptions::selected_paths`].
    pub selected_paths: Option<Vec<String>>,
    pub current_revision_id: &'a str,
    pub applied_by: &'a str,
    /// Fresh lock snapshot; when present every operation is re-checked.
    pub meta: Option<&'a LockMeta>,
    /// Apply even when the proposal's base revision is not current.
    pub override_revision_check: bool,
}

impl<'a> AcceptRequest<'a> {
    pub fn new(
        base: &'a Value,
        proposal: &'a Proposal,
        current_revision_id: &'a str,
        applied_by: &'a str,
    ) -> Self {
        Self {
            base,
            proposal,
            selected_paths: None,
            current_revision_id,
            applied_by,
            meta: None,
            override_revision_check: false,
        }
    }
}

pub fn apply_user_accepted_proposal(request: AcceptRequest<'_>) -> ApplyResult {
    apply_user_accepted_proposal_at(request, Utc::now())
}

/// Apply an accepted proposal, checking at `now` that it is still valid and
/// that it was built against the current revision.
///
/// A refused apply touches nothing: `success` is false, `applied` is empty,
/// no `updated_state` is produced, and the revision stays current.
pub fn apply_user_accepted_proposal_at(request: AcceptRequest<'_>, now: DateTime<Utc>) -> ApplyResult {
    let proposal = request.proposal;

    let validity = check_proposal_validity(proposal, now);
    if let Some(reason) = validity.reason {
        tracing::warn!(proposal_id = %proposal.id, reason = %reason, "refusing invalid proposal");
        let message = format!("Proposal is no longer valid: {reason}");
        return ApplyResult::refused(proposal, request.current_revision_id, &message);
    }

    if request.override_revision_check {
        tracing::info!(
            proposal_id = %proposal.id,
            applied_by = %request.applied_by,
            "revision check overridden"
        );
    } else if let Err(violation) =
        validate_revision(&proposal.base_revision_id, request.current_revision_id)
    {
        return ApplyResult::refused(proposal, request.current_revision_id, &violation.message);
    }

    tracing::info!(
        proposal_id = %proposal.id,
        entity_id = %proposal.entity_id,
        applied_by = %request.applied_by,
        "applying accepted proposal"
    );
    apply_proposal(
        request.base,
        proposal,
        ApplyProposalOptions {
            selected_paths: request.selected_paths,
            meta: request.meta,
            trust_proposal: false,
        },
    )
}

/// Lock snapshot for an entity under the generic extraction conventions.
pub fn build_lock_meta(entity_kind: &str, entity: &Value, provenance: Option<&Value>) -> LockMeta {
    ExtractorRegistry::default().build_lock_meta(entity_kind, entity, provenance)
}

pub fn preview_proposal_application(
    base: &Value,
    proposal: &Proposal,
    selected_paths: Option<&[String]>,
) -> Value {
    preview_proposal(base, proposal, selected_paths)
}

/// Decode and check externally supplied operations.
///
/// Malformed shapes and over-long paths are `INVALID_OPERATION` violations.
pub fn validate_operations(ops: &Value) -> Result<Vec<Operation>, WriteContractViolation> {
    from_json_patch(ops).map_err(|err| WriteContractViolation::invalid_operation(err.to_string()))
}
