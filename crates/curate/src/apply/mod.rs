//! Applying accepted operations onto a base document.
//!
//! Failures are isolated per operation: a locked or structurally invalid
//! operation is recorded as skipped and the rest still apply.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lock::{LockEvaluator, LockMeta};
use crate::patch::{apply_operation, Operation};
use crate::proposal::{conflict_message, Proposal, ProposalConfig};
use crate::revision::generate_revision_id;

// ── Types ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Locked,
    NotSelected,
    ValidationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOperation {
    pub path: String,
    pub reason: SkipReason,
    pub message: String,
}

impl SkippedOperation {
    fn new(op: &Operation, reason: SkipReason, message: impl Into<String>) -> Self {
        Self {
            path: op.pointer(),
            reason,
            message: message.into(),
        }
    }
}

/// Outcome of an apply. `applied` and `skipped` hold path strings in
/// operation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub success: bool,
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedOperation>,
    pub new_revision_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_state: Option<Value>,
}

impl ApplyResult {
    /// A result for an apply that was refused before any operation ran.
    /// Every patch path is reported as `validation_failed` with `message`.
    pub fn refused(proposal: &Proposal, current_revision_id: &str, message: &str) -> Self {
        Self {
            success: false,
            applied: Vec::new(),
            skipped: proposal
                .patch
                .iter()
                .map(|op| SkippedOperation::new(op, SkipReason::ValidationFailed, message))
                .collect(),
            new_revision_id: current_revision_id.to_string(),
            updated_state: None,
        }
    }
}

/// Options for [`apply_proposal`].
#[derive(Debug, Clone, Default)]
pub struct ApplyProposalOptions<'a> {
    /// Paths to apply; `None` applies the whole patch.
    ///
    /// Selection is by path, so every operation sharing a selected path is
    /// applied. An identity-array diff can emit a `remove` and an `add` at
    /// the same index; selecting that index selects both.
    pub selected_paths: Option<Vec<String>>,
    /// Fresh lock snapshot to re-validate against.
    pub meta: Option<&'a LockMeta>,
    /// Skip re-validation even when `meta` is given.
    pub trust_proposal: bool,
}

// ── Apply ─────────────────────────────────────────────────────────────────

fn selection(paths: Option<&[String]>) -> Option<HashSet<String>> {
    paths.map(|paths| paths.iter().map(|p| curate_pointer::normalize_path(p)).collect())
}

fn run<'o>(
    base: &Value,
    ops: impl IntoIterator<Item = &'o Operation>,
    evaluator: Option<&LockEvaluator<'_>>,
    mut skipped: Vec<SkippedOperation>,
) -> ApplyResult {
    let limit = ProposalConfig::default().display_value_limit;
    let mut doc = base.clone();
    let mut applied = Vec::new();
    let mut attempted = 0usize;

    for op in ops {
        attempted += 1;
        if let Some(evaluator) = evaluator {
            let status = evaluator.status_of(op.path());
            if status.locked {
                tracing::debug!(path = %op.pointer(), "operation newly locked");
                let message = conflict_message(op, &status, limit);
                skipped.push(SkippedOperation::new(op, SkipReason::Locked, message));
                continue;
            }
        }
        match apply_operation(&mut doc, op) {
            Ok(()) => applied.push(op.pointer()),
            Err(err) => {
                tracing::warn!(path = %op.pointer(), op = op.op_name(), error = %err, "operation failed");
                skipped.push(SkippedOperation::new(op, SkipReason::ValidationFailed, err.to_string()));
            }
        }
    }

    let result = ApplyResult {
        success: attempted == 0 || !applied.is_empty(),
        applied,
        skipped,
        new_revision_id: generate_revision_id(),
        updated_state: Some(doc),
    };
    tracing::info!(
        applied = result.applied.len(),
        skipped = result.skipped.len(),
        revision = %result.new_revision_id,
        "applied operations"
    );
    result
}

/// Apply a proposal's patch, or the selected part of it, onto a copy of
/// `base`.
///
/// Unselected paths are skipped as `not_selected`. With `meta` and without
/// `trust_proposal`, each remaining operation is re-checked against `meta`
/// and skipped as `locked` if it has become locked since the proposal was
/// built. A new revision id is always minted.
pub fn apply_proposal(base: &Value, proposal: &Proposal, options: ApplyProposalOptions<'_>) -> ApplyResult {
    let selected = selection(options.selected_paths.as_deref());
    let mut skipped = Vec::new();
    let mut chosen = Vec::with_capacity(proposal.patch.len());
    for op in &proposal.patch {
        match &selected {
            Some(set) if !set.contains(&op.pointer()) => {
                skipped.push(SkippedOperation::new(op, SkipReason::NotSelected, "Not selected"));
            }
            _ => chosen.push(op),
        }
    }

    let evaluator = match options.meta {
        Some(meta) if !options.trust_proposal => Some(LockEvaluator::new(meta)),
        _ => None,
    };
    tracing::debug!(
        proposal_id = %proposal.id,
        selected = chosen.len(),
        revalidate = evaluator.is_some(),
        "applying proposal"
    );
    run(base, chosen, evaluator.as_ref(), skipped)
}

/// Apply arbitrary operations outside the proposal flow, re-checking locks
/// when `meta` is given.
pub fn apply_patch(base: &Value, ops: &[Operation], meta: Option<&LockMeta>) -> ApplyResult {
    let evaluator = meta.map(LockEvaluator::new);
    run(base, ops, evaluator.as_ref(), Vec::new())
}

/// The document a proposal would produce, for display. Failing operations
/// are ignored and no revision is minted.
pub fn preview_proposal(base: &Value, proposal: &Proposal, selected_paths: Option<&[String]>) -> Value {
    let selected = selection(selected_paths);
    let mut doc = base.clone();
    for op in &proposal.patch {
        if selected.as_ref().is_some_and(|set| !set.contains(&op.pointer())) {
            continue;
        }
        if let Err(err) = apply_operation(&mut doc, op) {
            tracing::debug!(path = %op.pointer(), error = %err, "preview skipped operation");
        }
    }
    doc
}
