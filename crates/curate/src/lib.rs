//! Lock-aware write mediation for curated JSON documents.
//!
//! Automated generators produce candidate documents; this crate decides
//! which of their changes may reach the canonical document. The pipeline:
//!
//! 1. [`patch_diff::diff`] computes add/remove/replace operations between
//!    the canonical document and a candidate.
//! 2. [`lock`] computes which paths are write-protected from per-field
//!    provenance and answers lock queries, including ancestor propagation
//!    and wildcard system patterns.
//! 3. [`proposal`] splits the diff into an applicable patch and conflicts.
//! 4. [`apply`] applies an accepted selection, re-checking locks, and mints
//!    a new [`revision`] id.
//!
//! Everything is synchronous and side-effect-free; loading and persisting
//! documents is the caller's job.
//!
//! # Example
//!
//! ```
//! use curate::api::{apply_user_accepted_proposal, compute_proposal_for_ai, AcceptRequest};
//! use curate::lock::{LockMeta, LockReason, LockStatus};
//! use curate::proposal::ProposalRequest;
//! use serde_json::json;
//!
//! let base = json!({"name": "Acme", "size": 10});
//! let candidate = json!({"name": "Acme Inc", "size": 12});
//! let meta = LockMeta::new("company")
//!     .with_lock("/name", LockStatus::locked(LockReason::UserConfirmed));
//!
//! let request = ProposalRequest {
//!     base_revision_id: "lq0x1-abcdefgh".into(),
//!     ..Default::default()
//! };
//! let computed = compute_proposal_for_ai(&base, &candidate, &meta, &request);
//! assert_eq!(computed.applicable_count, 1);
//! assert_eq!(computed.conflict_count, 1);
//!
//! let accept = AcceptRequest::new(&base, &computed.proposal, "lq0x1-abcdefgh", "user-1");
//! let result = apply_user_accepted_proposal(accept);
//! assert_eq!(result.updated_state, Some(json!({"name": "Acme", "size": 12})));
//! ```

pub mod api;
pub mod apply;
pub mod contract;
pub mod lock;
pub mod patch;
pub mod patch_diff;
pub mod proposal;
pub mod revision;

pub use api::{
    apply_user_accepted_proposal, build_lock_meta, compute_proposal_for_ai,
    preview_proposal_application, AcceptRequest, ComputedProposal,
};
pub use apply::{ApplyResult, SkipReason, SkippedOperation};
pub use contract::{ViolationKind, WriteContractViolation};
pub use lock::{LockMeta, LockReason, LockStatus};
pub use patch::{Operation, Path};
pub use proposal::{Conflict, Proposal, ProposalStatus};
