//! Proposals: a diff split into applicable operations and lock conflicts.

pub mod builder;
pub mod lifecycle;
pub mod summary;
pub mod types;

pub use builder::{conflict_message, ProposalBuilder, ProposalConfig, ProposalRequest};
pub use lifecycle::{assert_no_conflicts, check_proposal_validity, ensure_proposal_valid, ProposalValidity};
pub use summary::{summarize, ProposalSummary, SectionSummary, ROOT_SECTION};
pub use types::{Conflict, Proposal, ProposalStatus};
