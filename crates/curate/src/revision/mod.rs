//! Revision identifiers for optimistic concurrency.
//!
//! A revision id is `<base36 creation millis>-<random base36 suffix>`. Ids
//! are ordered by their timestamp; two different ids minted in the same
//! millisecond are not comparable, and "not comparable" always counts as
//! stale.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::contract::WriteContractViolation;
use crate::proposal::types::Proposal;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 8;

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Mint a new revision id stamped with the current time.
pub fn generate_revision_id() -> String {
    generate_revision_id_at(Utc::now())
}

/// Mint a new revision id stamped with `at`.
pub fn generate_revision_id_at(at: DateTime<Utc>) -> String {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", to_base36(millis), suffix)
}

/// Decode the creation timestamp (millis since epoch) of a revision id.
pub fn decode_timestamp(id: &str) -> Option<i64> {
    let (stamp, suffix) = id.split_once('-')?;
    if stamp.is_empty() || suffix.is_empty() {
        return None;
    }
    i64::from_str_radix(stamp, 36).ok()
}

/// Compare two revision ids.
///
/// Equal strings are `Equal`. Otherwise ids order by timestamp. A timestamp
/// tie between different ids, or an undecodable id, returns `None`.
pub fn compare_revisions(a: &str, b: &str) -> Option<Ordering> {
    if a == b {
        return Some(Ordering::Equal);
    }
    match decode_timestamp(a)?.cmp(&decode_timestamp(b)?) {
        Ordering::Equal => None,
        ord => Some(ord),
    }
}

/// True when `base` is older than `current` or cannot be compared with it.
pub fn is_stale(base: &str, current: &str) -> bool {
    matches!(compare_revisions(base, current), Some(Ordering::Less) | None)
}

fn mismatch_message(base: &str, current: &str) -> String {
    if is_stale(base, current) {
        "The document has changed since this proposal was created. Re-run the comparison against the current version.".to_string()
    } else {
        "The proposal was created against a newer revision than the current document.".to_string()
    }
}

/// Fail-fast revision check: anything other than an exact match is a
/// `STALE_REVISION` violation.
pub fn validate_revision(base: &str, current: &str) -> Result<(), WriteContractViolation> {
    if base == current {
        return Ok(());
    }
    tracing::warn!(base_revision = %base, current_revision = %current, "revision mismatch");
    Err(WriteContractViolation::stale_revision(
        base,
        current,
        mismatch_message(base, current),
    ))
}

/// Outcome of a non-failing revision check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Graceful revision check for a proposal, for callers that report a
/// message instead of stopping.
pub fn validate_proposal_revision(proposal: &Proposal, current: &str) -> RevisionCheck {
    match validate_revision(&proposal.base_revision_id, current) {
        Ok(()) => RevisionCheck { valid: true, message: None },
        Err(violation) => RevisionCheck {
            valid: false,
            message: Some(violation.message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ViolationKind;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    #[test]
    fn generated_ids_decode_to_their_timestamp() {
        let id = generate_revision_id_at(at(1_700_000_000_123));
        assert_eq!(decode_timestamp(&id), Some(1_700_000_000_123));
        let (_, suffix) = id.split_once('-').unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn compare_by_timestamp() {
        let older = generate_revision_id_at(at(1_000));
        let newer = generate_revision_id_at(at(2_000));
        assert_eq!(compare_revisions(&older, &newer), Some(Ordering::Less));
        assert_eq!(compare_revisions(&newer, &older), Some(Ordering::Greater));
        assert_eq!(compare_revisions(&older, &older), Some(Ordering::Equal));
    }

    #[test]
    fn same_millis_different_suffix_is_not_comparable() {
        assert_eq!(compare_revisions("rs-aaaa", "rs-bbbb"), None);
        assert!(is_stale("rs-aaaa", "rs-bbbb"));
    }

    #[test]
    fn undecodable_is_not_comparable() {
        assert_eq!(compare_revisions("garbage", "rs-aaaa"), None);
        assert_eq!(compare_revisions("-x", "rs-aaaa"), None);
        assert!(is_stale("garbage", "rs-aaaa"));
    }

    #[test]
    fn stale_only_when_older_or_unknown() {
        assert!(is_stale("10-a", "20-a"));
        assert!(!is_stale("20-a", "10-a"));
        assert!(!is_stale("10-a", "10-a"));
    }

    #[test]
    fn validate_requires_exact_match() {
        assert!(validate_revision("10-a", "10-a").is_ok());
        let err = validate_revision("10-a", "20-b").unwrap_err();
        assert_eq!(err.kind, ViolationKind::StaleRevision);
        assert_eq!(err.base_revision_id.as_deref(), Some("10-a"));
        assert_eq!(err.current_revision_id.as_deref(), Some("20-b"));
        assert!(err.message.contains("changed"));

        let ahead = validate_revision("20-b", "10-a").unwrap_err();
        assert!(ahead.message.contains("newer revision"));
    }

    #[test]
    fn graceful_check_for_proposal() {
        use crate::lock::LockMeta;
        use crate::proposal::{ProposalBuilder, ProposalRequest};

        let request = ProposalRequest {
            base_revision_id: "10-a".into(),
            ..Default::default()
        };
        let proposal = ProposalBuilder::default().build(
            &serde_json::json!(1),
            &serde_json::json!(2),
            &LockMeta::new("k"),
            &request,
        );
        assert_eq!(
            validate_proposal_revision(&proposal, "10-a"),
            RevisionCheck { valid: true, message: None }
        );
        let stale = validate_proposal_revision(&proposal, "20-b");
        assert!(!stale.valid);
        assert!(stale.message.is_some_and(|m| m.contains("changed")));
    }
}
