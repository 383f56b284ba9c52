//! Lock evaluation over a [`LockMeta`] snapshot.
//!
//! Precedence for a path P:
//! 1. a system pattern matching P or an ancestor of P (`immutable`);
//! 2. an explicit locked entry for P;
//! 3. the nearest strict ancestor of P whose entry is locked;
//! 4. an explicit unlocked entry for P;
//! 5. unlocked.
//!
//! A locked ancestor always wins over an unlocked entry below it.
//!
//! Explicit entries are indexed in a trie keyed by path segment, so lookup
//! is proportional to path depth rather than to the number of entries.

use std::collections::HashMap;

use curate_pointer::{parse_path, PathPattern, PatternSegment};

use super::types::{LockMeta, LockReason, LockStatus};

#[derive(Debug, Default)]
struct LockNode<'a> {
    status: Option<&'a LockStatus>,
    children: HashMap<String, LockNode<'a>>,
}

/// A [`LockMeta`] compiled for repeated queries.
#[derive(Debug)]
pub struct LockEvaluator<'a> {
    root: LockNode<'a>,
    system: Vec<PathPattern>,
}

fn compile_pattern(raw: &str) -> PathPattern {
    PathPattern::parse(raw).unwrap_or_else(|err| {
        // Unparseable patterns still protect their literal path.
        tracing::warn!(pattern = %raw, error = %err, "treating system lock pattern as literal");
        let literal = parse_path(raw)
            .into_iter()
            .map(PatternSegment::Literal)
            .collect::<Vec<_>>();
        PathPattern::from_segments(literal)
    })
}

impl<'a> LockEvaluator<'a> {
    pub fn new(meta: &'a LockMeta) -> Self {
        let mut root = LockNode::default();
        for (key, status) in &meta.locked_paths {
            let mut node = &mut root;
            for step in parse_path(key) {
                node = node.children.entry(step).or_default();
            }
            node.status = Some(status);
        }
        let system = meta
            .system_locked_paths
            .iter()
            .map(|raw| compile_pattern(raw))
            .collect();
        Self { root, system }
    }

    /// Lock status of `path`.
    pub fn status_of(&self, path: &[String]) -> LockStatus {
        if self.system.iter().any(|p| p.matches_within(path)) {
            return LockStatus::locked(LockReason::Immutable);
        }

        let mut node = &self.root;
        let mut nearest_locked: Option<&LockStatus> = None;
        for step in path {
            if let Some(status) = node.status.filter(|s| s.locked) {
                nearest_locked = Some(status);
            }
            match node.children.get(step) {
                Some(next) => node = next,
                None => {
                    return nearest_locked
                        .map(LockStatus::inherited)
                        .unwrap_or_else(LockStatus::unlocked);
                }
            }
        }

        match (node.status, nearest_locked) {
            (Some(exact), _) if exact.locked => exact.clone(),
            (_, Some(ancestor)) => ancestor.inherited(),
            (Some(exact), None) => exact.clone(),
            (None, None) => LockStatus::unlocked(),
        }
    }

    /// Lock status of a path given in string form.
    pub fn status_of_pointer(&self, pointer: &str) -> LockStatus {
        self.status_of(&parse_path(pointer))
    }

    pub fn is_locked(&self, path: &[String]) -> bool {
        self.status_of(path).locked
    }
}

/// Lock status of `path` under `meta`.
pub fn lock_status(path: &[String], meta: &LockMeta) -> LockStatus {
    LockEvaluator::new(meta).status_of(path)
}

/// Whether `path` is locked under `meta`.
pub fn is_locked(path: &[String], meta: &LockMeta) -> bool {
    lock_status(path, meta).locked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn p(s: &str) -> Vec<String> {
        parse_path(s)
    }

    #[test]
    fn unlocked_by_default() {
        let meta = LockMeta::new("k");
        assert_eq!(lock_status(&p("/a/b"), &meta), LockStatus::unlocked());
    }

    #[test]
    fn exact_entry_returned_verbatim() {
        let status = LockStatus::locked(LockReason::UserConfirmed).with_confirmed_value(json!(1));
        let meta = LockMeta::new("k").with_lock("/a/value", status.clone());
        assert_eq!(lock_status(&p("/a/value"), &meta), status);
        assert!(!is_locked(&p("/a"), &meta));
    }

    #[test]
    fn ancestor_lock_propagates() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let meta = LockMeta::new("k").with_lock(
            "/profile",
            LockStatus::locked(LockReason::LabConfirmed)
                .with_locked_at(Some(at))
                .with_locked_by(Some("lab-7".into())),
        );
        let s = lock_status(&p("/profile/address/city"), &meta);
        assert!(s.locked);
        assert_eq!(s.reason, Some(LockReason::LabConfirmed));
        assert_eq!(s.locked_at, Some(at));
        assert_eq!(s.locked_by.as_deref(), Some("lab-7"));
        assert!(!is_locked(&p("/profiles"), &meta));
    }

    #[test]
    fn nearest_locked_ancestor_wins() {
        let meta = LockMeta::new("k")
            .with_lock("/a", LockStatus::locked(LockReason::UserSet))
            .with_lock("/a/b", LockStatus::locked(LockReason::ManualEntry));
        assert_eq!(lock_status(&p("/a/b/c"), &meta).reason, Some(LockReason::ManualEntry));
        assert_eq!(lock_status(&p("/a/x"), &meta).reason, Some(LockReason::UserSet));
    }

    #[test]
    fn unlocked_ancestor_does_not_propagate() {
        let meta = LockMeta::new("k").with_lock("/a", LockStatus::unlocked());
        assert!(!is_locked(&p("/a/b"), &meta));
    }

    #[test]
    fn unlocked_entry_cannot_escape_locked_ancestor() {
        let meta = LockMeta::new("k")
            .with_lock("/a", LockStatus::locked(LockReason::UserConfirmed))
            .with_lock("/a/b", LockStatus::unlocked());
        let s = lock_status(&p("/a/b"), &meta);
        assert!(s.locked);
        assert_eq!(s.reason, Some(LockReason::UserConfirmed));
        assert!(is_locked(&p("/a/b/c"), &meta));

        let free = LockMeta::new("k").with_lock("/x", LockStatus::unlocked());
        assert_eq!(lock_status(&p("/x"), &free), LockStatus::unlocked());
    }

    #[test]
    fn root_lock_covers_everything() {
        let meta = LockMeta::new("k").with_lock("", LockStatus::locked(LockReason::UserSet));
        assert!(is_locked(&p("/anything/at/all"), &meta));
        assert!(is_locked(&[], &meta));
    }

    #[test]
    fn system_patterns_take_priority() {
        let meta = LockMeta::new("k")
            .with_lock("/id", LockStatus::unlocked())
            .with_system_locked("/id")
            .with_system_locked("/items/*/createdAt");
        assert_eq!(lock_status(&p("/id"), &meta).reason, Some(LockReason::Immutable));
        assert!(is_locked(&p("/id/part"), &meta));
        assert!(is_locked(&p("/items/4/createdAt"), &meta));
        assert!(!is_locked(&p("/items/4/name"), &meta));
    }

    #[test]
    fn invalid_system_pattern_locks_literal_path() {
        let meta = LockMeta::new("k").with_system_locked("/weird*key");
        assert!(is_locked(&vec!["weird*key".to_string()], &meta));
        assert!(!is_locked(&p("/weirdXkey"), &meta));
    }

    #[test]
    fn escaped_keys_resolve() {
        let meta = LockMeta::new("k").with_lock("/a~1b", LockStatus::locked(LockReason::UserSet));
        let evaluator = LockEvaluator::new(&meta);
        assert!(evaluator.is_locked(&vec!["a/b".to_string(), "c".to_string()]));
        assert!(!evaluator.is_locked(&p("/a/b/c")));
        assert!(evaluator.status_of_pointer("/a~1b").locked);
    }
}
