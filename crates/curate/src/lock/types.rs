//! Lock status and lock metadata types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a path is write-protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    UserConfirmed,
    UserSet,
    ManualEntry,
    LabConfirmed,
    /// System-managed path; cannot be overridden.
    Immutable,
}

impl LockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockReason::UserConfirmed => "user_confirmed",
            LockReason::UserSet => "user_set",
            LockReason::ManualEntry => "manual_entry",
            LockReason::LabConfirmed => "lab_confirmed",
            LockReason::Immutable => "immutable",
        }
    }

    /// Human-facing description used in conflict messages.
    pub fn describe(&self) -> &'static str {
        match self {
            LockReason::UserConfirmed => "confirmed by user",
            LockReason::UserSet => "set by user",
            LockReason::ManualEntry => "manually entered",
            LockReason::LabConfirmed => "confirmed by lab",
            LockReason::Immutable => "system-managed field",
        }
    }
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock state of a single path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<LockReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
}

impl LockStatus {
    pub fn unlocked() -> Self {
        Self {
            locked: false,
            reason: None,
            confirmed_value: None,
            locked_at: None,
            locked_by: None,
        }
    }

    pub fn locked(reason: LockReason) -> Self {
        Self {
            locked: true,
            reason: Some(reason),
            ..Self::unlocked()
        }
    }

    pub fn with_confirmed_value(mut self, value: Value) -> Self {
        self.confirmed_value = Some(value);
        self
    }

    pub fn with_locked_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.locked_at = at;
        self
    }

    pub fn with_locked_by(mut self, by: Option<String>) -> Self {
        self.locked_by = by;
        self
    }

    /// Status inherited by a descendant of a locked path.
    pub fn inherited(&self) -> Self {
        Self {
            locked: true,
            reason: self.reason,
            confirmed_value: None,
            locked_at: self.locked_at,
            locked_by: self.locked_by.clone(),
        }
    }
}

/// Snapshot of an entity's lock state, computed once per evaluation.
///
/// Keys of `locked_paths` are canonical path strings (`/a/b`, root `""`).
/// `system_locked_paths` holds wildcard patterns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockMeta {
    pub entity_kind: String,
    #[serde(default)]
    pub locked_paths: BTreeMap<String, LockStatus>,
    #[serde(default)]
    pub system_locked_paths: Vec<String>,
}

impl LockMeta {
    pub fn new(entity_kind: impl Into<String>) -> Self {
        Self {
            entity_kind: entity_kind.into(),
            ..Self::default()
        }
    }

    /// Record a status for `path`, normalising the key.
    pub fn set(&mut self, path: &str, status: LockStatus) {
        self.locked_paths
            .insert(curate_pointer::normalize_path(path), status);
    }

    /// Record a status for a parsed path.
    pub fn set_path(&mut self, path: &[String], status: LockStatus) {
        self.locked_paths
            .insert(curate_pointer::format_path(path), status);
    }

    /// Builder form of [`LockMeta::set`].
    pub fn with_lock(mut self, path: &str, status: LockStatus) -> Self {
        self.set(path, status);
        self
    }

    pub fn with_system_locked(mut self, pattern: impl Into<String>) -> Self {
        self.system_locked_paths.push(pattern.into());
        self
    }

    /// Number of explicitly locked entries.
    pub fn locked_count(&self) -> usize {
        self.locked_paths.values().filter(|s| s.locked).count()
    }

    /// Fold another snapshot's entries into this one. Existing entries win.
    pub fn merge(&mut self, other: LockMeta) {
        for (path, status) in other.locked_paths {
            self.locked_paths.entry(path).or_insert(status);
        }
        for pattern in other.system_locked_paths {
            if !self.system_locked_paths.contains(&pattern) {
                self.system_locked_paths.push(pattern);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reason_wire_names() {
        assert_eq!(serde_json::to_value(LockReason::UserConfirmed).unwrap(), json!("user_confirmed"));
        assert_eq!(LockReason::LabConfirmed.to_string(), "lab_confirmed");
        assert_eq!(LockReason::UserConfirmed.describe(), "confirmed by user");
    }

    #[test]
    fn status_wire_form() {
        let s = LockStatus::locked(LockReason::UserSet)
            .with_confirmed_value(json!("Acme"))
            .with_locked_by(Some("u1".into()));
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({"locked": true, "reason": "user_set", "confirmedValue": "Acme", "lockedBy": "u1"})
        );
        assert_eq!(serde_json::to_value(LockStatus::unlocked()).unwrap(), json!({"locked": false}));
    }

    #[test]
    fn set_normalises_keys() {
        let mut meta = LockMeta::new("profile");
        meta.set("a/b", LockStatus::locked(LockReason::UserSet));
        meta.set("/", LockStatus::locked(LockReason::Immutable));
        assert!(meta.locked_paths.contains_key("/a/b"));
        assert!(meta.locked_paths.contains_key(""));
        assert_eq!(meta.locked_count(), 2);
    }

    #[test]
    fn inherited_drops_confirmed_value() {
        let s = LockStatus::locked(LockReason::LabConfirmed).with_confirmed_value(json!(1));
        let child = s.inherited();
        assert!(child.locked);
        assert_eq!(child.reason, Some(LockReason::LabConfirmed));
        assert_eq!(child.confirmed_value, None);
    }

    #[test]
    fn merge_keeps_existing() {
        let mut a = LockMeta::new("k").with_lock("/x", LockStatus::locked(LockReason::UserSet));
        let b = LockMeta::new("k")
            .with_lock("/x", LockStatus::unlocked())
            .with_lock("/y", LockStatus::locked(LockReason::ManualEntry))
            .with_system_locked("/id");
        a.merge(b);
        assert!(a.locked_paths["/x"].locked);
        assert!(a.locked_paths["/y"].locked);
        assert_eq!(a.system_locked_paths, vec!["/id"]);
    }
}
