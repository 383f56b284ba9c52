//! Lock extraction: turning an entity and its provenance into a [`LockMeta`].
//!
//! Extraction is the pluggable point of lock evaluation. Every extractor
//! writes into the same `path -> LockStatus` map; the shape of the
//! provenance it reads differs per entity kind.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use curate_pointer::{get, Path};

use super::types::{LockMeta, LockReason, LockStatus};

/// Fills a [`LockMeta`] from an entity and optional provenance side data.
pub trait LockExtractor: Send + Sync {
    fn extract(&self, entity: &Value, provenance: Option<&Value>, meta: &mut LockMeta);
}

// ── Provenance ────────────────────────────────────────────────────────────

/// Where a field's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvenanceSource {
    User,
    Manual,
    Lab,
    Imported,
    Ai,
    Other(String),
}

impl ProvenanceSource {
    pub fn parse(s: &str) -> Self {
        match s {
            "user" => ProvenanceSource::User,
            "manual" => ProvenanceSource::Manual,
            "lab" => ProvenanceSource::Lab,
            "imported" => ProvenanceSource::Imported,
            "ai" => ProvenanceSource::Ai,
            other => ProvenanceSource::Other(other.to_string()),
        }
    }
}

/// Per-field provenance record.
///
/// Read leniently: unknown or mistyped members are ignored individually so
/// that one bad timestamp does not discard the source.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldProvenance {
    pub source: Option<ProvenanceSource>,
    pub needs_review: bool,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

fn read_time(map: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = map.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

fn read_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)?.as_str().map(str::to_string)
}

fn read_bool(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

impl FieldProvenance {
    pub fn from_meta(meta: &Map<String, Value>) -> Self {
        Self {
            source: meta
                .get("source")
                .and_then(Value::as_str)
                .map(ProvenanceSource::parse),
            needs_review: read_bool(meta, "needsReview"),
            confirmed: read_bool(meta, "confirmed"),
            confirmed_at: read_time(meta, "confirmedAt"),
            confirmed_by: read_string(meta, "confirmedBy"),
            updated_at: read_time(meta, "updatedAt"),
            updated_by: read_string(meta, "updatedBy"),
        }
    }
}

/// Decides the lock status of a field from its provenance.
pub trait ProvenancePolicy: Send + Sync {
    /// `None` means the field is not locked.
    fn evaluate(&self, provenance: &FieldProvenance) -> Option<LockStatus>;
}

/// `user` and `manual` sources always lock; `lab` and `imported` lock
/// unless flagged for review; everything else stays writable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl ProvenancePolicy for DefaultPolicy {
    fn evaluate(&self, prov: &FieldProvenance) -> Option<LockStatus> {
        let reason = match prov.source.as_ref()? {
            ProvenanceSource::User if prov.confirmed || prov.confirmed_at.is_some() => {
                LockReason::UserConfirmed
            }
            ProvenanceSource::User => LockReason::UserSet,
            ProvenanceSource::Manual => LockReason::ManualEntry,
            ProvenanceSource::Lab if !prov.needs_review => LockReason::LabConfirmed,
            ProvenanceSource::Imported if !prov.needs_review => LockReason::ManualEntry,
            _ => return None,
        };
        Some(
            LockStatus::locked(reason)
                .with_locked_at(prov.confirmed_at.or(prov.updated_at))
                .with_locked_by(prov.confirmed_by.clone().or_else(|| prov.updated_by.clone())),
        )
    }
}

// ── Field visitor ─────────────────────────────────────────────────────────

/// The generic field shape: an object with a `value` member and an object
/// `meta` member.
pub fn is_value_meta_field(node: &Value) -> bool {
    node.as_object().is_some_and(|obj| {
        obj.contains_key("value") && obj.get("meta").is_some_and(Value::is_object)
    })
}

/// Walk `root`, calling `visit` on every node for which `is_field` holds.
/// Field nodes are leaves: the walk does not descend into them.
pub fn visit_fields<F>(root: &Value, is_field: &dyn Fn(&Value) -> bool, visit: &mut F)
where
    F: FnMut(&[String], &Value),
{
    let mut path = Vec::new();
    walk(root, is_field, visit, &mut path);
}

fn walk<F>(node: &Value, is_field: &dyn Fn(&Value) -> bool, visit: &mut F, path: &mut Path)
where
    F: FnMut(&[String], &Value),
{
    if is_field(node) {
        visit(path.as_slice(), node);
        return;
    }
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key.clone());
                walk(child, is_field, visit, path);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(i.to_string());
                walk(child, is_field, visit, path);
                path.pop();
            }
        }
        _ => {}
    }
}

// ── Extractors ────────────────────────────────────────────────────────────

/// Generic `{value, meta}` convention: every field node is a leaf whose
/// `meta` decides its lock, recorded at the field's own path.
pub struct FieldShapeExtractor<P = DefaultPolicy> {
    is_field: fn(&Value) -> bool,
    policy: P,
}

impl Default for FieldShapeExtractor<DefaultPolicy> {
    fn default() -> Self {
        Self {
            is_field: is_value_meta_field,
            policy: DefaultPolicy,
        }
    }
}

impl<P: ProvenancePolicy> FieldShapeExtractor<P> {
    pub fn new(is_field: fn(&Value) -> bool, policy: P) -> Self {
        Self { is_field, policy }
    }
}

impl<P: ProvenancePolicy> LockExtractor for FieldShapeExtractor<P> {
    fn extract(&self, entity: &Value, _provenance: Option<&Value>, meta: &mut LockMeta) {
        visit_fields(entity, &self.is_field, &mut |path: &[String], node: &Value| {
            let Some(field_meta) = node.get("meta").and_then(Value::as_object) else {
                return;
            };
            let prov = FieldProvenance::from_meta(field_meta);
            if let Some(status) = self.policy.evaluate(&prov) {
                let value = node.get("value").cloned().unwrap_or(Value::Null);
                meta.set_path(path, status.with_confirmed_value(value));
            }
        });
    }
}

/// Array items flagged `isManual: true` are locked as manual entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualFlagExtractor;

fn is_manual_item(node: &Value) -> bool {
    node.get("isManual").and_then(Value::as_bool) == Some(true)
}

fn collect_manual(node: &Value, path: &mut Path, out: &mut Vec<(Path, Value)>) {
    match node {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(i.to_string());
                if is_manual_item(item) {
                    out.push((path.clone(), item.clone()));
                } else {
                    collect_manual(item, path, out);
                }
                path.pop();
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key.clone());
                collect_manual(child, path, out);
                path.pop();
            }
        }
        _ => {}
    }
}

impl LockExtractor for ManualFlagExtractor {
    fn extract(&self, entity: &Value, _provenance: Option<&Value>, meta: &mut LockMeta) {
        let mut found = Vec::new();
        collect_manual(entity, &mut Vec::new(), &mut found);
        for (path, item) in found {
            meta.set_path(&path, LockStatus::locked(LockReason::ManualEntry).with_confirmed_value(item));
        }
    }
}

/// Provenance kept in a side table keyed by dotted field name, e.g.
/// `{"profile.name": {"source": "user"}}`.
pub struct SideTableExtractor<P = DefaultPolicy> {
    policy: P,
}

impl Default for SideTableExtractor<DefaultPolicy> {
    fn default() -> Self {
        Self { policy: DefaultPolicy }
    }
}

impl<P: ProvenancePolicy> SideTableExtractor<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }
}

/// Convert a dotted field name into a path.
pub fn dotted_to_path(field: &str) -> Path {
    if field.is_empty() {
        return Vec::new();
    }
    field.split('.').map(str::to_string).collect()
}

impl<P: ProvenancePolicy> LockExtractor for SideTableExtractor<P> {
    fn extract(&self, entity: &Value, provenance: Option<&Value>, meta: &mut LockMeta) {
        let Some(table) = provenance.and_then(Value::as_object) else {
            return;
        };
        for (field, record) in table {
            let Some(record) = record.as_object() else {
                tracing::debug!(field = %field, "skipping non-object provenance record");
                continue;
            };
            let prov = FieldProvenance::from_meta(record);
            if let Some(mut status) = self.policy.evaluate(&prov) {
                let path = dotted_to_path(field);
                if let Some(current) = get(entity, &path) {
                    status = status.with_confirmed_value(current.clone());
                }
                meta.set_path(&path, status);
            }
        }
    }
}

/// Runs several extractors in order; earlier extractors win on overlap.
#[derive(Default)]
pub struct CompositeExtractor {
    parts: Vec<Box<dyn LockExtractor>>,
}

impl CompositeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, extractor: impl LockExtractor + 'static) -> Self {
        self.parts.push(Box::new(extractor));
        self
    }
}

impl LockExtractor for CompositeExtractor {
    fn extract(&self, entity: &Value, provenance: Option<&Value>, meta: &mut LockMeta) {
        for part in &self.parts {
            let mut partial = LockMeta::new(meta.entity_kind.clone());
            part.extract(entity, provenance, &mut partial);
            meta.merge(partial);
        }
    }
}
