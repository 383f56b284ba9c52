//! Entity-kind registry of lock extractors.

use std::collections::HashMap;

use serde_json::Value;

use super::extract::{
    CompositeExtractor, FieldShapeExtractor, LockExtractor, ManualFlagExtractor, SideTableExtractor,
};
use super::types::LockMeta;

struct KindEntry {
    extractor: Box<dyn LockExtractor>,
    system_locked_paths: Vec<String>,
}

/// Maps entity kinds to extraction rules.
///
/// Kinds without a registered extractor use the generic conventions:
/// `{value, meta}` fields, `isManual` array items, and a dotted-name
/// provenance side table when one is supplied.
pub struct ExtractorRegistry {
    kinds: HashMap<String, KindEntry>,
    fallback: Box<dyn LockExtractor>,
    global_system_paths: Vec<String>,
}

/// The generic extractor used for unregistered kinds.
pub fn generic_extractor() -> CompositeExtractor {
    CompositeExtractor::new()
        .with(FieldShapeExtractor::default())
        .with(ManualFlagExtractor)
        .with(SideTableExtractor::default())
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self {
            kinds: HashMap::new(),
            fallback: Box::new(generic_extractor()),
            global_system_paths: Vec::new(),
        }
    }
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the extractor for `kind`, replacing any previous one.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        extractor: impl LockExtractor + 'static,
    ) -> &mut Self {
        let kind = kind.into();
        let system_locked_paths = self
            .kinds
            .remove(&kind)
            .map(|entry| entry.system_locked_paths)
            .unwrap_or_default();
        self.kinds.insert(
            kind,
            KindEntry {
                extractor: Box::new(extractor),
                system_locked_paths,
            },
        );
        self
    }

    /// System-locked patterns for one kind. Registers the generic extractor
    /// for the kind if none is registered yet.
    pub fn system_locked(
        &mut self,
        kind: impl Into<String>,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        let entry = self.kinds.entry(kind.into()).or_insert_with(|| KindEntry {
            extractor: Box::new(generic_extractor()),
            system_locked_paths: Vec::new(),
        });
        entry
            .system_locked_paths
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// System-locked patterns applied to every kind.
    pub fn global_system_locked(
        &mut self,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.global_system_paths
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Compute the lock snapshot for an entity.
    pub fn build_lock_meta(&self, kind: &str, entity: &Value, provenance: Option<&Value>) -> LockMeta {
        let mut meta = LockMeta::new(kind);
        let extractor = match self.kinds.get(kind) {
            Some(entry) => {
                meta.system_locked_paths
                    .extend(entry.system_locked_paths.iter().cloned());
                entry.extractor.as_ref()
            }
            None => self.fallback.as_ref(),
        };
        meta.system_locked_paths
            .extend(self.global_system_paths.iter().cloned());
        extractor.extract(entity, provenance, &mut meta);
        tracing::debug!(
            entity_kind = %kind,
            locked = meta.locked_count(),
            system_patterns = meta.system_locked_paths.len(),
            "built lock metadata"
        );
        meta
    }
}

/// Compute the lock snapshot for an entity using the generic conventions.
pub fn build_lock_meta(kind: &str, entity: &Value, provenance: Option<&Value>) -> LockMeta {
    ExtractorRegistry::default().build_lock_meta(kind, entity, provenance)
}
