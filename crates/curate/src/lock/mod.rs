//! Field locks: which paths of a document automated writes may not touch.

pub mod evaluator;
pub mod extract;
pub mod registry;
pub mod types;

pub use evaluator::{is_locked, lock_status, LockEvaluator};
pub use extract::{
    is_value_meta_field, visit_fields, CompositeExtractor, DefaultPolicy, FieldProvenance,
    FieldShapeExtractor, LockExtractor, ManualFlagExtractor, ProvenancePolicy, ProvenanceSource,
    SideTableExtractor,
};
pub use registry::{build_lock_meta, generic_extractor, ExtractorRegistry};
pub use types::{LockMeta, LockReason, LockStatus};
