//! Patch operations: `add`, `remove`, `replace` over JSON documents.
//!
//! Paths use the `curate_pointer` addressing scheme; `old_value` on
//! `remove`/`replace` is informational and ignored when applying.

pub mod apply;
pub mod codec;
pub mod types;

pub use apply::{apply_operation, apply_operations};
pub use codec::{from_json, from_json_patch, to_json, to_json_patch};
pub use types::{OpKind, Operation, Path, PatchError};
