//! Validation functions for paths.

use crate::PointerError;

/// Maximum allowed path string length.
const MAX_POINTER_LENGTH: usize = 1024;

/// Maximum allowed path depth.
const MAX_PATH_LENGTH: usize = 256;

/// Validate a path string.
///
/// # Errors
///
/// Returns [`PointerError::PointerTooLong`] if the string exceeds 1024 bytes.
///
/// ```
/// use curate_pointer::validate_pointer;
///
/// validate_pointer("").unwrap();
/// validate_pointer("/foo/bar").unwrap();
/// validate_pointer(&"/a".repeat(600)).unwrap_err();
/// ```
pub fn validate_pointer(pointer: &str) -> Result<(), PointerError> {
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(PointerError::PointerTooLong);
    }
    Ok(())
}

/// Validate a parsed path.
///
/// # Errors
///
/// Returns [`PointerError::PathTooLong`] above 256 segments.
pub fn validate_path(path: &[String]) -> Result<(), PointerError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(PointerError::PathTooLong);
    }
    Ok(())
}
