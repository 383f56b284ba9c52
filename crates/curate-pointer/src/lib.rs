//! Path addressing for curated JSON documents.
//!
//! Paths are JSON Pointer style strings (`/a/b/0`). Within a segment, `~0`
//! stands for `~` and `~1` for `/`. Unlike a strict RFC 6901 pointer, both
//! `""` and `"/"` address the document root.
//!
//! # Example
//!
//! ```
//! use curate_pointer::{parse_path, format_path, get};
//!
//! let path = parse_path("/profile/name");
//! assert_eq!(path, vec!["profile".to_string(), "name".to_string()]);
//! assert_eq!(format_path(&path), "/profile/name");
//!
//! let doc = serde_json::json!({"profile": {"name": "Acme"}});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!("Acme")));
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod pattern;
pub mod types;
pub mod validate;

pub use pattern::{PathPattern, PatternSegment};
pub use types::{Path, PathStep};
pub use validate::{validate_path, validate_pointer};

/// Unescapes a path segment: `~1` becomes `/`, `~0` becomes `~`.
///
/// ```
/// use curate_pointer::unescape_segment;
///
/// assert_eq!(unescape_segment("a~0b"), "a~b");
/// assert_eq!(unescape_segment("c~1d"), "c/d");
/// ```
pub fn unescape_segment(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    // ~1 first, so that "~01" stays "~1"
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escapes a path segment: `~` becomes `~0`, `/` becomes `~1`.
///
/// ```
/// use curate_pointer::escape_segment;
///
/// assert_eq!(escape_segment("a~b"), "a~0b");
/// assert_eq!(escape_segment("c/d"), "c~1d");
/// ```
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains('/') && !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace('~', "~0").replace('/', "~1")
}

/// Parse a path string into unescaped segments.
///
/// `""` and `"/"` are the root. A missing leading `/` is tolerated, so
/// `"a/b"` parses the same as `"/a/b"`.
///
/// ```
/// use curate_pointer::parse_path;
///
/// assert!(parse_path("").is_empty());
/// assert!(parse_path("/").is_empty());
/// assert_eq!(parse_path("/a~1b/0"), vec!["a/b", "0"]);
/// assert_eq!(parse_path("a/b"), vec!["a", "b"]);
/// ```
pub fn parse_path(pointer: &str) -> Path {
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('/').map(unescape_segment).collect()
}

/// Format segments into a path string. The root formats as `""`.
///
/// ```
/// use curate_pointer::format_path;
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&["a/b".to_string(), "0".to_string()]), "/a~1b/0");
/// ```
pub fn format_path(path: &[String]) -> String {
    let mut out = String::new();
    for segment in path {
        out.push('/');
        out.push_str(&escape_segment(segment));
    }
    out
}

/// Re-format a path string into its canonical form.
///
/// ```
/// use curate_pointer::normalize_path;
///
/// assert_eq!(normalize_path("/"), "");
/// assert_eq!(normalize_path("a/b"), "/a/b");
/// ```
pub fn normalize_path(pointer: &str) -> String {
    format_path(&parse_path(pointer))
}

/// Check if `ancestor` is a strict ancestor of `path`.
///
/// ```
/// use curate_pointer::{is_ancestor, parse_path};
///
/// assert!(is_ancestor(&parse_path("/a"), &parse_path("/a/b")));
/// assert!(is_ancestor(&parse_path(""), &parse_path("/a")));
/// assert!(!is_ancestor(&parse_path("/a"), &parse_path("/a")));
/// assert!(!is_ancestor(&parse_path("/a"), &parse_path("/ab")));
/// ```
pub fn is_ancestor(ancestor: &[String], path: &[String]) -> bool {
    ancestor.len() < path.len() && path[..ancestor.len()] == *ancestor
}

/// Check if `path` equals `other` or lies beneath it.
pub fn is_within(path: &[String], other: &[String]) -> bool {
    path.len() >= other.len() && path[..other.len()] == *other
}

/// Get the parent path of a given path.
///
/// # Errors
///
/// Returns [`PointerError::NoParent`] for the root path.
pub fn parent(path: &[String]) -> Result<Path, PointerError> {
    match path.split_last() {
        Some((_, rest)) => Ok(rest.to_vec()),
        None => Err(PointerError::NoParent),
    }
}

/// The first segment of a path, or `None` for the root.
pub fn top_level(path: &[String]) -> Option<&str> {
    path.first().map(String::as_str)
}

/// Check if a string consists only of ASCII digits.
///
/// ```
/// use curate_pointer::is_integer;
///
/// assert!(is_integer("012"));
/// assert!(!is_integer("-1"));
/// assert!(!is_integer(""));
/// ```
pub fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an array index. Leading zeros are rejected except for `"0"`.
pub fn parse_index(segment: &str) -> Result<usize, PointerError> {
    if !is_integer(segment) || (segment.len() > 1 && segment.starts_with('0')) {
        return Err(PointerError::InvalidIndex(segment.to_string()));
    }
    segment
        .parse()
        .map_err(|_| PointerError::InvalidIndex(segment.to_string()))
}

/// Get a value from a document by path.
///
/// Returns `None` if any step is missing or cannot be traversed.
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match current {
            Value::Array(arr) => arr.get(parse_index(step).ok()?)?,
            Value::Object(map) => map.get(step)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a mutable reference to a value in a document by path.
pub fn get_mut<'a>(val: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = val;
    for step in path {
        current = match current {
            Value::Array(arr) => arr.get_mut(parse_index(step).ok()?)?,
            Value::Object(map) => map.get_mut(step)?,
            _ => return None,
        };
    }
    Some(current)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("NOT_FOUND")]
    NotFound,
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error("NO_PARENT")]
    NoParent,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    #[error("PATH_TOO_LONG")]
    PathTooLong,
    #[error("INVALID_PATTERN: {0}")]
    InvalidPattern(String),
}
