//! Type definitions for paths.

/// A single unescaped path segment: an object key or a decimal array index.
pub type PathStep = String;

/// A parsed path, root first.
pub type Path = Vec<PathStep>;
