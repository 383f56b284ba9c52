//! Wildcard path patterns.
//!
//! A pattern is a path whose segments may be `*` (exactly one segment) or
//! `**` (zero or more segments). Matching is a recursive descent over
//! unescaped segment lists, so a key containing an escaped `/` (`~1`) is
//! compared as one segment.

use std::fmt;

use crate::{escape_segment, unescape_segment, PointerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Literal(String),
    /// `*`
    One,
    /// `**`
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Parse a pattern string.
    ///
    /// # Errors
    ///
    /// Partial globs inside a segment (`foo*`) are rejected with
    /// [`PointerError::InvalidPattern`].
    ///
    /// ```
    /// use curate_pointer::PathPattern;
    ///
    /// let pattern = PathPattern::parse("/meta/**").unwrap();
    /// assert!(pattern.matches_str("/meta"));
    /// assert!(pattern.matches_str("/meta/created/at"));
    /// assert!(PathPattern::parse("/meta/foo*").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, PointerError> {
        let body = pattern.strip_prefix('/').unwrap_or(pattern);
        if body.is_empty() {
            return Ok(Self { segments: Vec::new() });
        }
        let segments = body
            .split('/')
            .map(|raw| match raw {
                "*" => Ok(PatternSegment::One),
                "**" => Ok(PatternSegment::Any),
                _ if raw.contains('*') => Err(PointerError::InvalidPattern(pattern.to_string())),
                _ => Ok(PatternSegment::Literal(unescape_segment(raw))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<PatternSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Check whether `path` matches the whole pattern.
    pub fn matches(&self, path: &[String]) -> bool {
        match_segments(&self.segments, path)
    }

    /// Check whether `path`, or any ancestor of it, matches the pattern.
    pub fn matches_within(&self, path: &[String]) -> bool {
        (0..=path.len()).any(|len| match_segments(&self.segments, &path[..len]))
    }

    pub fn matches_str(&self, pointer: &str) -> bool {
        self.matches(&crate::parse_path(pointer))
    }
}

fn match_segments(pattern: &[PatternSegment], path: &[String]) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return path.is_empty();
    };
    match head {
        PatternSegment::Any => {
            // Greedy: try to swallow as much of the path as possible first.
            (0..=path.len()).rev().any(|skip| match_segments(rest, &path[skip..]))
        }
        PatternSegment::One => !path.is_empty() && match_segments(rest, &path[1..]),
        PatternSegment::Literal(lit) => {
            path.first().is_some_and(|step| step == lit) && match_segments(rest, &path[1..])
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str("/")?;
            match segment {
                PatternSegment::Literal(lit) => f.write_str(&escape_segment(lit))?,
                PatternSegment::One => f.write_str("*")?,
                PatternSegment::Any => f.write_str("**")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_path;

    fn pat(s: &str) -> PathPattern {
        PathPattern::parse(s).unwrap()
    }

    #[test]
    fn literal_match() {
        assert!(pat("/a/b").matches_str("/a/b"));
        assert!(!pat("/a/b").matches_str("/a"));
        assert!(!pat("/a/b").matches_str("/a/b/c"));
    }

    #[test]
    fn single_star_matches_exactly_one() {
        let p = pat("/items/*/id");
        assert!(p.matches_str("/items/0/id"));
        assert!(p.matches_str("/items/x/id"));
        assert!(!p.matches_str("/items/id"));
        assert!(!p.matches_str("/items/0/1/id"));
    }

    #[test]
    fn double_star_matches_zero_or_more() {
        let p = pat("/**/id");
        assert!(p.matches_str("/id"));
        assert!(p.matches_str("/a/id"));
        assert!(p.matches_str("/a/b/c/id"));
        assert!(!p.matches_str("/a/b"));
    }

    #[test]
    fn double_star_in_middle_backtracks() {
        let p = pat("/a/**/b/c");
        assert!(p.matches_str("/a/b/c"));
        assert!(p.matches_str("/a/b/c/b/c"));
        assert!(p.matches_str("/a/x/y/b/c"));
        assert!(!p.matches_str("/a/x/y/b"));
    }

    #[test]
    fn trailing_double_star() {
        let p = pat("/meta/**");
        assert!(p.matches_str("/meta"));
        assert!(p.matches_str("/meta/x/y"));
        assert!(!p.matches_str("/other"));
    }

    #[test]
    fn escaped_slash_is_one_segment() {
        let p = pat("/urls/*/host");
        assert!(p.matches(&parse_path("/urls/http:~1~1x/host")));
        let lit = pat("/a~1b");
        assert!(lit.matches(&vec!["a/b".to_string()]));
        assert!(!lit.matches(&vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn matches_within_ancestors() {
        let p = pat("/id");
        assert!(p.matches_within(&parse_path("/id")));
        assert!(p.matches_within(&parse_path("/id/nested")));
        assert!(!p.matches_within(&parse_path("/other/id")));
    }

    #[test]
    fn root_pattern() {
        let p = pat("");
        assert!(p.matches_str("/"));
        assert!(!p.matches_str("/a"));
        assert!(p.matches_within(&parse_path("/a")));
    }

    #[test]
    fn rejects_partial_glob() {
        assert!(matches!(PathPattern::parse("/a*b"), Err(PointerError::InvalidPattern(_))));
    }

    #[test]
    fn display_roundtrip() {
        for s in ["/a/*/b", "/**", "/a~1b/**/c", ""] {
            assert_eq!(pat(s).to_string(), s);
        }
    }
}
