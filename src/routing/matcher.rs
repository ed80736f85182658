//! Segment pattern matching logic.
//!
//! # Responsibilities
//! - Split paths and pattern strings into segments
//! - Compile pattern strings into `Pattern` chains
//! - Match a single pattern at a cursor position
//!
//! # Design Decisions
//! - Patterns are compiled once at registration, never re-parsed
//! - Literal matching is case-sensitive
//! - Empty segments (leading, trailing, doubled slashes) are ignored
//! - No regex: every step is O(1) in the number of segments

use std::collections::HashMap;
use std::fmt;

use crate::routing::types::RouteError;

/// A compiled rule for one path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Matches a segment equal to the text.
    Literal(String),
    /// Matches any non-empty segment and binds it under the name.
    Named(String),
    /// Matches any single segment without binding it.
    Wildcard,
    /// Matches all remaining segments, including none.
    TailWildcard,
}

impl Pattern {
    /// Apply this pattern to `segments[cursor..]`.
    ///
    /// Returns the cursor after the pattern, or `None` on a mismatch. A tail
    /// wildcard consumes nothing here; whoever walks the chain decides whether
    /// the leftover goes to children or into the remainder.
    pub fn step(
        &self,
        segments: &[&str],
        cursor: usize,
        params: &mut HashMap<String, String>,
    ) -> Option<usize> {
        match self {
            Pattern::TailWildcard => Some(cursor),
            Pattern::Literal(text) => {
                let segment = segments.get(cursor)?;
                (*segment == text.as_str()).then_some(cursor + 1)
            }
            Pattern::Named(name) => {
                let segment = segments.get(cursor)?;
                if segment.is_empty() {
                    return None;
                }
                params.insert(name.clone(), (*segment).to_string());
                Some(cursor + 1)
            }
            Pattern::Wildcard => segments.get(cursor).map(|_| cursor + 1),
        }
    }

    /// True for the trailing `*` form.
    pub fn is_tail(&self) -> bool {
        matches!(self, Pattern::TailWildcard)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(text) => f.write_str(text),
            Pattern::Named(name) => write!(f, ":{name}"),
            Pattern::Wildcard | Pattern::TailWildcard => f.write_str("*"),
        }
    }
}

/// Split a path on `/`, dropping empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Render leftover segments as a rooted path, or empty when nothing is left.
pub fn remainder(rest: &[&str]) -> String {
    if rest.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for segment in rest {
        out.push('/');
        out.push_str(segment);
    }
    out
}

/// Compile a slash-delimited pattern string.
///
/// `:name` becomes [`Pattern::Named`], `*` in final position becomes
/// [`Pattern::TailWildcard`] and `*` anywhere else [`Pattern::Wildcard`].
pub fn parse_pattern(pattern: &str) -> Result<Vec<Pattern>, RouteError> {
    let parts = segments(pattern);
    let last = parts.len().saturating_sub(1);

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| match *part {
            "*" if i == last => Ok(Pattern::TailWildcard),
            "*" => Ok(Pattern::Wildcard),
            named if named.starts_with(':') => {
                let name = &named[1..];
                if name.is_empty() {
                    return Err(RouteError::EmptyParamName(pattern.to_string()));
                }
                Ok(Pattern::Named(name.to_string()))
            }
            literal => Ok(Pattern::Literal(literal.to_string())),
        })
        .collect()
}

/// Render a compiled chain back to its canonical string form.
pub fn render(chain: &[&Pattern]) -> String {
    if chain.is_empty() {
        return "/".to_string();
    }
    chain.iter().map(|p| format!("/{p}")).collect()
}
