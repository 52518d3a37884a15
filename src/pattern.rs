//! Pattern compilation
//!
//! This module turns template notation into regular-expression text. The
//! compilers are layered, leaves first:
//!
//! 1. [text] escapes runs of literal text, substituting a whitespace matcher
//!    for runs of whitespace.
//! 2. [element] compiles a single `keyword(params)` call into a fragment,
//!    consulting the reference table and applying variable/alternation/
//!    modifier params.
//! 3. [line] scans one line of mixed literal/keyword text, interleaves the
//!    two compilers, and applies line-level policy (case marker, whitespace
//!    anchors).
//! 4. [multiline] compiles a whole block into a single pattern spanning
//!    line breaks.
//!
//! Every compiler validates its output with `Regex::new` before returning,
//! so a pattern held by any of these types is guaranteed to compile.

use std::fmt;

pub mod element;
pub mod line;
pub mod multiline;
pub mod text;

/// Regex metacharacters escaped in literal text: `^ $ . ? * + | { } [ ] ( )`.
const METACHARACTERS: &str = "^$.?*+|{}[]()";

/// Escape regex metacharacters in a literal segment.
///
/// Whitespace is left untouched; callers decide whether whitespace stays
/// literal or becomes a whitespace matcher.
pub(crate) fn escape_fragment(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if METACHARACTERS.contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// The matcher substituted for a run of whitespace.
pub(crate) fn whitespace_token(used_space: bool) -> &'static str {
    if used_space {
        " +"
    } else {
        r"\s+"
    }
}

/// The zero-or-more whitespace matcher used by line anchors and by the
/// separator demotion after an optional element.
pub(crate) fn whitespace_token_optional(used_space: bool) -> &'static str {
    if used_space {
        " *"
    } else {
        r"\s*"
    }
}

/// Errors raised when an assembled fragment or line fails to compile.
///
/// Failures are deterministic for a given input, so they are never retried;
/// each variant carries the offending input for diagnosis.
#[derive(Debug)]
pub enum PatternError {
    /// An element call assembled into an invalid fragment.
    Element { call: String, source: regex::Error },
    /// A line assembled into an invalid pattern.
    Line { line: String, source: regex::Error },
    /// A multiline block assembled into an invalid pattern.
    Multiline { source: regex::Error },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Element { call, source } => {
                write!(f, "element {:?} compiled to an invalid fragment: {}", call, source)
            }
            PatternError::Line { line, source } => {
                write!(f, "line {:?} compiled to an invalid pattern: {}", line, source)
            }
            PatternError::Multiline { source } => {
                write!(f, "multiline block compiled to an invalid pattern: {}", source)
            }
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatternError::Element { source, .. }
            | PatternError::Line { source, .. }
            | PatternError::Multiline { source } => Some(source),
        }
    }
}
