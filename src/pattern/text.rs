//! Literal text compilation
//!
//! Turns a run of literal (non-keyword) text into an escaped regex fragment.
//! Runs of whitespace are replaced by a whitespace matcher: ` +` when literal
//! spaces are preferred, `\s+` otherwise. Everything else is escaped so the
//! fragment matches the text exactly.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pattern::{escape_fragment, whitespace_token};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// An escaped fragment compiled from literal text.
///
/// Compilation never fails: the output alphabet is escaped literals plus a
/// whitespace matcher, both always valid regex. Same input and flag always
/// produce the same output byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPattern {
    pattern: String,
    source: String,
}

impl TextPattern {
    /// Compile literal text into a regex fragment.
    ///
    /// Leading or trailing whitespace in the input contributes a leading or
    /// trailing whitespace matcher. Empty input yields an empty fragment;
    /// whitespace-only input yields the bare whitespace matcher.
    pub fn compile(text: &str, used_space: bool) -> TextPattern {
        let pattern = if text.is_empty() {
            String::new()
        } else {
            WHITESPACE_RUN
                .split(text)
                .map(escape_fragment)
                .collect::<Vec<_>>()
                .join(whitespace_token(used_space))
        };
        TextPattern {
            pattern,
            source: text.to_string(),
        }
    }

    /// The compiled fragment.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The literal text this fragment was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}
