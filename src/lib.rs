//! # rexbuild
//!
//! Compiles a small template notation - literal text mixed with element
//! keyword calls such as `word(var_name, or_empty)` - into standard regular
//! expressions with named capture groups, so log and CLI-output templates
//! can be matched without hand-writing regex.
//!
//! The pipeline, leaves first:
//!
//! - [reference::ReferenceTable]: named building-block patterns (word,
//!   digits, ipv4_address, datetime, ...), loaded from an embedded baseline
//!   plus an optional user overlay, with session-scoped additions.
//! - [pattern::text::TextPattern]: escapes a run of literal text.
//! - [pattern::element::ElementPattern]: compiles one `keyword(params)` call.
//! - [pattern::line::LinePattern]: compiles one line of mixed text and
//!   applies whitespace/case/anchoring policy.
//! - [builder::RegexBuilder]: compiles many lines, deduplicates, and tests
//!   the patterns against sample data.
//! - [pattern::multiline::MultilinePattern]: compiles a whole block into one
//!   pattern spanning line breaks.
//!
//! Every pattern exposed by these types is guaranteed to compile with the
//! `regex` crate. Patterns are plain strings: consumers run them with their
//! own regex engine. No attempt is made to keep them optimal or safe from
//! pathological backtracking in engines that backtrack.

pub mod builder;
pub mod pattern;
pub mod reference;

pub use builder::{BuildError, MatchedSample, PatternMatches, RegexBuilder, UserData};
pub use pattern::element::ElementPattern;
pub use pattern::line::{LineOptions, LinePattern, BLANK_LINE_PATTERN};
pub use pattern::multiline::MultilinePattern;
pub use pattern::text::TextPattern;
pub use pattern::PatternError;
pub use reference::{ReferenceEntry, ReferenceError, ReferenceTable};
