//! Line compilation
//!
//! Scans one line of mixed literal/keyword text left to right, alternating
//! [TextPattern](crate::pattern::text::TextPattern) output for literal runs
//! with [ElementPattern](crate::pattern::element::ElementPattern) output for
//! `keyword(params)` spans, then applies line-level policy and validates the
//! result.
//!
//! The scan also produces a parallel "statement" string in the same pass:
//! literal runs contribute their original text, var-bound elements contribute
//! a `${name}` placeholder, unbound elements contribute their call text. The
//! statement stays positionally aligned with the pattern because both buffers
//! are appended fragment by fragment.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pattern::element::ElementPattern;
use crate::pattern::text::TextPattern;
use crate::pattern::{whitespace_token, whitespace_token_optional, PatternError};
use crate::reference::ReferenceTable;

/// The sentinel pattern produced for blank or whitespace-only lines.
pub const BLANK_LINE_PATTERN: &str = r"^\s*$";

/// Element-call spans are non-nested: `(word(var_x))` parses as literal
/// parens around an inner call.
static ELEMENT_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+\([^()]*\)").unwrap());

/// Line-level policy flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOptions {
    /// Use ` +` for whitespace runs instead of `\s+`.
    pub used_space: bool,
    /// Prepend a start-of-line anchor plus a whitespace matcher.
    pub prepended_ws: bool,
    /// Append a whitespace matcher plus an end-of-line anchor.
    pub appended_ws: bool,
    /// Prefix the whole pattern with the `(?i)` case-insensitivity marker.
    pub ignore_case: bool,
}

impl Default for LineOptions {
    fn default() -> Self {
        LineOptions {
            used_space: true,
            prepended_ws: false,
            appended_ws: false,
            ignore_case: false,
        }
    }
}

/// A validated pattern compiled from one line of template text.
#[derive(Debug)]
pub struct LinePattern {
    pattern: String,
    statement: String,
    var_names: Vec<String>,
    regex: Regex,
    source: String,
}

impl LinePattern {
    /// Compile one line of mixed literal/keyword text.
    pub fn compile(
        line: &str,
        options: &LineOptions,
        table: &ReferenceTable,
    ) -> Result<LinePattern, PatternError> {
        let body = compile_line_body(line, options.used_space, table)?;

        let (mut pattern, statement, var_names) = match body {
            LineBody::Blank => (BLANK_LINE_PATTERN.to_string(), line.to_string(), Vec::new()),
            LineBody::Content {
                pattern,
                statement,
                var_names,
            } => (pattern, statement, var_names),
        };

        // Policy order: anchor first, case marker at the very front, then
        // the trailing anchor.
        let anchor_ws = whitespace_token_optional(options.used_space);
        if options.prepended_ws {
            pattern = format!("^{}{}", anchor_ws, pattern);
        }
        if options.ignore_case {
            pattern = format!("(?i){}", pattern);
        }
        if options.appended_ws {
            pattern = format!("{}{}$", pattern, anchor_ws);
        }

        let regex = Regex::new(&pattern).map_err(|source| PatternError::Line {
            line: line.to_string(),
            source,
        })?;

        Ok(LinePattern {
            pattern,
            statement,
            var_names,
            regex,
            source: line.to_string(),
        })
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The human-readable statement with `${name}` placeholders.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Capture-group names bound in this line, in order of appearance.
    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    /// The source line this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The validated regex for this pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// A compiled line body before policy application.
pub(crate) enum LineBody {
    Blank,
    Content {
        pattern: String,
        statement: String,
        var_names: Vec<String>,
    },
}

/// One fragment of the interleaved scan.
enum Fragment {
    Text(TextPattern),
    Element(ElementPattern),
}

/// Scan and compile the body of one line, without policy flags.
///
/// Shared with the multiline compiler, which applies its own joining rules.
pub(crate) fn compile_line_body(
    line: &str,
    used_space: bool,
    table: &ReferenceTable,
) -> Result<LineBody, PatternError> {
    let mut fragments: Vec<Fragment> = Vec::new();
    let mut last = 0;

    for span in ELEMENT_CALL.find_iter(line) {
        if span.start() > last {
            fragments.push(Fragment::Text(TextPattern::compile(
                &line[last..span.start()],
                used_space,
            )));
        }
        fragments.push(Fragment::Element(ElementPattern::compile(
            span.as_str(),
            table,
        )?));
        last = span.end();
    }
    if last < line.len() {
        fragments.push(Fragment::Text(TextPattern::compile(&line[last..], used_space)));
    }

    // Blank line, or a single whitespace-only fragment, is the sentinel.
    if fragments.is_empty() {
        return Ok(LineBody::Blank);
    }
    if fragments.len() == 1 {
        if let Fragment::Text(text) = &fragments[0] {
            if text.source().trim().is_empty() {
                return Ok(LineBody::Blank);
            }
        }
    }

    let mut pattern = String::new();
    let mut statement = String::new();
    let mut var_names: Vec<String> = Vec::new();
    let mut after_optional = false;

    for fragment in &fragments {
        match fragment {
            Fragment::Text(text) => {
                let mut compiled = text.pattern().to_string();
                // A separator following an optional element must be able to
                // vanish with it, otherwise `a (x|) b` could never match the
                // element-less sample.
                if after_optional && text.source().starts_with(char::is_whitespace) {
                    let plus = whitespace_token(used_space);
                    let star = whitespace_token_optional(used_space);
                    if let Some(rest) = compiled.strip_prefix(plus) {
                        compiled = format!("{}{}", star, rest);
                    }
                }
                pattern.push_str(&compiled);
                statement.push_str(text.source());
                after_optional = false;
            }
            Fragment::Element(element) => {
                pattern.push_str(element.pattern());
                match element.var_name() {
                    Some(name) => {
                        statement.push_str(&format!("${{{}}}", name));
                        var_names.push(name.to_string());
                    }
                    None => statement.push_str(element.source()),
                }
                after_optional = element.is_optional();
            }
        }
    }

    Ok(LineBody::Content {
        pattern,
        statement,
        var_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReferenceTable {
        ReferenceTable::builtin().expect("baseline must load")
    }

    #[test]
    fn literal_line_without_calls() {
        let line = LinePattern::compile("cherry is delicious.", &LineOptions::default(), &table())
            .unwrap();
        assert_eq!(line.pattern(), r"cherry +is +delicious\.");
        assert_eq!(line.statement(), "cherry is delicious.");
    }

    #[test]
    fn scanner_splits_adjacent_calls_and_parens() {
        let line = LinePattern::compile(
            "ipv4_address(var_addr)(word(var_status))",
            &LineOptions::default(),
            &table(),
        )
        .unwrap();
        assert!(line.pattern().contains(r"\((?P<status>\w+)\)"));
        assert_eq!(line.statement(), "${addr}(${status})");
        assert_eq!(line.var_names(), ["addr", "status"]);
    }

    #[test]
    fn policy_application_order() {
        let options = LineOptions {
            prepended_ws: true,
            ignore_case: true,
            appended_ws: true,
            ..LineOptions::default()
        };
        let line = LinePattern::compile("ok", &options, &table()).unwrap();
        assert_eq!(line.pattern(), "(?i)^ *ok *$");
    }

    #[test]
    fn blank_lines_yield_the_sentinel() {
        for input in ["", "   ", "\t"] {
            let line = LinePattern::compile(input, &LineOptions::default(), &table()).unwrap();
            assert_eq!(line.pattern(), BLANK_LINE_PATTERN);
        }
    }

    #[test]
    fn separator_after_optional_element_is_demoted() {
        let line = LinePattern::compile(
            "digits(var_v1) letters(var_v2, or_empty) digits(var_v3)",
            &LineOptions::default(),
            &table(),
        )
        .unwrap();
        assert_eq!(
            line.pattern(),
            r"(?P<v1>\d+) +(?P<v2>[a-zA-Z]+|) *(?P<v3>\d+)"
        );
    }
}
