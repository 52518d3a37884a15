//! Multiline compilation
//!
//! Compiles an entire multi-line template into a single pattern matching a
//! contiguous region of a larger document. Unlike the line compiler there is
//! no per-line anchoring: the literal newline joins the line bodies, and the
//! whitespace matchers inside a line are forced to the space flavor so they
//! cannot consume the newline and bleed into neighboring lines.

use regex::Regex;

use crate::pattern::line::{compile_line_body, LineBody};
use crate::pattern::PatternError;
use crate::reference::ReferenceTable;

/// Line bodies are joined over a literal newline, tolerating trailing blanks
/// on one line and leading blanks on the next.
const LINE_JOIN: &str = r" *\r?\n *";

/// A validated pattern compiled from a whole multi-line template.
#[derive(Debug)]
pub struct MultilinePattern {
    pattern: String,
    statement: String,
    var_names: Vec<String>,
    regex: Regex,
}

impl MultilinePattern {
    /// Compile a template block into one cross-line pattern.
    ///
    /// Blank template lines contribute nothing between two newline joins.
    /// Named groups from every template line are exposed on a match against
    /// the larger document, regardless of surrounding boilerplate.
    pub fn compile(
        block: &str,
        ignore_case: bool,
        table: &ReferenceTable,
    ) -> Result<MultilinePattern, PatternError> {
        let mut bodies: Vec<String> = Vec::new();
        let mut statements: Vec<String> = Vec::new();
        let mut var_names: Vec<String> = Vec::new();

        for line in block.lines() {
            // space-flavored matchers only: `\s+` would cross the newline
            match compile_line_body(line, true, table)? {
                LineBody::Blank => {
                    bodies.push(String::new());
                    statements.push(line.to_string());
                }
                LineBody::Content {
                    pattern,
                    statement,
                    var_names: names,
                } => {
                    bodies.push(pattern);
                    statements.push(statement);
                    var_names.extend(names);
                }
            }
        }

        let mut pattern = bodies.join(LINE_JOIN);
        if ignore_case {
            pattern = format!("(?i){}", pattern);
        }

        let regex =
            Regex::new(&pattern).map_err(|source| PatternError::Multiline { source })?;

        Ok(MultilinePattern {
            pattern,
            statement: statements.join("\n"),
            var_names,
            regex,
        })
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The statement form, one line per template line.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Capture-group names bound across all template lines, in order.
    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    /// The validated regex for this pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Match the template against a document, returning captured groups in
    /// order of appearance.
    pub fn captures(&self, document: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(document)?;
        Some(
            self.var_names
                .iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_lines_over_literal_newlines() {
        let table = ReferenceTable::builtin().unwrap();
        let compiled =
            MultilinePattern::compile("alpha word(var_x)\nbeta word(var_y)", false, &table)
                .unwrap();
        assert_eq!(
            compiled.pattern(),
            r"alpha +(?P<x>\w+) *\r?\n *beta +(?P<y>\w+)"
        );
        assert_eq!(compiled.statement(), "alpha ${x}\nbeta ${y}");
    }

    #[test]
    fn blank_template_lines_collapse() {
        let table = ReferenceTable::builtin().unwrap();
        let compiled = MultilinePattern::compile("a\n\nb", false, &table).unwrap();
        assert_eq!(compiled.pattern(), r"a *\r?\n * *\r?\n *b");
    }
}
