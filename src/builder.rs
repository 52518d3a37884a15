//! Aggregate pattern building
//!
//! [RegexBuilder] compiles many template lines at once and offers a
//! test-and-report mode matching the compiled patterns against sample data.
//! Two phases, no backward transitions: `build` populates the line patterns
//! (deduplicating identical source lines), then `test` may be invoked any
//! number of times, each run replacing the match tables and the report.
//!
//! Empty input is a soft no-op in both phases: the report explains that
//! nothing could be done and no error is raised. Every other failure is
//! deterministic and surfaced immediately.

use std::fmt;

use serde::Serialize;

use crate::pattern::line::{LineOptions, LinePattern};
use crate::pattern::PatternError;
use crate::reference::ReferenceTable;

/// User or test data: a single block of text, or a sequence of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserData {
    Block(String),
    Lines(Vec<String>),
}

impl UserData {
    /// Whether there is nothing to work with.
    pub fn is_empty(&self) -> bool {
        match self {
            UserData::Block(text) => text.is_empty(),
            UserData::Lines(lines) => lines.is_empty(),
        }
    }

    fn lines(&self) -> Vec<String> {
        match self {
            UserData::Block(text) => text.lines().map(str::to_string).collect(),
            UserData::Lines(lines) => lines.clone(),
        }
    }
}

impl From<&str> for UserData {
    fn from(text: &str) -> Self {
        UserData::Block(text.to_string())
    }
}

impl From<String> for UserData {
    fn from(text: String) -> Self {
        UserData::Block(text)
    }
}

impl From<Vec<String>> for UserData {
    fn from(lines: Vec<String>) -> Self {
        UserData::Lines(lines)
    }
}

impl From<&[&str]> for UserData {
    fn from(lines: &[&str]) -> Self {
        UserData::Lines(lines.iter().map(|line| line.to_string()).collect())
    }
}

/// Errors raised by the build/test phases.
#[derive(Debug)]
pub enum BuildError {
    /// `test` invoked before a successful `build`.
    NotBuilt,
    /// A line failed to compile.
    Pattern(PatternError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::NotBuilt => write!(f, "nothing is built yet, call build first"),
            BuildError::Pattern(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::NotBuilt => None,
            BuildError::Pattern(error) => Some(error),
        }
    }
}

impl From<PatternError> for BuildError {
    fn from(error: PatternError) -> Self {
        BuildError::Pattern(error)
    }
}

/// One sample that matched a pattern, with its captured groups in group
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedSample {
    pub sample: String,
    pub captures: Vec<(String, String)>,
}

/// Every sample that matched one compiled pattern, in sample order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatches {
    pub pattern: String,
    pub samples: Vec<MatchedSample>,
}

/// Builds regex patterns from template lines and tests them against samples.
pub struct RegexBuilder<'t> {
    table: &'t ReferenceTable,
    options: LineOptions,
    lines: Vec<String>,
    line_patterns: Vec<LinePattern>,
    built: bool,
    test_result: bool,
    test_report: String,
    matches: Vec<PatternMatches>,
}

impl<'t> RegexBuilder<'t> {
    /// A builder with default line options.
    pub fn new(table: &'t ReferenceTable) -> Self {
        RegexBuilder::with_options(table, LineOptions::default())
    }

    /// A builder with explicit line options.
    pub fn with_options(table: &'t ReferenceTable, options: LineOptions) -> Self {
        RegexBuilder {
            table,
            options,
            lines: Vec::new(),
            line_patterns: Vec::new(),
            built: false,
            test_result: false,
            test_report: String::new(),
            matches: Vec::new(),
        }
    }

    /// Compile the user data into line patterns.
    ///
    /// A block is split into lines; identical source lines compile once.
    /// Empty input short-circuits with an explanatory report.
    pub fn build<D: Into<UserData>>(&mut self, user_data: D) -> Result<(), BuildError> {
        let user_data = user_data.into();
        if user_data.is_empty() {
            self.test_report = "CANT build regex pattern with an empty data.".to_string();
            return Ok(());
        }

        for line in user_data.lines() {
            if self.lines.contains(&line) {
                continue;
            }
            let pattern = LinePattern::compile(&line, &self.options, self.table)?;
            self.lines.push(line);
            self.line_patterns.push(pattern);
        }
        self.built = true;
        Ok(())
    }

    /// Match every compiled pattern against every sample line.
    ///
    /// Returns the overall result: the AND across patterns of "matched at
    /// least one sample". Also renders the test report and fills the match
    /// tables; re-invocation with new data replaces both.
    pub fn test<D: Into<UserData>>(&mut self, test_data: D) -> Result<bool, BuildError> {
        if !self.built {
            return Err(BuildError::NotBuilt);
        }
        let test_data = test_data.into();
        if test_data.is_empty() {
            self.test_report = "CANT run test with an empty data.".to_string();
            self.test_result = false;
            return Ok(false);
        }

        let samples = test_data.lines();
        let mut report = vec![
            "Test Data:".to_string(),
            "-".repeat(9),
            samples.join("\n"),
            String::new(),
            "Matched Result:".to_string(),
            "-".repeat(14),
        ];

        self.matches.clear();
        let mut test_result = true;

        for line_pattern in &self.line_patterns {
            let regex = line_pattern.regex();
            let mut matched_samples: Vec<MatchedSample> = Vec::new();

            for sample in &samples {
                if let Some(caps) = regex.captures(sample) {
                    let captures: Vec<(String, String)> = regex
                        .capture_names()
                        .flatten()
                        .filter_map(|name| {
                            caps.name(name)
                                .map(|group| (name.to_string(), group.as_str().to_string()))
                        })
                        .collect();
                    matched_samples.push(MatchedSample {
                        sample: sample.clone(),
                        captures,
                    });
                }
            }

            let matched = !matched_samples.is_empty();
            test_result &= matched;

            report.push(format!("pattern: {}", line_pattern.pattern()));
            report.push(format!("matched: {}", render_matched(&matched_samples)));
            report.push("-".repeat(10));

            self.matches.push(PatternMatches {
                pattern: line_pattern.pattern().to_string(),
                samples: matched_samples,
            });
        }

        self.test_result = test_result;
        self.test_report = report.join("\n");
        Ok(test_result)
    }

    /// The compiled line patterns, in build order.
    pub fn line_patterns(&self) -> &[LinePattern] {
        &self.line_patterns
    }

    /// The deduplicated source lines, in build order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The overall result of the last test run.
    pub fn test_result(&self) -> bool {
        self.test_result
    }

    /// The rendered report of the last build/test run.
    pub fn test_report(&self) -> &str {
        &self.test_report
    }

    /// Per-pattern match tables from the last test run.
    pub fn matches(&self) -> &[PatternMatches] {
        &self.matches
    }
}

/// Render the matched column: `NO` for no match, `YES` for matches without
/// named groups, otherwise the list of captured-group dicts.
fn render_matched(samples: &[MatchedSample]) -> String {
    if samples.is_empty() {
        return "NO".to_string();
    }
    let dicts: Vec<String> = samples
        .iter()
        .filter(|sample| !sample.captures.is_empty())
        .map(|sample| {
            let pairs: Vec<String> = sample
                .captures
                .iter()
                .map(|(name, value)| format!("'{}': '{}'", name, value))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        })
        .collect();
    if dicts.is_empty() {
        "YES".to_string()
    } else {
        format!("[{}]", dicts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReferenceTable {
        ReferenceTable::builtin().unwrap()
    }

    #[test]
    fn empty_build_is_a_soft_no_op() {
        let table = table();
        let mut builder = RegexBuilder::new(&table);
        builder.build("").unwrap();
        assert_eq!(
            builder.test_report(),
            "CANT build regex pattern with an empty data."
        );
        assert!(builder.line_patterns().is_empty());
    }

    #[test]
    fn test_before_build_is_an_error() {
        let table = table();
        let mut builder = RegexBuilder::new(&table);
        assert!(matches!(builder.test("sample"), Err(BuildError::NotBuilt)));
    }

    #[test]
    fn duplicate_lines_compile_once() {
        let table = table();
        let mut builder = RegexBuilder::new(&table);
        builder
            .build(vec!["word(var_x)".to_string(), "word(var_x)".to_string()])
            .unwrap();
        assert_eq!(builder.line_patterns().len(), 1);
    }

    #[test]
    fn render_matched_variants() {
        assert_eq!(render_matched(&[]), "NO");
        let yes = MatchedSample {
            sample: "x".to_string(),
            captures: vec![],
        };
        assert_eq!(render_matched(&[yes]), "YES");
        let with_groups = MatchedSample {
            sample: "x".to_string(),
            captures: vec![("k".to_string(), "v".to_string())],
        };
        assert_eq!(render_matched(&[with_groups]), "[{'k': 'v'}]");
    }
}
