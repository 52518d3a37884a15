//! Keyword reference table
//!
//! The registry mapping keyword names to regex fragments. Two explicit
//! layers: an immutable baseline parsed from the embedded
//! `system_references.yaml`, and a mutable overlay holding user-file entries
//! and runtime additions. Lookups check the overlay first, then the baseline,
//! so the baseline can never be permanently mutated: removing a runtime
//! addition restores whatever the baseline said, and baseline entries
//! themselves refuse removal (except the composite `datetime` entry, whose
//! runtime-merged format variants are cleared back to the baseline set).
//!
//! Construction loads the baseline first (a parse failure there is fatal),
//! then tries the optional user overlay; overlay failures are logged and
//! ignored. Merging is additive-only: a key that already exists is skipped
//! with a warning, never overwritten.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

/// The embedded baseline reference file.
const SYSTEM_REFERENCES: &str = include_str!("reference/system_references.yaml");

/// The composite entry whose variant fields may be extended at runtime.
const DATETIME_KEYWORD: &str = "datetime";

/// Reserved field names inside a reference entry; everything else is a
/// variant field.
const PATTERN_FIELD: &str = "pattern";
const DESCRIPTION_FIELD: &str = "description";

/// One named building-block pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pattern: String,
    description: String,
    extras: Vec<(String, String)>,
}

impl ReferenceEntry {
    /// The base regex fragment.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Look up a variant field such as `format2`.
    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, pattern)| pattern.as_str())
    }

    /// Variant fields in file order.
    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extras
            .iter()
            .map(|(field, pattern)| (field.as_str(), pattern.as_str()))
    }
}

/// Errors raised while loading or mutating the reference table.
#[derive(Debug)]
pub enum ReferenceError {
    /// A reference file (or the embedded baseline) failed to parse.
    ParseFailed { origin: String, detail: String },
    /// An overlay path does not exist or cannot be read.
    MissingFile { path: PathBuf },
    /// A stored pattern does not compile.
    InvalidPattern { key: String, source: regex::Error },
    /// `add` on a key that already exists as a runtime addition.
    DuplicateKey(String),
    /// `add`/`remove` on a protected baseline key.
    BaselineProtected(String),
    /// `remove` on a key that is not present at all.
    UnknownKey(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::ParseFailed { origin, detail } => {
                write!(f, "reference file {} failed to parse: {}", origin, detail)
            }
            ReferenceError::MissingFile { path } => {
                write!(f, "reference file {} cannot be read", path.display())
            }
            ReferenceError::InvalidPattern { key, source } => {
                write!(f, "pattern for key {:?} does not compile: {}", key, source)
            }
            ReferenceError::DuplicateKey(key) => {
                write!(f, "key {:?} already exists", key)
            }
            ReferenceError::BaselineProtected(key) => {
                write!(f, "key {:?} belongs to the baseline and cannot be changed", key)
            }
            ReferenceError::UnknownKey(key) => {
                write!(f, "key {:?} is not present", key)
            }
        }
    }
}

impl std::error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReferenceError::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The two-layer keyword registry.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    baseline: Vec<(String, ReferenceEntry)>,
    overlay: Vec<(String, ReferenceEntry)>,
    /// The baseline `datetime` entry plus runtime-merged format variants.
    /// None while no variant has been merged.
    merged_datetime: Option<ReferenceEntry>,
}

impl ReferenceTable {
    /// Build a table from the embedded baseline only.
    pub fn builtin() -> Result<ReferenceTable, ReferenceError> {
        Ok(ReferenceTable {
            baseline: parse_reference_yaml(SYSTEM_REFERENCES, "builtin")?,
            overlay: Vec::new(),
            merged_datetime: None,
        })
    }

    /// Build a table from the baseline plus the default user overlay at
    /// `~/.rexbuild/user_references.yaml`. Overlay absence or failure is
    /// logged and ignored; a baseline failure is fatal.
    pub fn new() -> Result<ReferenceTable, ReferenceError> {
        let mut table = ReferenceTable::builtin()?;
        if let Some(path) = default_overlay_path() {
            table.try_overlay(&path);
        }
        Ok(table)
    }

    /// Build a table from the baseline plus an explicit overlay path.
    /// Overlay failure is logged and ignored, like the default path.
    pub fn with_overlay<P: AsRef<Path>>(path: P) -> Result<ReferenceTable, ReferenceError> {
        let mut table = ReferenceTable::builtin()?;
        table.try_overlay(path.as_ref());
        Ok(table)
    }

    fn try_overlay(&mut self, path: &Path) {
        if let Err(error) = self.load_overlay(path) {
            log::warn!("user reference overlay skipped: {}", error);
        }
    }

    /// Merge a user reference file into the overlay layer.
    ///
    /// Additive-only: a key already present in either layer is skipped with
    /// a warning, never overwritten.
    pub fn load_overlay<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ReferenceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|_| ReferenceError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let entries = parse_reference_yaml(&text, &path.display().to_string())?;
        for (key, entry) in entries {
            if self.contains(&key) {
                log::warn!("key {:?} already exists, not updating it from {}", key, path.display());
            } else {
                self.overlay.push((key, entry));
            }
        }
        Ok(())
    }

    /// Look up an entry by keyword, overlay first, then baseline.
    pub fn get(&self, name: &str) -> Option<&ReferenceEntry> {
        if name == DATETIME_KEYWORD {
            if let Some(merged) = &self.merged_datetime {
                return Some(merged);
            }
        }
        lookup(&self.overlay, name).or_else(|| lookup(&self.baseline, name))
    }

    /// Whether the keyword exists in either layer.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All entries visible through the table, baseline first, in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReferenceEntry)> {
        self.baseline
            .iter()
            .chain(self.overlay.iter())
            .map(move |(key, entry)| {
                if key == DATETIME_KEYWORD {
                    if let Some(merged) = &self.merged_datetime {
                        return (key.as_str(), merged);
                    }
                }
                (key.as_str(), entry)
            })
    }

    /// Add a runtime entry for ad-hoc reference testing.
    ///
    /// Baseline keys are protected; use [add_datetime_format] to extend the
    /// composite `datetime` entry.
    ///
    /// [add_datetime_format]: ReferenceTable::add_datetime_format
    pub fn add(
        &mut self,
        name: &str,
        pattern: &str,
        description: &str,
    ) -> Result<(), ReferenceError> {
        validate_pattern(name, pattern)?;
        if lookup(&self.baseline, name).is_some() {
            return Err(ReferenceError::BaselineProtected(name.to_string()));
        }
        if lookup(&self.overlay, name).is_some() {
            return Err(ReferenceError::DuplicateKey(name.to_string()));
        }
        self.overlay.push((
            name.to_string(),
            ReferenceEntry {
                pattern: pattern.to_string(),
                description: description.to_string(),
                extras: Vec::new(),
            },
        ));
        Ok(())
    }

    /// Merge an additional format variant into the `datetime` entry.
    pub fn add_datetime_format(
        &mut self,
        field: &str,
        pattern: &str,
    ) -> Result<(), ReferenceError> {
        validate_pattern(field, pattern)?;
        let current = match &self.merged_datetime {
            Some(merged) => merged,
            None => lookup(&self.baseline, DATETIME_KEYWORD)
                .ok_or_else(|| ReferenceError::UnknownKey(DATETIME_KEYWORD.to_string()))?,
        };
        if current.extra(field).is_some() {
            return Err(ReferenceError::DuplicateKey(field.to_string()));
        }
        let mut merged = current.clone();
        merged.extras.push((field.to_string(), pattern.to_string()));
        self.merged_datetime = Some(merged);
        Ok(())
    }

    /// Remove a runtime addition, or restore the composite `datetime` entry
    /// to its baseline definition.
    ///
    /// Other baseline keys refuse removal; an absent key is an error.
    /// `add` followed by `remove` of the same non-baseline name returns the
    /// table to its pre-add state exactly.
    pub fn remove(&mut self, name: &str) -> Result<(), ReferenceError> {
        if let Some(position) = self.overlay.iter().position(|(key, _)| key == name) {
            self.overlay.remove(position);
            return Ok(());
        }
        if name == DATETIME_KEYWORD && lookup(&self.baseline, name).is_some() {
            self.merged_datetime = None;
            return Ok(());
        }
        if lookup(&self.baseline, name).is_some() {
            return Err(ReferenceError::BaselineProtected(name.to_string()));
        }
        Err(ReferenceError::UnknownKey(name.to_string()))
    }
}

fn lookup<'t>(layer: &'t [(String, ReferenceEntry)], name: &str) -> Option<&'t ReferenceEntry> {
    layer
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, entry)| entry)
}

fn default_overlay_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".rexbuild").join("user_references.yaml"))
}

fn validate_pattern(key: &str, pattern: &str) -> Result<(), ReferenceError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|source| ReferenceError::InvalidPattern {
            key: key.to_string(),
            source,
        })
}

/// Parse a reference YAML document into ordered entries.
///
/// The document must be a mapping of keyword name to an object carrying at
/// least a `pattern` string; `description` is optional, and every other
/// string field is kept as a variant field in file order. Every stored
/// pattern is validated to compile independently.
fn parse_reference_yaml(
    text: &str,
    origin: &str,
) -> Result<Vec<(String, ReferenceEntry)>, ReferenceError> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|error| ReferenceError::ParseFailed {
            origin: origin.to_string(),
            detail: error.to_string(),
        })?;

    if document.is_null() {
        return Ok(Vec::new());
    }

    let mapping = document
        .as_mapping()
        .ok_or_else(|| ReferenceError::ParseFailed {
            origin: origin.to_string(),
            detail: "document must be a mapping of keyword to entry".to_string(),
        })?;

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| ReferenceError::ParseFailed {
                origin: origin.to_string(),
                detail: "keyword names must be strings".to_string(),
            })?
            .to_string();
        let fields = value
            .as_mapping()
            .ok_or_else(|| ReferenceError::ParseFailed {
                origin: origin.to_string(),
                detail: format!("entry {:?} must be a mapping", key),
            })?;

        let mut pattern: Option<String> = None;
        let mut description = String::new();
        let mut extras: Vec<(String, String)> = Vec::new();

        for (field, field_value) in fields {
            let field = field.as_str().unwrap_or_default();
            let field_value = field_value
                .as_str()
                .ok_or_else(|| ReferenceError::ParseFailed {
                    origin: origin.to_string(),
                    detail: format!("field {:?} of entry {:?} must be a string", field, key),
                })?;
            match field {
                PATTERN_FIELD => pattern = Some(field_value.to_string()),
                DESCRIPTION_FIELD => description = field_value.to_string(),
                _ => extras.push((field.to_string(), field_value.to_string())),
            }
        }

        let pattern = pattern.ok_or_else(|| ReferenceError::ParseFailed {
            origin: origin.to_string(),
            detail: format!("entry {:?} is missing the pattern field", key),
        })?;

        validate_pattern(&key, &pattern)?;
        for (field, variant) in &extras {
            validate_pattern(&format!("{}.{}", key, field), variant)?;
        }

        entries.push((
            key,
            ReferenceEntry {
                pattern,
                description,
                extras,
            },
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_parses_and_has_core_entries() {
        let table = ReferenceTable::builtin().unwrap();
        assert_eq!(table.get("word").unwrap().pattern(), r"\w+");
        assert_eq!(table.get("digit").unwrap().pattern(), r"\d");
        assert!(table.get("datetime").unwrap().extra("format1").is_some());
        assert!(table.get("no_such_keyword").is_none());
    }

    #[test]
    fn every_baseline_pattern_compiles() {
        let table = ReferenceTable::builtin().unwrap();
        for (key, entry) in table.iter() {
            assert!(Regex::new(entry.pattern()).is_ok(), "bad pattern for {}", key);
            for (field, variant) in entry.extras() {
                assert!(Regex::new(variant).is_ok(), "bad variant {}.{}", key, field);
            }
        }
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(parse_reference_yaml("- a\n- b\n", "test").is_err());
        assert!(parse_reference_yaml("key:\n  description: no pattern\n", "test").is_err());
        assert!(parse_reference_yaml("key:\n  pattern: '('\n", "test").is_err());
    }

    #[test]
    fn empty_document_is_empty() {
        assert!(parse_reference_yaml("", "test").unwrap().is_empty());
    }
}
