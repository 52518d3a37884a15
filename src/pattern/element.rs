//! Element compilation
//!
//! Compiles one `keyword(params)` call into a regex fragment. Resolution is
//! a first-match-wins cascade, applied in this order:
//!
//! 1. Raw passthrough: params begin with `raw>>>` - strip the marker and
//!    escape the whole call text verbatim, so the call syntax itself becomes
//!    literal text in the pattern.
//! 2. Reference: the keyword names a reference-table entry - start from its
//!    fragment and apply the remaining params.
//! 3. Choice: the keyword is literally `choice` - every param is a binder or
//!    a literal alternative, no reference expansion.
//! 4. Default: escape the whole call text verbatim, so unrecognized input is
//!    matched literally instead of failing.
//!
//! Params are split on `,` with surrounding space trimmed. Recognized shapes:
//!
//! - `var_<name>` binds the fragment to a named capture group (first wins)
//! - `or_empty` appends an empty alternative, making the fragment optional
//! - `or_<value>` appends an alternative: a reference fragment when `<value>`
//!   names a table entry, the escaped literal otherwise
//! - anchor tokens: `head`, `head_ws`, `head_ws_plus`, `head_space`,
//!   `head_space_plus` and the `tail*` mirrors
//! - boundary tokens: `word_bound`, `word_bound_left`, `word_bound_right`
//! - repetition tokens: `repetition_<n>`, `repetition_<n>_<m>`,
//!   `repetition_<n>_plus`, `repetition_<m>_max`
//! - anything else degrades to an escaped literal alternative
//!
//! For composite entries such as `datetime`, a param that exactly names one of
//! the entry's numbered variant fields (`format1`, `format2`, ...) selects
//! that variant instead of the base fragment; multiple selections alternate.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pattern::{escape_fragment, PatternError};
use crate::reference::{ReferenceEntry, ReferenceTable};

static CALL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(?P<keyword>\w+)\((?P<params>.*)\)$").unwrap());

const RAW_MARKER: &str = "raw>>>";
const VAR_PREFIX: &str = "var_";
const OR_PREFIX: &str = "or_";
const OR_EMPTY: &str = "or_empty";
const CHOICE_KEYWORD: &str = "choice";

/// A regex fragment compiled from one element call.
#[derive(Debug, Clone)]
pub struct ElementPattern {
    pattern: String,
    var_name: Option<String>,
    or_empty: bool,
    source: String,
}

/// Intermediate assembly state before validation.
struct Compiled {
    pattern: String,
    var_name: Option<String>,
    or_empty: bool,
}

impl Compiled {
    fn literal(text: &str) -> Compiled {
        Compiled {
            pattern: escape_fragment(text),
            var_name: None,
            or_empty: false,
        }
    }
}

impl ElementPattern {
    /// Compile an element call into a validated fragment.
    ///
    /// Input that does not parse as `keyword(params)` is escaped verbatim,
    /// like the default cascade step, so compilation only fails when the
    /// assembled fragment does not compile (for example a `var_` param that
    /// produces an invalid group name).
    pub fn compile(call: &str, table: &ReferenceTable) -> Result<ElementPattern, PatternError> {
        let compiled = match parse_call(call) {
            Some((keyword, params_raw)) => dispatch(call, keyword, params_raw, table),
            None => Compiled::literal(call),
        };
        Regex::new(&compiled.pattern).map_err(|source| PatternError::Element {
            call: call.to_string(),
            source,
        })?;
        Ok(ElementPattern {
            pattern: compiled.pattern,
            var_name: compiled.var_name,
            or_empty: compiled.or_empty,
            source: call.to_string(),
        })
    }

    /// The compiled fragment.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The capture-group name bound with `var_<name>`, if any.
    pub fn var_name(&self) -> Option<&str> {
        self.var_name.as_deref()
    }

    /// Whether the fragment carries an empty alternative (`or_empty`).
    pub fn is_optional(&self) -> bool {
        self.or_empty
    }

    /// The original call text.
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn parse_call(call: &str) -> Option<(&str, &str)> {
    let caps = CALL_SHAPE.captures(call)?;
    let keyword = caps.name("keyword")?.as_str();
    let params = caps.name("params")?.as_str();
    Some((keyword, params))
}

/// The resolution cascade. First matching rule wins.
fn dispatch(call: &str, keyword: &str, params_raw: &str, table: &ReferenceTable) -> Compiled {
    if let Some(rest) = params_raw.strip_prefix(RAW_MARKER) {
        return Compiled::literal(&format!("{}({})", keyword, rest));
    }

    let params = split_params(params_raw);

    if let Some(entry) = table.get(keyword) {
        return from_reference(entry, &params, table);
    }

    if keyword == CHOICE_KEYWORD {
        return from_choice(&params);
    }

    Compiled::literal(call)
}

fn split_params(params_raw: &str) -> Vec<&str> {
    if params_raw.trim().is_empty() {
        Vec::new()
    } else {
        params_raw.split(',').map(str::trim).collect()
    }
}

fn from_reference(entry: &ReferenceEntry, params: &[&str], table: &ReferenceTable) -> Compiled {
    // Variant-field params replace the base fragment; multiple selections
    // alternate in param order.
    let mut alternatives: Vec<String> = params
        .iter()
        .filter_map(|param| entry.extra(param))
        .map(str::to_string)
        .collect();
    if alternatives.is_empty() {
        alternatives.push(entry.pattern().to_string());
    }

    let mut var_name: Option<String> = None;
    let mut or_empty = false;
    let mut modifiers: Vec<Modifier> = Vec::new();

    for param in params {
        if entry.extra(param).is_some() {
            continue;
        }
        if let Some(name) = param.strip_prefix(VAR_PREFIX) {
            // only the first declaration is honored
            if var_name.is_none() {
                var_name = Some(name.to_string());
            }
            continue;
        }
        if *param == OR_EMPTY {
            or_empty = true;
            continue;
        }
        if let Some(value) = param.strip_prefix(OR_PREFIX) {
            let alternative = match table.get(value) {
                Some(reference) => reference.pattern().to_string(),
                None => escape_fragment(value),
            };
            alternatives.push(alternative);
            continue;
        }
        if let Some(modifier) = classify_modifier(param) {
            modifiers.push(modifier);
            continue;
        }
        // ambiguous tokens degrade to literal alternatives
        alternatives.push(escape_fragment(param));
    }

    assemble(alternatives, var_name, or_empty, modifiers)
}

fn from_choice(params: &[&str]) -> Compiled {
    let mut alternatives: Vec<String> = Vec::new();
    let mut var_name: Option<String> = None;
    let mut or_empty = false;

    for param in params {
        if let Some(name) = param.strip_prefix(VAR_PREFIX) {
            if var_name.is_none() {
                var_name = Some(name.to_string());
            }
            continue;
        }
        if *param == OR_EMPTY {
            or_empty = true;
            continue;
        }
        let value = param.strip_prefix(OR_PREFIX).unwrap_or(param);
        alternatives.push(escape_fragment(value));
    }

    assemble(alternatives, var_name, or_empty, Vec::new())
}

/// Join alternatives, group for precedence, apply modifiers, then wrap the
/// finished fragment for capture.
fn assemble(
    alternatives: Vec<String>,
    var_name: Option<String>,
    or_empty: bool,
    modifiers: Vec<Modifier>,
) -> Compiled {
    // An alternative containing literal whitespace is grouped so the `|`
    // join does not bleed into its neighbors.
    let mut alts: Vec<String> = alternatives
        .into_iter()
        .map(|alt| {
            if alt.chars().any(char::is_whitespace) {
                format!("({})", alt)
            } else {
                alt
            }
        })
        .collect();
    if or_empty {
        alts.push(String::new());
    }

    let multiple = alts.len() > 1;
    let mut pattern = alts.join("|");

    // A bound alternation is grouped by the capture wrap itself; otherwise
    // the join needs its own parens so the `|` cannot bleed into neighboring
    // fragments (or swallow a modifier applied below).
    if multiple && (var_name.is_none() || !modifiers.is_empty()) {
        pattern = format!("({})", pattern);
    }

    // Modifiers restructure the fragment first, then the capture name wraps
    // the finished result, so a quantifier stays inside the group.
    for modifier in &modifiers {
        pattern = modifier.apply(pattern);
    }
    if let Some(name) = &var_name {
        pattern = format!("(?P<{}>{})", name, pattern);
    }

    Compiled {
        pattern,
        var_name,
        or_empty,
    }
}

/// A structural modifier applied to the whole accumulated fragment.
enum Modifier {
    Prefix(&'static str),
    Suffix(&'static str),
    Bound { left: bool, right: bool },
    Repetition(String),
}

impl Modifier {
    fn apply(&self, fragment: String) -> String {
        match self {
            Modifier::Prefix(prefix) => format!("{}{}", prefix, fragment),
            Modifier::Suffix(suffix) => format!("{}{}", fragment, suffix),
            Modifier::Bound { left, right } => {
                let mut out = String::new();
                if *left {
                    out.push_str(r"\b");
                }
                out.push_str(&fragment);
                if *right {
                    out.push_str(r"\b");
                }
                out
            }
            Modifier::Repetition(quantifier) => apply_repetition(&fragment, quantifier),
        }
    }
}

fn classify_modifier(token: &str) -> Option<Modifier> {
    match token {
        "head" => Some(Modifier::Prefix("^")),
        "head_ws" => Some(Modifier::Prefix(r"^\s*")),
        "head_ws_plus" => Some(Modifier::Prefix(r"^\s+")),
        "head_space" => Some(Modifier::Prefix("^ *")),
        "head_space_plus" => Some(Modifier::Prefix("^ +")),
        "tail" => Some(Modifier::Suffix("$")),
        "tail_ws" => Some(Modifier::Suffix(r"\s*$")),
        "tail_ws_plus" => Some(Modifier::Suffix(r"\s+$")),
        "tail_space" => Some(Modifier::Suffix(" *$")),
        "tail_space_plus" => Some(Modifier::Suffix(" +$")),
        "word_bound" => Some(Modifier::Bound {
            left: true,
            right: true,
        }),
        "word_bound_left" => Some(Modifier::Bound {
            left: true,
            right: false,
        }),
        "word_bound_right" => Some(Modifier::Bound {
            left: false,
            right: true,
        }),
        _ => {
            let spec = token.strip_prefix("repetition_")?;
            parse_repetition(spec).map(Modifier::Repetition)
        }
    }
}

/// Parse the tail of a repetition token into a quantifier.
///
/// `3` -> `{3}`, `1_3` -> `{1,3}`, `2_plus` -> `{2,}`, `5_max` -> `{0,5}`.
/// An upper-bound-only quantifier is spelled `{0,m}` because the regex crate
/// rejects an empty lower bound. Malformed tails return None and fall through
/// to literal-alternative treatment.
fn parse_repetition(tail: &str) -> Option<String> {
    if let Some(count) = parse_count(tail) {
        return Some(format!("{{{}}}", count));
    }
    let (first, second) = tail.split_once('_')?;
    let first = parse_count(first)?;
    match second {
        "plus" => Some(format!("{{{},}}", first)),
        "max" => Some(format!("{{0,{}}}", first)),
        _ => {
            let second = parse_count(second)?;
            Some(format!("{{{},{}}}", first, second))
        }
    }
}

fn parse_count(text: &str) -> Option<usize> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Re-quantify a fragment: strip its trailing quantifier, then append the
/// new one, grouping first when the fragment is more than a single unit.
fn apply_repetition(fragment: &str, quantifier: &str) -> String {
    let stripped = strip_quantifier(fragment);
    if is_single_unit(stripped) {
        format!("{}{}", stripped, quantifier)
    } else {
        format!("({}){}", stripped, quantifier)
    }
}

fn strip_quantifier(fragment: &str) -> &str {
    if fragment.ends_with(['+', '*', '?']) {
        let head = &fragment[..fragment.len() - 1];
        if !head.ends_with('\\') {
            return head;
        }
    }
    if fragment.ends_with('}') {
        if let Some(idx) = fragment.rfind('{') {
            let inner = &fragment[idx + 1..fragment.len() - 1];
            let counted = !inner.is_empty()
                && inner.chars().all(|c| c.is_ascii_digit() || c == ',');
            if counted && !fragment[..idx].ends_with('\\') {
                return &fragment[..idx];
            }
        }
    }
    fragment
}

/// True when the fragment quantifies as-is: a single character, a
/// single-character escape, or one balanced class/group.
fn is_single_unit(fragment: &str) -> bool {
    let mut chars = fragment.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some('\\'), Some(_)) if fragment.chars().count() == 2 => true,
        (Some('['), _) => closing_index(fragment, '[', ']') == Some(fragment.len() - 1),
        (Some('('), _) => closing_index(fragment, '(', ')') == Some(fragment.len() - 1),
        _ => false,
    }
}

fn closing_index(fragment: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0;
    let mut escaped = false;
    for (idx, ch) in fragment.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}
