//! Slot parsing for base templates.
//! Splits base template text into literal segments interleaved with named
//! slot markers, after scalar type-parameter substitution. Both steps are
//! pure: the same base and parameters always yield the same structure.

use crate::model::BaseTemplate;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Marker syntax shared by slots and type parameters: `{{name}}`.
static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)\s*\}\}").expect("marker pattern is valid")
});

/// One region of a parsed template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Verbatim template text
    Literal(String),
    /// A named insertion point
    Slot {
        name: String,
        /// Leading whitespace of the marker's line; injected fragment
        /// lines are re-indented to this column
        indent: String,
        /// True when the marker was alone on its line. The parser consumes
        /// the surrounding indentation and newline so that an empty slot
        /// leaves no blank line behind.
        standalone: bool,
    },
}

/// Merges explicit overrides over the base's default type parameters.
/// Overrides win; unknown override keys are preserved here and reported
/// by the resolver.
pub fn resolve_params(
    base: &BaseTemplate,
    overrides: &IndexMap<String, Value>,
) -> IndexMap<String, Value> {
    let mut params = base.type_params.clone();
    for (key, value) in overrides {
        params.insert(key.clone(), value.clone());
    }
    params
}

/// Renders a scalar parameter value as contract text.
/// Strings are emitted raw (no quotes); everything else uses its JSON form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replaces `{{param}}` tokens with resolved type-parameter values.
/// Tokens that do not name a parameter are left untouched for slot
/// parsing or literal passthrough.
pub fn substitute_params(text: &str, params: &IndexMap<String, Value>) -> String {
    MARKER
        .replace_all(text, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value_text(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Splits template text into literal segments and declared slot markers.
///
/// Markers whose name is not in `slots` pass through as literal text:
/// unknown tokens in the base may be real content and must not be
/// silently swallowed.
pub fn parse_file(text: &str, slots: &[String]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in MARKER.captures_iter(text) {
        let marker = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        if marker.start() < cursor {
            continue;
        }
        let name = &caps[1];
        if !slots.iter().any(|s| s == name) {
            continue;
        }

        let before = &text[cursor..marker.start()];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let indent = &before[line_start..];
        let blank_prefix = indent.chars().all(|c| c == ' ' || c == '\t');

        let after = &text[marker.end()..];
        let (tail_len, blank_suffix) = match after.find('\n') {
            Some(nl) => (nl + 1, after[..nl].trim().is_empty()),
            None => (after.len(), after.trim().is_empty()),
        };

        if blank_prefix && blank_suffix {
            // Marker alone on its line: hand the indentation and the
            // trailing newline to the slot.
            if line_start > 0 {
                segments.push(Segment::Literal(before[..line_start].to_string()));
            }
            segments.push(Segment::Slot {
                name: name.to_string(),
                indent: indent.to_string(),
                standalone: true,
            });
            cursor = marker.end() + tail_len;
        } else {
            if !before.is_empty() {
                segments.push(Segment::Literal(before.to_string()));
            }
            segments.push(Segment::Slot {
                name: name.to_string(),
                indent: String::new(),
                standalone: false,
            });
            cursor = marker.end();
        }
    }

    if cursor < text.len() {
        segments.push(Segment::Literal(text[cursor..].to_string()));
    }

    segments
}

/// Parses every file of a base template with the given resolved
/// parameters. Substitution runs before slot recognition, so a name that
/// is both a parameter and a slot resolves as a parameter.
pub fn parse_base(
    base: &BaseTemplate,
    params: &IndexMap<String, Value>,
) -> IndexMap<String, Vec<Segment>> {
    let mut parsed = IndexMap::new();
    for (path, text) in &base.files {
        let substituted = substitute_params(text, params);
        parsed.insert(path.clone(), parse_file(&substituted, &base.slots));
    }
    parsed
}
