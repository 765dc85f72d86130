//! Line classification for MSTest console output.

use std::borrow::Cow;

use super::localization::Messages;

/// Prefix of the separator line printed above the result table.
pub const BEGIN_MARKER: &str = "----";

/// Separator between an attribute's key and its value.
const ATTRIBUTE_SEPARATOR: &str = " = ";

/// What a single line of output means once the result block has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// End of the result block.
    EndMarker,
    /// Start of a new test result.
    NewTestHeader {
        /// Outcome token exactly as printed.
        status: &'a str,
        /// Test name, empty if the line had none.
        name: &'a str,
    },
    /// Start of a `[key] = value` attribute.
    AttributeHeader {
        /// Key with every bracket removed.
        key: Cow<'a, str>,
        /// Value after the separator, possibly empty.
        value: &'a str,
    },
    /// Anything else; continues the previous attribute's value.
    ContinuationLine,
}

/// Whether `line` opens the result block.
#[must_use]
pub fn is_begin_marker(line: &str) -> bool {
    line.starts_with(BEGIN_MARKER)
}

/// Classify a line from inside the result block. Never fails.
#[must_use]
pub fn classify<'a>(line: &'a str, messages: &Messages) -> LineKind<'a> {
    if is_end_marker(line, messages) {
        return LineKind::EndMarker;
    }

    if messages
        .outcomes()
        .iter()
        .any(|outcome| !outcome.is_empty() && line.starts_with(*outcome))
    {
        let mut tokens = line.split_whitespace();
        let status = tokens.next().unwrap_or_default();
        let name = tokens.next().unwrap_or_default();
        return LineKind::NewTestHeader { status, name };
    }

    if line.starts_with('[') {
        let (key, value) = split_attribute(line);
        return LineKind::AttributeHeader { key, value };
    }

    LineKind::ContinuationLine
}

fn is_end_marker(line: &str, messages: &Messages) -> bool {
    let sentinel = messages.final_test_results.as_str();
    line.starts_with(|c: char| c.is_ascii_digit())
        || (!sentinel.is_empty() && line.starts_with(sentinel))
}

/// Split `[key] = value` into its parts.
///
/// When the closing bracket wraps the whole pair (`[key = value]`) it is
/// stripped from the value instead.
fn split_attribute(line: &str) -> (Cow<'_, str>, &str) {
    let (raw_key, value) = line
        .split_once(ATTRIBUTE_SEPARATOR)
        .unwrap_or((line, ""));
    let trimmed = raw_key.trim_matches(|c| c == '[' || c == ']');
    let key = if trimmed.contains(['[', ']']) {
        Cow::Owned(trimmed.replace(['[', ']'], ""))
    } else {
        Cow::Borrowed(trimmed)
    };
    let value = if raw_key.contains(']') {
        value
    } else {
        value.strip_suffix(']').unwrap_or(value)
    };
    (key, value)
}
