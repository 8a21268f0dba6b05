//! Text coercions for sheet display strings

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator for types, topics and special tags
pub const COMMA_LIST: &str = ", ";
/// Separator for languages, packed booths and collection names
pub const SEMICOLON_LIST: &str = "; ";

/// Marker for a poet whose legal last name is unknown
const UNKNOWN_MARKER: &str = "(Unknown)";

static HOURS_MINUTES_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+:\d{2}):\d{2}$").expect("duration pattern is valid"));

/// Split `"Last, First"` into `(first, last)`.
///
/// A leading `(Unknown)` marker yields an empty last name. Without a comma
/// the whole value is the first name.
pub fn split_name(raw: &str) -> (String, String) {
    let raw = raw.trim();

    if let Some(rest) = raw.strip_prefix(UNKNOWN_MARKER) {
        let rest = rest.trim_start();
        let rest = rest.strip_prefix(',').unwrap_or(rest);
        return (rest.trim().to_string(), String::new());
    }

    match raw.split_once(',') {
        Some((last, first)) => (first.trim().to_string(), last.trim().to_string()),
        None => (raw.to_string(), String::new()),
    }
}

/// Case-insensitive marker test; any other value is false
pub fn flag(raw: &str, truthy: &[&str]) -> bool {
    let raw = raw.trim();
    truthy.iter().any(|t| raw.eq_ignore_ascii_case(t))
}

/// Strip punctuation and spaces from a telepoem number
pub fn sanitize_telepoem_number(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '-' | ' ' | '\u{a0}'))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() { None } else { Some(cleaned.to_string()) }
}

/// Strip spaces and truncate `HH:MM:SS` to `HH:MM`
pub fn normalize_duration(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !matches!(c, ' ' | '\u{a0}')).collect();
    let compact = compact.trim();
    if compact.is_empty() {
        return None;
    }

    match HOURS_MINUTES_SECONDS.captures(compact) {
        Some(caps) => Some(caps[1].to_string()),
        None => Some(compact.to_string()),
    }
}

/// Split a packed list, trimming elements and dropping blanks
pub fn split_list(raw: &str, separator: &str) -> Vec<String> {
    // Tolerate a missing space after the separator
    let separator = separator.trim_end();
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
