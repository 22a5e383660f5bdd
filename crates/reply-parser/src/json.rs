//! Recovery of JSON objects from almost-JSON model output.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Keys that identify a structured answer object.
pub(crate) const ANSWER_KEYS: &[&str] = &["mainText", "buttons", "emailPrompt"];

static STRAY_FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\]}])\s*"[^"]*"(\s*[,}\]])"#).expect("valid stray fragment regex")
});

static DUPLICATE_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(?:\s*,)+").expect("valid duplicate comma regex"));

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma regex"));

static LEADING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\[{])\s*,\s*").expect("valid leading comma regex"));

/// Remove a surrounding markdown code fence, if any.
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` fences opening the
/// text. Anything else is returned trimmed.
pub(crate) fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();

    let Some(after_backticks) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the optional language tag
    let body_start = after_backticks
        .find('\n')
        .filter(|i| after_backticks[..*i].chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|i| i + 1)
        .unwrap_or(0);
    let body = &after_backticks[body_start..];

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Find the balanced `{...}` object starting at byte offset `start`.
///
/// Braces inside string literals are ignored. Returns the byte range of the
/// object, or `None` when `start` is not a `{` or the braces never balance.
pub(crate) fn balanced_object_at(s: &str, start: usize) -> Option<Range<usize>> {
    if !s[start..].starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(start..start + i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Apply the textual repairs commonly needed by model-generated JSON.
///
/// - quoted fragments dangling after a closing `]` or `}`
/// - duplicate commas
/// - trailing commas before `}` or `]`
/// - leading commas after `[` or `{`
pub(crate) fn repair_json(input: &str) -> String {
    let text = STRAY_FRAGMENT_RE.replace_all(input, "$1$2");
    let text = DUPLICATE_COMMA_RE.replace_all(&text, ",");
    let text = TRAILING_COMMA_RE.replace_all(&text, "$1");
    let text = LEADING_COMMA_RE.replace_all(&text, "$1");
    text.into_owned()
}

/// Parse a repaired object, returning `None` unless it is a JSON object.
pub(crate) fn parse_repaired_object(candidate: &str) -> Option<Map<String, Value>> {
    let repaired = repair_json(candidate);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "REPLY_JSON_REPAIR_FAILED");
            None
        }
    }
}

fn is_answer_object(map: &Map<String, Value>) -> bool {
    ANSWER_KEYS.iter().any(|key| map.contains_key(*key))
}

/// Parse a whole string as a structured answer object.
///
/// Succeeds only when, after removing code fences, the string is a single
/// object (optionally followed by surplus closing braces) carrying at least
/// one answer key.
pub(crate) fn parse_answer_object(input: &str) -> Option<Map<String, Value>> {
    let body = strip_code_fences(input);
    let span = balanced_object_at(body, 0)?;

    let rest = &body[span.end..];
    if !rest.chars().all(|c| c == '}' || c.is_whitespace()) {
        return None;
    }

    parse_repaired_object(&body[span.clone()]).filter(is_answer_object)
}

/// Find the first embedded object mentioning `key` that parses after repair.
///
/// Returns the object's byte range in `input` together with the parsed map.
pub(crate) fn find_embedded_object(
    input: &str,
    key: &str,
) -> Option<(Range<usize>, Map<String, Value>)> {
    let needle = format!("\"{key}\"");

    input
        .match_indices('{')
        .filter_map(|(start, _)| balanced_object_at(input, start))
        .filter(|span| input[span.clone()].contains(&needle))
        .find_map(|span| {
            let map = parse_repaired_object(&input[span.clone()])?;
            map.contains_key(key).then_some((span, map))
        })
}
