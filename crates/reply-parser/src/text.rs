//! Text and label cleanup.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Sub-fields tried, in order, when a button label arrives as an object.
const LABEL_FIELDS: &[&str] = &["label", "text", "title", "name", "value"];

/// Render width handed to html2text; wide enough that nothing wraps.
const RENDER_WIDTH: usize = 10_000;

static INLINE_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid inline space regex"));

static LINE_END_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid line end regex"));

static ANY_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Render one line of markup as plain text.
///
/// Lines without `<` or `&` are returned untouched. If html2text cannot
/// render the line the raw text is kept.
fn render_line(line: &str) -> String {
    if !line.contains(['<', '&']) {
        return line.to_string();
    }

    match html2text::config::plain_no_decorate().string_from_read(line.as_bytes(), RENDER_WIDTH) {
        Ok(text) => text.trim_end_matches('\n').to_string(),
        Err(e) => {
            debug!(error = %e, "HTML render failed, keeping raw text");
            line.to_string()
        }
    }
}

fn render_html(input: &str) -> String {
    input.split('\n').map(render_line).collect::<Vec<_>>().join("\n")
}

/// Decode HTML entities, line by line.
///
/// Decoding is a single pass, so `&amp;lt;` becomes `&lt;` rather than `<`.
/// Unknown entities are left as they are.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    render_html(input)
}

/// Remove HTML tags, keeping their text.
pub fn strip_tags(input: &str) -> String {
    if !input.contains('<') {
        return input.to_string();
    }
    render_html(input)
}

/// Normalize display text.
///
/// Converts literal `\\n` / `\n` escape sequences to real newlines, unescapes
/// common punctuation, renders markup and entities as plain text and
/// collapses runs of spaces and tabs. Newlines are preserved.
pub fn normalize_text(input: &str) -> String {
    let text = input
        .replace("\\\\n", "\n")
        .replace("\\n", "\n")
        .replace("\\r", "")
        .replace("\\t", " ")
        .replace("\\\"", "\"")
        .replace("\\'", "'")
        .replace("\\/", "/")
        .replace("\r\n", "\n");
    let text = render_html(&text);
    let text = INLINE_SPACE_RE.replace_all(&text, " ");
    let text = LINE_END_SPACE_RE.replace_all(&text, "\n");
    text.trim().to_string()
}

fn clean_label(input: &str) -> String {
    let text = render_html(&input.replace("\\n", " "));
    ANY_SPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Turn an arbitrary button value into a display label.
///
/// Object labels use the first non-empty of `label`, `text`, `title`, `name`
/// or `value` (recursively). Returns an empty string when nothing usable is
/// found; callers drop empty labels.
pub fn sanitize_label(value: &Value) -> String {
    match value {
        Value::String(s) => clean_label(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => LABEL_FIELDS
            .iter()
            .filter_map(|field| map.get(*field))
            .map(sanitize_label)
            .find(|label| !label.is_empty())
            .unwrap_or_default(),
        Value::Null | Value::Array(_) => String::new(),
    }
}

/// Sanitize a list of button values, dropping empty and duplicate labels.
pub fn sanitize_labels<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    let labels: IndexSet<String> = values
        .into_iter()
        .map(sanitize_label)
        .filter(|label| !label.is_empty())
        .collect();
    labels.into_iter().collect()
}
