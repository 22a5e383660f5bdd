//! Classification and normalization of raw backend answers.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::json::{find_embedded_object, parse_answer_object, repair_json};
use crate::text::{normalize_text, sanitize_labels};

/// Shown in place of an empty body when a reply carries only options.
pub const OPTIONS_PLACEHOLDER: &str = "Here are some options for you:";

static TEXT_BUTTONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:action\s+)?buttons?\s*:\s*(\[[^\]]*\])").expect("valid buttons regex")
});

static TEXT_EMAIL_PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)email\s*prompt\s*:\s*"([^"]*)""#).expect("valid email prompt regex")
});

static ARTIFACT_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#+\s*)?[*_]*\s*(?:action\s+buttons?|quick\s+actions?|buttons?|options|email\s+prompt)\s*[*_]*\s*:?\s*[*_]*\s*$",
    )
    .expect("valid artifact header regex")
});

static LONE_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*•]\s*$").expect("valid lone bullet regex"));

static STRUCTURAL_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[\s\[\]{}(),"':]+$"#).expect("valid structural line regex"));

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank run regex"));

/// The normalized form of a backend answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    /// Display text, never containing the structural JSON it was recovered from.
    pub main_text: String,
    /// Sanitized, unique button labels.
    pub buttons: Vec<String>,
    /// Email prompt, empty when absent.
    pub email_prompt: String,
}

impl ParsedReply {
    fn new(main_text: String, buttons: Vec<String>, email_prompt: String) -> Self {
        let main_text = if main_text.is_empty() && (!buttons.is_empty() || !email_prompt.is_empty())
        {
            OPTIONS_PLACEHOLDER.to_string()
        } else {
            main_text
        };

        Self {
            main_text,
            buttons,
            email_prompt,
        }
    }

    /// The email prompt, if one was supplied.
    pub fn email_prompt(&self) -> Option<&str> {
        (!self.email_prompt.is_empty()).then_some(self.email_prompt.as_str())
    }
}

/// The shape a raw answer was recognised as.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyShape {
    /// An answer object, given directly or as a (repaired) JSON string.
    Structured(Map<String, Value>),
    /// Prose with an answer object containing `"buttons"` embedded in it.
    Embedded {
        object: Map<String, Value>,
        remainder: String,
    },
    /// Prose carrying `Buttons: [...]` and/or `Email Prompt: "..."` lines.
    Textual {
        buttons: Vec<String>,
        email_prompt: Option<String>,
        remainder: String,
    },
    /// Plain text.
    Plain(String),
}

/// Recognise the shape of a raw answer.
///
/// String answers are tried, in order, as a whole JSON object, as prose with
/// an embedded object, as prose with textual button/prompt patterns, and
/// finally as plain text.
pub fn classify(raw: &Value) -> ReplyShape {
    match raw {
        Value::Object(map) => ReplyShape::Structured(map.clone()),
        Value::String(s) => classify_str(s),
        Value::Number(_) | Value::Bool(_) => ReplyShape::Plain(raw.to_string()),
        Value::Null | Value::Array(_) => ReplyShape::Plain(String::new()),
    }
}

fn classify_str(s: &str) -> ReplyShape {
    if let Some(object) = parse_answer_object(s) {
        return ReplyShape::Structured(object);
    }

    if let Some((span, object)) = find_embedded_object(s, "buttons") {
        let remainder = join_around(&s[..span.start], &s[span.end..]);
        return ReplyShape::Embedded { object, remainder };
    }

    let buttons = TEXT_BUTTONS_RE
        .captures(s)
        .map(|caps| parse_label_array(&caps[1]));
    let email_prompt = TEXT_EMAIL_PROMPT_RE
        .captures(s)
        .map(|caps| caps[1].to_string());

    if buttons.is_some() || email_prompt.is_some() {
        let remainder = TEXT_BUTTONS_RE.replace_all(s, "");
        let remainder = TEXT_EMAIL_PROMPT_RE.replace_all(&remainder, "");
        return ReplyShape::Textual {
            buttons: buttons.unwrap_or_default(),
            email_prompt,
            remainder: remainder.into_owned(),
        };
    }

    ReplyShape::Plain(s.to_string())
}

fn join_around(before: &str, after: &str) -> String {
    let before = before.trim_end();
    let after = after.trim_start();
    match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_string(),
        (_, true) => before.to_string(),
        _ => format!("{before} {after}"),
    }
}

/// Parse a `[...]` label list, tolerating the usual model mistakes.
fn parse_label_array(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<Value>>(&repair_json(raw)) {
        Ok(values) => sanitize_labels(&values),
        Err(e) => {
            debug!(error = %e, "TEXT_BUTTONS_NOT_JSON");
            let values: Vec<Value> = raw
                .trim_matches(|c| c == '[' || c == ']')
                .split(',')
                .map(|part| Value::String(part.trim().trim_matches(['"', '\'']).to_string()))
                .collect();
            sanitize_labels(&values)
        }
    }
}

/// Remove the structural leftovers of a recovered answer from display text.
fn scrub_artifacts(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            !ARTIFACT_HEADER_RE.is_match(line)
                && !LONE_BULLET_RE.is_match(line)
                && !STRUCTURAL_LINE_RE.is_match(line)
        })
        .collect();
    let joined = kept.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

fn display_text(raw: &str) -> String {
    scrub_artifacts(&normalize_text(raw))
}

fn object_main_text(object: &Map<String, Value>) -> String {
    object
        .get("mainText")
        .and_then(Value::as_str)
        .map(display_text)
        .unwrap_or_default()
}

fn object_buttons(object: &Map<String, Value>) -> Vec<String> {
    object
        .get("buttons")
        .and_then(Value::as_array)
        .map(|values| sanitize_labels(values))
        .unwrap_or_default()
}

fn object_email_prompt(object: &Map<String, Value>) -> String {
    object
        .get("emailPrompt")
        .and_then(Value::as_str)
        .map(normalize_text)
        .unwrap_or_default()
}

impl From<ReplyShape> for ParsedReply {
    fn from(shape: ReplyShape) -> Self {
        match shape {
            ReplyShape::Structured(object) => Self::new(
                object_main_text(&object),
                object_buttons(&object),
                object_email_prompt(&object),
            ),
            ReplyShape::Embedded { object, remainder } => {
                let main_text = [display_text(&remainder), object_main_text(&object)]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Self::new(main_text, object_buttons(&object), object_email_prompt(&object))
            }
            ReplyShape::Textual {
                buttons,
                email_prompt,
                remainder,
            } => Self::new(
                display_text(&remainder),
                buttons,
                email_prompt.as_deref().map(normalize_text).unwrap_or_default(),
            ),
            ReplyShape::Plain(text) => Self::new(display_text(&text), Vec::new(), String::new()),
        }
    }
}

/// Normalize any backend answer into a [`ParsedReply`].
///
/// Never fails: unparseable input degrades to plain text.
pub fn normalize_reply(raw: &Value) -> ParsedReply {
    ParsedReply::from(classify(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_object() {
        let reply = normalize_reply(&json!({
            "mainText": "Welcome!\\nHow can I help?",
            "buttons": ["Pricing", {"label": "Book a demo"}, "", "Pricing"],
            "emailPrompt": "Drop your email"
        }));

        assert_eq!(reply.main_text, "Welcome!\nHow can I help?");
        assert_eq!(reply.buttons, vec!["Pricing", "Book a demo"]);
        assert_eq!(reply.email_prompt(), Some("Drop your email"));
    }

    #[test]
    fn test_object_fields_type_checked() {
        let reply = normalize_reply(&json!({
            "mainText": 42,
            "buttons": "not a list",
            "emailPrompt": ["nope"]
        }));
        assert_eq!(reply, ParsedReply::default());
    }

    #[test]
    fn test_empty_main_text_placeholder() {
        let reply = normalize_reply(&json!({"mainText": "", "buttons": ["A"]}));
        assert_eq!(reply.main_text, OPTIONS_PLACEHOLDER);

        let reply = normalize_reply(&json!({"emailPrompt": "Email?"}));
        assert_eq!(reply.main_text, OPTIONS_PLACEHOLDER);

        let reply = normalize_reply(&json!({"mainText": ""}));
        assert_eq!(reply.main_text, "");
    }

    #[test]
    fn test_json_string_with_trailing_commas() {
        let raw = json!(r#"{"mainText":"Hi","buttons":["A","B",],}"#);
        let reply = normalize_reply(&raw);

        assert!(matches!(classify(&raw), ReplyShape::Structured(_)));
        assert_eq!(reply.main_text, "Hi");
        assert_eq!(reply.buttons, vec!["A", "B"]);
    }

    #[test]
    fn test_fenced_json_string() {
        let raw = json!("```json\n{\"mainText\": \"Hello\", \"buttons\": [\"Go\"]}\n```");
        let reply = normalize_reply(&raw);
        assert_eq!(reply.main_text, "Hello");
        assert_eq!(reply.buttons, vec!["Go"]);
    }

    #[test]
    fn test_embedded_object() {
        let raw = json!(r#"Here is info {"buttons": ["A","B"], "emailPrompt": "give email"} trailing"#);
        let reply = normalize_reply(&raw);

        assert!(matches!(classify(&raw), ReplyShape::Embedded { .. }));
        assert_eq!(reply.buttons, vec!["A", "B"]);
        assert_eq!(reply.email_prompt, "give email");
        assert_eq!(reply.main_text, "Here is info trailing");
    }

    #[test]
    fn test_embedded_object_only() {
        let raw = json!(r#"Buttons: {"buttons": ["A"]}"#);
        let reply = normalize_reply(&raw);
        assert_eq!(reply.main_text, OPTIONS_PLACEHOLDER);
        assert_eq!(reply.buttons, vec!["A"]);
    }

    #[test]
    fn test_textual_patterns() {
        let raw = json!("We have three plans.\nButtons: [\"Starter\", \"Pro\"]\nEmail Prompt: \"Want a quote?\"");
        let reply = normalize_reply(&raw);

        assert!(matches!(classify(&raw), ReplyShape::Textual { .. }));
        assert_eq!(reply.main_text, "We have three plans.");
        assert_eq!(reply.buttons, vec!["Starter", "Pro"]);
        assert_eq!(reply.email_prompt, "Want a quote?");
    }

    #[test]
    fn test_textual_unquoted_buttons() {
        let raw = json!("Pick one. Action Buttons: [Starter, Pro,]");
        let reply = normalize_reply(&raw);
        assert_eq!(reply.buttons, vec!["Starter", "Pro"]);
        assert_eq!(reply.main_text, "Pick one.");
    }

    #[test]
    fn test_textual_email_only() {
        let reply = normalize_reply(&json!("Thanks! Email Prompt: \"Where should we send it?\""));
        assert!(reply.buttons.is_empty());
        assert_eq!(reply.email_prompt, "Where should we send it?");
        assert_eq!(reply.main_text, "Thanks!");
    }

    #[test]
    fn test_plain_text_scrubbed() {
        let raw = json!("Here is what we offer.\n\nQuick Actions:\n-\n]\n\n\n\nAsk away!");
        let reply = normalize_reply(&raw);
        assert!(matches!(classify(&raw), ReplyShape::Plain(_)));
        assert_eq!(reply.main_text, "Here is what we offer.\n\nAsk away!");
        assert!(reply.buttons.is_empty());
        assert_eq!(reply.email_prompt(), None);
    }

    #[test]
    fn test_unbalanced_json_falls_back_to_text() {
        let reply = normalize_reply(&json!(r#"Sorry {"buttons": ["A""#));
        assert!(reply.buttons.is_empty());
        assert!(reply.main_text.starts_with("Sorry"));
    }

    #[test]
    fn test_non_string_answers() {
        assert_eq!(normalize_reply(&Value::Null).main_text, "");
        assert_eq!(normalize_reply(&json!(7)).main_text, "7");
        assert_eq!(normalize_reply(&json!(["a"])).main_text, "");
    }

    #[test]
    fn test_normalization_idempotent() {
        let inputs = [
            json!("Plain   text &amp; more\\n\\n\\n\\nSecond paragraph"),
            json!(r#"Intro {"buttons": ["A"], "mainText": "Body"}"#),
            json!("Hello\nOptions:\n- One\n- Two"),
        ];

        for raw in inputs {
            let once = normalize_reply(&raw);
            let twice = normalize_reply(&Value::String(once.main_text.clone()));
            assert_eq!(twice.main_text, once.main_text);
        }
    }
}
