//! Quick-reply extraction from list-shaped reply text.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;

use crate::text::sanitize_label;

/// Maximum number of quick replies derived from text.
pub const MAX_BUTTONS: usize = 6;

const MIN_LABEL_CHARS: usize = 3;
const MAX_LABEL_CHARS: usize = 60;

/// Topics shorter than this never suppress a button.
const MIN_TOPIC_CHARS: usize = 3;

static HORIZONTAL_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*_]\s*){3,}$").expect("valid rule regex"));

static SECTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#+\s*)?[*_]*\s*(?:quick\s+actions?|action\s+buttons?|buttons?|options)\s*[*_]*\s*:?\s*[*_]*\s*$",
    )
    .expect("valid section header regex")
});

static CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s*)?\[[ xX]?\]\s+(.+)$").expect("valid checkbox regex")
});

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*•●▪‣+]\s+(.+)$").expect("valid bullet regex"));

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}[.)]\s+(.+)$").expect("valid numbered regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid link regex"));

static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`~]+").expect("valid emphasis regex"));

static TRAILING_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.:;,!?]+$").expect("valid punctuation regex"));

fn candidate(line: &str) -> Option<String> {
    let listed = [&*CHECKBOX_RE, &*BULLET_RE, &*NUMBERED_RE]
        .iter()
        .find_map(|re| re.captures(line).map(|caps| caps[1].to_string()));

    if let Some(caps) = LINK_RE.captures(listed.as_deref().unwrap_or(line)) {
        return Some(caps[1].to_string());
    }
    listed
}

fn clean_candidate(raw: &str) -> String {
    let text = EMPHASIS_RE.replace_all(raw, "");
    let text = TRAILING_PUNCT_RE.replace(text.trim(), "");
    sanitize_label(&Value::String(text.into_owned()))
}

/// Derive quick replies from bullet, numbered, checkbox and link lines.
///
/// Horizontal rules and "Quick Actions" style headers are skipped. Labels are
/// cleaned of markdown emphasis and trailing punctuation, kept only when
/// 3 to 60 characters long, de-duplicated and capped at [`MAX_BUTTONS`].
pub fn extract_buttons(text: &str) -> Vec<String> {
    let mut labels = IndexSet::new();

    for line in text.lines() {
        if HORIZONTAL_RULE_RE.is_match(line) || SECTION_HEADER_RE.is_match(line) {
            continue;
        }

        let Some(raw) = candidate(line) else {
            continue;
        };

        let label = clean_candidate(&raw);
        let len = label.chars().count();
        if (MIN_LABEL_CHARS..=MAX_LABEL_CHARS).contains(&len) {
            labels.insert(label);
        }

        if labels.len() == MAX_BUTTONS {
            break;
        }
    }

    labels.into_iter().collect()
}

/// Drop buttons that overlap a topic already covered in the conversation.
///
/// Overlap is a case-insensitive substring match in either direction.
pub fn filter_discussed(buttons: Vec<String>, topics: &[String]) -> Vec<String> {
    let topics: Vec<String> = topics
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| t.chars().count() >= MIN_TOPIC_CHARS)
        .collect();

    if topics.is_empty() {
        return buttons;
    }

    buttons
        .into_iter()
        .filter(|button| {
            let label = button.to_lowercase();
            !topics
                .iter()
                .any(|topic| label.contains(topic.as_str()) || topic.contains(label.as_str()))
        })
        .collect()
}

const BUDGET_KEYWORDS: &[&str] = &["budget", "pricing", "price", "cost", "spend", "invest"];
const AUTHORITY_KEYWORDS: &[&str] = &["decision-maker", "decision maker", "decide", "approve", "authority"];
const TIMELINE_KEYWORDS: &[&str] = &["timeline", "timeframe", "how soon", "when are you", "when do you", "when would"];
const NEED_KEYWORDS: &[&str] = &["problem", "challenge", "trying to solve", "looking for", "goal", "need"];

const BUDGET_OPTIONS: &[&str] = &["Under $1,000", "$1,000 - $5,000", "$5,000 - $10,000", "Over $10,000"];
const AUTHORITY_OPTIONS: &[&str] = &["Yes, I'm the decision-maker", "No, someone else decides"];
const TIMELINE_OPTIONS: &[&str] = &["Immediately", "Within 1 month", "1-3 months", "Just exploring"];
const NEED_OPTIONS: &[&str] = &["Lead generation", "Customer support", "Sales automation", "Analytics & insights"];

/// Fallback quick replies chosen by sniffing the reply for a qualification theme.
///
/// Themes are tried in the order budget, authority, timeline, need. Returns
/// an empty list when none applies.
pub fn default_buttons(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let themes = [
        (BUDGET_KEYWORDS, BUDGET_OPTIONS),
        (AUTHORITY_KEYWORDS, AUTHORITY_OPTIONS),
        (TIMELINE_KEYWORDS, TIMELINE_OPTIONS),
        (NEED_KEYWORDS, NEED_OPTIONS),
    ];

    themes
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, options)| options.iter().map(|o| o.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_bullets() {
        let text = "We can help with:\n- **Online booking**\n* Payments.\n• Reminders";
        assert_eq!(
            extract_buttons(text),
            vec!["Online booking", "Payments", "Reminders"]
        );
    }

    #[test]
    fn test_extract_numbered_and_links() {
        let text = "1. Book a demo\n2) See pricing!\nRead [the docs](https://example.com/docs)";
        assert_eq!(
            extract_buttons(text),
            vec!["Book a demo", "See pricing", "the docs"]
        );
    }

    #[test]
    fn test_extract_checkbox() {
        let text = "- [ ] Connect calendar\n- [x] Invite team";
        assert_eq!(extract_buttons(text), vec!["Connect calendar", "Invite team"]);
    }

    #[test]
    fn test_extract_skips_rules_and_headers() {
        let text = "---\n**Quick Actions:**\n- Start trial\n***\n## Options\n- Talk to sales";
        assert_eq!(extract_buttons(text), vec!["Start trial", "Talk to sales"]);
    }

    #[test]
    fn test_extract_length_bounds() {
        let long = format!("- {}", "x".repeat(61));
        let text = format!("- ok\n{long}\n- Fine label");
        assert_eq!(extract_buttons(&text), vec!["Fine label"]);
    }

    #[test]
    fn test_extract_caps_and_dedupes() {
        let text = (1..=9)
            .map(|i| format!("- Option {i}\n- Option {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let buttons = extract_buttons(&text);
        assert_eq!(buttons.len(), MAX_BUTTONS);
        assert_eq!(buttons[0], "Option 1");
        assert_eq!(buttons[5], "Option 6");
    }

    #[test]
    fn test_extract_plain_prose() {
        assert!(extract_buttons("Just a sentence. Nothing listed here.").is_empty());
    }

    #[test]
    fn test_filter_discussed_both_directions() {
        let buttons = topics(&["Pricing plans", "Integrations", "Book a demo"]);
        assert_eq!(
            filter_discussed(buttons.clone(), &topics(&["pricing"])),
            vec!["Integrations", "Book a demo"]
        );
        assert_eq!(
            filter_discussed(buttons, &topics(&["Book a demo for my team"])),
            vec!["Pricing plans", "Integrations"]
        );
    }

    #[test]
    fn test_filter_ignores_short_topics() {
        let buttons = topics(&["AI tools", "Support"]);
        assert_eq!(filter_discussed(buttons.clone(), &topics(&["ai", " "])), buttons);
    }

    #[test]
    fn test_default_buttons_by_theme() {
        assert_eq!(default_buttons("What is your budget?")[0], "Under $1,000");
        assert_eq!(default_buttons("Are you the decision maker?").len(), 2);
        assert_eq!(default_buttons("What's your timeline?")[3], "Just exploring");
        assert_eq!(default_buttons("What problem are you facing?")[0], "Lead generation");
        assert!(default_buttons("Thanks for stopping by").is_empty());
    }
}
