//! Rules deciding when quick replies may be shown.

use engage_core::Enrichment;

use crate::extract::{default_buttons, extract_buttons, filter_discussed};

/// Minimum backend confidence for showing derived options without a domain match.
pub const CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Fixed qualification questions that get a free-text "Other" input.
const BANT_QUESTIONS: &[&str] = &[
    "what is your budget",
    "are you the decision-maker",
    "what is your timeline",
    "what problem are you trying to solve",
    "who else is involved in the decision",
];

/// The enrichment signals that gate derived quick replies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsGate {
    pub clarifier_shown: bool,
    pub missing_dims: Vec<String>,
    pub domain_match: Option<bool>,
    pub confidence: Option<f64>,
}

impl OptionsGate {
    pub fn from_enrichment(enrichment: &Enrichment) -> Self {
        Self {
            clarifier_shown: enrichment.clarifier_shown.unwrap_or(false),
            missing_dims: enrichment.missing_dims().to_vec(),
            domain_match: enrichment.domain_match,
            confidence: enrichment.confidence,
        }
    }

    /// A clarifying question is still collecting dimensions.
    pub fn is_clarifying(&self) -> bool {
        self.clarifier_shown && !self.missing_dims.is_empty()
    }

    /// Whether options derived from text (or defaults) may be shown.
    pub fn permits_options(&self) -> bool {
        if self.is_clarifying() || !self.missing_dims.is_empty() {
            return false;
        }
        self.domain_match == Some(true)
            || self.confidence.is_some_and(|c| c >= CONFIDENCE_THRESHOLD)
    }
}

/// Choose the quick replies for an assistant message.
///
/// Explicit buttons from the backend are always used as given. Otherwise, if
/// the gate permits, buttons are extracted from `text` and, failing that,
/// taken from the themed defaults; both are filtered against `topics`.
pub fn resolve_buttons(
    explicit: &[String],
    text: &str,
    topics: &[String],
    gate: &OptionsGate,
) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    if !gate.permits_options() {
        return Vec::new();
    }

    let extracted = filter_discussed(extract_buttons(text), topics);
    if !extracted.is_empty() {
        return extracted;
    }

    filter_discussed(default_buttons(text), topics)
}

/// Whether `text` asks one of the fixed qualification questions.
pub fn is_bant_question(text: &str) -> bool {
    let normalized = text
        .to_lowercase()
        .replace('\u{2019}', "'")
        .replace("what's", "what is")
        .replace("decision maker", "decision-maker");

    BANT_QUESTIONS.iter().any(|q| normalized.contains(q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn confident() -> OptionsGate {
        OptionsGate {
            domain_match: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_gate_from_enrichment() {
        let enrichment = Enrichment {
            clarifier_shown: Some(true),
            missing_dims: Some(strings(&["budget"])),
            confidence: Some(0.9),
            ..Default::default()
        };
        let gate = OptionsGate::from_enrichment(&enrichment);
        assert!(gate.is_clarifying());
        assert!(!gate.permits_options());
    }

    #[test]
    fn test_gate_requires_match_or_confidence() {
        assert!(!OptionsGate::default().permits_options());
        assert!(confident().permits_options());

        let gate = OptionsGate {
            confidence: Some(0.75),
            ..Default::default()
        };
        assert!(gate.permits_options());

        let gate = OptionsGate {
            domain_match: Some(false),
            confidence: Some(0.5),
            ..Default::default()
        };
        assert!(!gate.permits_options());
    }

    #[test]
    fn test_gate_missing_dims_blocks() {
        let gate = OptionsGate {
            missing_dims: strings(&["timeline"]),
            ..confident()
        };
        assert!(!gate.permits_options());
    }

    #[test]
    fn test_explicit_buttons_bypass_gate() {
        let gate = OptionsGate {
            clarifier_shown: true,
            missing_dims: strings(&["budget"]),
            ..Default::default()
        };
        let buttons = resolve_buttons(&strings(&["Yes", "No"]), "- Other", &[], &gate);
        assert_eq!(buttons, vec!["Yes", "No"]);
    }

    #[test]
    fn test_extracted_buttons_when_permitted() {
        let text = "Options:\n- Online booking\n- Payments";
        assert_eq!(
            resolve_buttons(&[], text, &[], &confident()),
            vec!["Online booking", "Payments"]
        );
        assert!(resolve_buttons(&[], text, &[], &OptionsGate::default()).is_empty());
    }

    #[test]
    fn test_topic_suppression() {
        let text = "- Pricing plans\n- Integrations";
        let topics = strings(&["pricing"]);
        assert_eq!(
            resolve_buttons(&[], text, &topics, &confident()),
            vec!["Integrations"]
        );
    }

    #[test]
    fn test_defaults_when_nothing_extracted() {
        let buttons = resolve_buttons(&[], "What is your timeline?", &[], &confident());
        assert_eq!(buttons, strings(&["Immediately", "Within 1 month", "1-3 months", "Just exploring"]));

        let topics = strings(&["immediately", "just exploring"]);
        let buttons = resolve_buttons(&[], "What is your timeline?", &topics, &confident());
        assert_eq!(buttons, strings(&["Within 1 month", "1-3 months"]));
    }

    #[test]
    fn test_bant_question_detection() {
        assert!(is_bant_question("Great! What's your budget for this?"));
        assert!(is_bant_question("Are you the decision maker here?"));
        assert!(is_bant_question("What\u{2019}s your timeline?"));
        assert!(is_bant_question("What problem are you trying to solve?"));
        assert!(is_bant_question("Who else is involved in the decision?"));
        assert!(!is_bant_question("What is your name?"));
    }
}
