//! Turning backend replies into transcript messages.

use engage_core::{BotMode, ChatMessage, ChatReply, Role, WireMessage};
use indexmap::IndexSet;
use reply_parser::{
    is_bant_question, normalize_reply, resolve_buttons, sanitize_labels, OptionsGate,
};
use serde_json::Value;

/// What the backend has told us about the visitor so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitorProfile {
    pub user_email: Option<String>,
    pub bot_mode: BotMode,
    pub topics: IndexSet<String>,
}

impl VisitorProfile {
    /// Fold the persona, email and topics carried by a reply into the profile.
    pub fn absorb(&mut self, reply: &ChatReply) {
        if let Some(email) = reply.user_email.as_deref().map(str::trim) {
            if !email.is_empty() {
                self.user_email = Some(email.to_string());
            }
        }
        if let Some(mode) = reply.bot_mode.as_deref().and_then(BotMode::parse) {
            self.bot_mode = mode;
        }
        if let Some(topics) = &reply.topics_discussed {
            self.topics.extend(
                topics
                    .iter()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            );
        }
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.iter().cloned().collect()
    }

    fn stamp(&self, message: ChatMessage) -> ChatMessage {
        let mut message = message.with_bot_mode(self.bot_mode);
        message.user_email = self.user_email.clone();
        message.topics_discussed = self.topics();
        message
    }
}

/// The messages produced by one backend reply.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledReply {
    pub primary: ChatMessage,
    /// A second message to append after a reading pause.
    pub secondary: Option<ChatMessage>,
}

fn explicit_labels(buttons: Option<&Vec<Value>>) -> Vec<String> {
    buttons.map(|b| sanitize_labels(b.iter())).unwrap_or_default()
}

/// Build the assistant message(s) for a reply.
///
/// `profile` should already have absorbed `reply`.
pub fn assemble_reply(reply: &ChatReply, profile: &VisitorProfile) -> AssembledReply {
    let parsed = normalize_reply(&reply.answer);

    let mut explicit = explicit_labels(reply.buttons.as_ref());
    if explicit.is_empty() {
        explicit = parsed.buttons.clone();
    }

    let gate = OptionsGate::from_enrichment(&reply.enrichment);
    let buttons = resolve_buttons(&explicit, &parsed.main_text, &profile.topics(), &gate);

    let email_prompt = reply
        .email_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .or(parsed.email_prompt())
        .map(String::from);

    let mut primary = profile
        .stamp(ChatMessage::assistant(parsed.main_text.clone()))
        .with_buttons(buttons)
        .with_enrichment(reply.enrichment.clone());
    if let Some(prompt) = email_prompt {
        primary = primary.with_email_prompt(prompt);
    }
    primary.show_other_input = is_bant_question(&primary.content);

    let secondary = reply
        .secondary
        .as_ref()
        .map(normalize_reply)
        .filter(|s| !s.main_text.trim().is_empty())
        .map(|s| {
            let show_other_input = is_bant_question(&s.main_text);
            let mut message = profile
                .stamp(ChatMessage::assistant(s.main_text))
                .with_buttons(s.buttons);
            message.show_other_input = show_other_input;
            message
        });

    AssembledReply { primary, secondary }
}

/// Convert a stored history entry into a transcript message.
///
/// Assistant entries go through the normalizer; buttons are the stored ones
/// (or those recovered from the content) and are never derived from text.
pub fn hydrate_message(wire: &WireMessage) -> ChatMessage {
    let role = Role::from_wire(&wire.role);
    let parsed = normalize_reply(&wire.content);

    let mut message = match role {
        Role::User => {
            let content = match &wire.content {
                Value::String(s) => s.trim().to_string(),
                _ => parsed.main_text.clone(),
            };
            return ChatMessage::user(content);
        }
        Role::Assistant => ChatMessage::assistant(parsed.main_text.clone()),
    };

    let mut buttons = explicit_labels(wire.buttons.as_ref());
    if buttons.is_empty() {
        buttons = parsed.buttons.clone();
    }
    message = message
        .with_buttons(buttons)
        .with_enrichment(wire.enrichment.clone());

    if let Some(prompt) = wire
        .email_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .or(parsed.email_prompt())
    {
        message = message.with_email_prompt(prompt);
    }
    if let Some(mode) = wire.bot_mode.as_deref().and_then(BotMode::parse) {
        message.bot_mode = mode;
    }
    message.user_email = wire.user_email.clone();
    message.topics_discussed = wire.topics_discussed.clone().unwrap_or_default();
    message.show_other_input = is_bant_question(&message.content);
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use engage_core::Enrichment;
    use serde_json::json;

    fn confident() -> Enrichment {
        Enrichment {
            domain_match: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_profile_absorbs_reply() {
        let mut profile = VisitorProfile::default();
        let reply = ChatReply {
            user_email: Some("ada@example.com".to_string()),
            bot_mode: Some("lead_generation".to_string()),
            topics_discussed: Some(vec!["pricing".to_string(), " ".to_string()]),
            ..ChatReply::text("Thanks")
        };

        profile.absorb(&reply);
        profile.absorb(&ChatReply {
            bot_mode: Some("unknown".to_string()),
            topics_discussed: Some(vec!["pricing".to_string(), "demo".to_string()]),
            ..ChatReply::text("More")
        });

        assert_eq!(profile.user_email.as_deref(), Some("ada@example.com"));
        assert_eq!(profile.bot_mode, BotMode::LeadGeneration);
        assert_eq!(profile.topics(), vec!["pricing", "demo"]);
    }

    #[test]
    fn test_explicit_api_buttons_win() {
        let reply = ChatReply {
            answer: json!({"mainText": "Pick one", "buttons": ["From answer"]}),
            ..Default::default()
        }
        .with_buttons(["<b>Book a demo</b>", "Book a demo", "Pricing"]);

        let assembled = assemble_reply(&reply, &VisitorProfile::default());
        assert_eq!(assembled.primary.content, "Pick one");
        assert_eq!(assembled.primary.buttons, vec!["Book a demo", "Pricing"]);
    }

    #[test]
    fn test_answer_buttons_bypass_gate() {
        let reply = ChatReply {
            answer: json!({"mainText": "Pick one", "buttons": ["Pricing", "Demo"]}),
            ..Default::default()
        };

        let assembled = assemble_reply(&reply, &VisitorProfile::default());
        assert_eq!(assembled.primary.buttons, vec!["Pricing", "Demo"]);
    }

    #[test]
    fn test_derived_buttons_require_gate() {
        let text = "We offer:\n- Online booking\n- Payment processing\n- Staff scheduling";

        let ungated = assemble_reply(&ChatReply::text(text), &VisitorProfile::default());
        assert!(ungated.primary.buttons.is_empty());

        let gated = assemble_reply(
            &ChatReply {
                enrichment: confident(),
                ..ChatReply::text(text)
            },
            &VisitorProfile::default(),
        );
        assert_eq!(
            gated.primary.buttons,
            vec!["Online booking", "Payment processing", "Staff scheduling"]
        );
    }

    #[test]
    fn test_derived_buttons_filter_discussed_topics() {
        let mut profile = VisitorProfile::default();
        profile.topics.insert("payment".to_string());
        let reply = ChatReply {
            enrichment: confident(),
            ..ChatReply::text("- Online booking\n- Payment processing")
        };

        let assembled = assemble_reply(&reply, &profile);
        assert_eq!(assembled.primary.buttons, vec!["Online booking"]);
        assert_eq!(assembled.primary.topics_discussed, vec!["payment"]);
    }

    #[test]
    fn test_email_prompt_precedence() {
        let reply = ChatReply {
            answer: json!({"mainText": "Hi", "emailPrompt": "From answer"}),
            email_prompt: Some("From reply".to_string()),
            ..Default::default()
        };
        let assembled = assemble_reply(&reply, &VisitorProfile::default());
        assert_eq!(assembled.primary.email_prompt.as_deref(), Some("From reply"));

        let reply = ChatReply {
            answer: json!({"mainText": "Hi", "emailPrompt": "From answer"}),
            ..Default::default()
        };
        let assembled = assemble_reply(&reply, &VisitorProfile::default());
        assert_eq!(assembled.primary.email_prompt.as_deref(), Some("From answer"));
    }

    #[test]
    fn test_bant_question_shows_other_input() {
        let assembled = assemble_reply(
            &ChatReply::text("Great! What's your budget for this project?"),
            &VisitorProfile::default(),
        );
        assert!(assembled.primary.show_other_input);
        assert!(assembled.primary.buttons.is_empty());
    }

    #[test]
    fn test_secondary_message() {
        let reply = ChatReply::text("Primary").with_secondary("By the way, we have a free trial.");
        let assembled = assemble_reply(&reply, &VisitorProfile::default());

        let secondary = assembled.secondary.unwrap();
        assert!(secondary.is_assistant());
        assert_eq!(secondary.content, "By the way, we have a free trial.");

        let blank = ChatReply::text("Primary").with_secondary("   ");
        assert!(assemble_reply(&blank, &VisitorProfile::default()).secondary.is_none());
    }

    #[test]
    fn test_hydrate_assistant_message() {
        let wire: WireMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "{\"mainText\": \"Welcome back!\", \"buttons\": [\"Pricing\"]}",
            "botMode": "sales",
            "topicsDiscussed": ["pricing"]
        }))
        .unwrap();

        let message = hydrate_message(&wire);
        assert!(message.is_assistant());
        assert_eq!(message.content, "Welcome back!");
        assert_eq!(message.buttons, vec!["Pricing"]);
        assert_eq!(message.topics_discussed, vec!["pricing"]);
    }

    #[test]
    fn test_hydrate_user_message_kept_verbatim() {
        let wire: WireMessage =
            serde_json::from_value(json!({"role": "user", "content": " Buttons: [a] "})).unwrap();

        let message = hydrate_message(&wire);
        assert!(message.is_user());
        assert_eq!(message.content, "Buttons: [a]");
        assert!(message.buttons.is_empty());
    }
}
