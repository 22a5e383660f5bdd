//! Conversation message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a wire role. Anything that is not `"user"` is treated as the assistant.
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Assistant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// The persona that produced an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotMode {
    #[default]
    Sales,
    LeadGeneration,
}

impl BotMode {
    /// Parse a backend persona name leniently.
    ///
    /// Returns `None` for unknown personas so callers can keep the current mode.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sales" => Some(Self::Sales),
            "leadgeneration" | "lead" | "leadgen" => Some(Self::LeadGeneration),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::LeadGeneration => "lead_generation",
        }
    }
}

/// Optional enrichment fields attached by the backend.
///
/// These are passed through untouched for rendering; only `clarifier_shown`,
/// `missing_dims`, `domain_match` and `confidence` take part in deciding
/// whether quick replies may be shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_summary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarifier_shown: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_dims: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Value>>,
}

impl Enrichment {
    /// Missing qualification dimensions, empty when absent.
    pub fn missing_dims(&self) -> &[String] {
        self.missing_dims.as_deref().unwrap_or(&[])
    }
}

/// A single entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    /// Normalized display text.
    pub content: String,
    /// Quick-reply labels, unique and in display order.
    #[serde(default)]
    pub buttons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_prompt: Option<String>,
    #[serde(default)]
    pub bot_mode: BotMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default)]
    pub topics_discussed: Vec<String>,
    /// Whether a free-text "Other" input accompanies the buttons.
    #[serde(default)]
    pub show_other_input: bool,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            buttons: Vec::new(),
            email_prompt: None,
            bot_mode: BotMode::default(),
            user_email: None,
            topics_discussed: Vec::new(),
            show_other_input: false,
            enrichment: Enrichment::default(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach quick-reply buttons, dropping empty and duplicate labels.
    pub fn with_buttons<I, T>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut seen = indexmap::IndexSet::new();
        for label in buttons {
            let label = label.into();
            if !label.trim().is_empty() {
                seen.insert(label);
            }
        }
        self.buttons = seen.into_iter().collect();
        self
    }

    /// Attach an email prompt. Blank prompts are ignored.
    pub fn with_email_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        if !prompt.trim().is_empty() {
            self.email_prompt = Some(prompt);
        }
        self
    }

    pub fn with_bot_mode(mut self, mode: BotMode) -> Self {
        self.bot_mode = mode;
        self
    }

    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
