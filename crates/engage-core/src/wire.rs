//! Request and response types for the chat backend.
//!
//! Field names follow the backend's camelCase JSON. Optional request fields
//! are omitted entirely when unset so the backend can tell "not sent" apart
//! from `false`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Enrichment;

/// `messageType` for a question the visitor typed.
pub const MESSAGE_TYPE_TEXT: &str = "text";

/// `messageType` for a quick-reply button click.
pub const MESSAGE_TYPE_BUTTON: &str = "button";

/// Query for `GET /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub session_id: String,
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
}

impl HistoryQuery {
    pub fn new(session_id: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            page_url: page_url.into(),
            admin_id: None,
        }
    }

    pub fn with_admin_id(mut self, admin_id: Option<String>) -> Self {
        self.admin_id = admin_id;
        self
    }
}

/// A transcript entry as stored by the backend.
///
/// `content` may be a plain string or an already-structured answer object,
/// so it is kept as raw JSON and normalized on the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_discussed: Option<Vec<String>>,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

/// Response of `GET /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<WireMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_summary: Option<String>,
}

/// Body of `POST /api/chat`.
///
/// One request type covers every kind of turn; the constructors set the
/// flags that distinguish them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proactive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_been_greeted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_page_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited_pages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_question_request: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_count_client: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_inactive_for_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

impl ChatRequest {
    /// Create a bare request for a session and page.
    pub fn new(session_id: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            page_url: page_url.into(),
            ..Default::default()
        }
    }

    /// Mark as a proactive (unsolicited) greeting.
    pub fn proactive(mut self, has_been_greeted: bool) -> Self {
        self.proactive = Some(true);
        self.has_been_greeted = Some(has_been_greeted);
        self
    }

    /// Mark as a follow-up after the previous assistant message went unanswered.
    pub fn followup(mut self, count: u32) -> Self {
        self.followup = Some(true);
        self.followup_count = Some(count);
        self
    }

    /// Mark as a contextual lead question for a newly visible page section.
    pub fn lead_question(mut self, section: impl Into<String>, previous: Vec<String>) -> Self {
        self.lead_question_request = Some(true);
        self.contextual_page_context = Some(section.into());
        self.previous_questions = Some(previous);
        self
    }

    /// Carry a visitor question.
    pub fn question(mut self, text: impl Into<String>) -> Self {
        self.question = Some(text.into());
        self
    }

    pub fn with_admin_id(mut self, admin_id: Option<String>) -> Self {
        self.admin_id = admin_id;
        self
    }

    pub fn with_visited_pages(mut self, pages: Vec<String>) -> Self {
        self.visited_pages = Some(pages);
        self
    }

    pub fn with_page_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        if !context.is_empty() {
            self.contextual_page_context = Some(context);
        }
        self
    }

    pub fn with_assistant_count(mut self, count: usize) -> Self {
        self.assistant_count_client = Some(count);
        self
    }

    pub fn with_inactivity(mut self, millis: u64) -> Self {
        self.user_inactive_for_ms = Some(millis);
        self
    }

    /// Tag how the visitor produced the question ([`MESSAGE_TYPE_TEXT`] or
    /// [`MESSAGE_TYPE_BUTTON`]).
    pub fn with_message_type(mut self, kind: impl Into<String>) -> Self {
        self.message_type = Some(kind.into());
        self
    }

    /// Whether this request was triggered without a visitor message.
    pub fn is_background(&self) -> bool {
        self.question.is_none()
    }
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Either a string (possibly with embedded JSON) or a structured object.
    #[serde(default)]
    pub answer: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_discussed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_prompt: Option<String>,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl ChatReply {
    /// A reply carrying only a plain-text answer.
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: Value::String(answer.into()),
            ..Default::default()
        }
    }

    /// Attach a secondary message.
    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(Value::String(secondary.into()));
        self
    }

    /// Attach explicit API buttons.
    pub fn with_buttons<I, T>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.buttons = Some(
            buttons
                .into_iter()
                .map(|b| Value::String(b.into()))
                .collect(),
        );
        self
    }
}

/// Body of `DELETE /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearHistoryRequest {
    pub session_id: String,
    pub clear_history: bool,
}

impl ClearHistoryRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            clear_history: true,
        }
    }
}

/// Body of `POST /api/track-nudge`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NudgeEvent {
    pub label: String,
    pub context: String,
    /// RFC 3339 timestamp of the click.
    pub timestamp: String,
}
