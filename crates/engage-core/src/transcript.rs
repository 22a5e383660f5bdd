//! Append-only conversation transcript.

use crate::message::{ChatMessage, Role};

/// Ordered message log driving render and follow-up eligibility.
///
/// Messages are only ever appended; nothing reorders or rewrites prior
/// entries. The only bulk operation is [`Transcript::clear`], used by reset.
///
/// # Example
///
/// ```rust
/// use engage_core::{ChatMessage, Transcript};
///
/// let mut transcript = Transcript::new();
/// transcript.push(ChatMessage::assistant("Hi! Looking for anything specific?"));
/// transcript.push(ChatMessage::user("Pricing, please"));
///
/// assert_eq!(transcript.len(), 2);
/// assert_eq!(transcript.assistant_count(), 1);
/// assert!(transcript.last().unwrap().is_user());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of assistant messages so far.
    pub fn assistant_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_assistant()).count()
    }

    /// Whether the most recent entry came from the assistant.
    pub fn last_is_assistant(&self) -> bool {
        self.last().map(ChatMessage::is_assistant).unwrap_or(false)
    }

    /// Contents of every assistant message, oldest first.
    pub fn assistant_contents(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.is_assistant())
            .map(|m| m.content.clone())
            .collect()
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Render the conversation as plain text for copying or saving.
    pub fn export_text(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            let speaker = match message.role {
                Role::User => "You",
                Role::Assistant => "Assistant",
            };
            out.push_str(speaker);
            out.push_str(": ");
            out.push_str(message.content.trim());
            out.push('\n');
            if !message.buttons.is_empty() {
                out.push_str("  Options: ");
                out.push_str(&message.buttons.join(" | "));
                out.push('\n');
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}
