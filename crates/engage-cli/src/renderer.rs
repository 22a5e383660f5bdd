//! Prints the transcript to the terminal.

use async_trait::async_trait;
use engage::{ChatMessage, TranscriptRenderer};
use engage_core::Role;

/// Writes each transcript change to stdout.
#[derive(Debug, Clone, Default)]
pub struct TerminalRenderer;

/// Format a message the way the terminal shows it.
pub fn format_message(index: usize, message: &ChatMessage) -> String {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "bot",
    };

    let mut out = format!("[{}] {}: {}", index, speaker, message.content);

    if !message.buttons.is_empty() {
        let buttons = message
            .buttons
            .iter()
            .enumerate()
            .map(|(i, label)| format!("({}) {}", i + 1, label))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str("\n    ");
        out.push_str(&buttons);
        if message.show_other_input {
            out.push_str("  (or type your own answer)");
        }
    }

    if let Some(prompt) = &message.email_prompt {
        out.push_str("\n    ");
        out.push_str(prompt);
    }

    out
}

#[async_trait]
impl TranscriptRenderer for TerminalRenderer {
    async fn message_appended(&self, index: usize, message: &ChatMessage) {
        println!("{}", format_message(index, message));
    }

    async fn loading_changed(&self, loading: bool) {
        if loading {
            println!("    ...");
        }
    }

    async fn cleared(&self) {
        println!("--- conversation cleared ---");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plain_message() {
        let message = ChatMessage::user("Hi");
        assert_eq!(format_message(0, &message), "[0] you: Hi");
    }

    #[test]
    fn test_format_buttons_and_prompt() {
        let mut message = ChatMessage::assistant("What is your budget?");
        message.buttons = vec!["Under $1k".to_string(), "Over $1k".to_string()];
        message.show_other_input = true;
        message.email_prompt = Some("Drop your email for a quote".to_string());

        assert_eq!(
            format_message(3, &message),
            "[3] bot: What is your budget?\n    (1) Under $1k  (2) Over $1k  (or type your own answer)\n    Drop your email for a quote"
        );
    }
}
