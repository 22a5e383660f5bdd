//! Visitor typing detection.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks whether the visitor is currently typing.
///
/// The visitor is typing while the input is non-empty and the last keystroke
/// was less than `idle_after` ago.
#[derive(Debug, Clone)]
pub struct TypingTracker {
    idle_after: Duration,
    last_keystroke: Option<Instant>,
}

impl TypingTracker {
    pub fn new(idle_after: Duration) -> Self {
        Self {
            idle_after,
            last_keystroke: None,
        }
    }

    /// Record a change of the input box. Returns whether the visitor is now typing.
    pub fn input_changed(&mut self, text: &str, now: Instant) -> bool {
        if text.trim().is_empty() {
            self.last_keystroke = None;
            false
        } else {
            self.last_keystroke = Some(now);
            true
        }
    }

    /// The input was submitted or cleared.
    pub fn clear(&mut self) {
        self.last_keystroke = None;
    }

    pub fn is_typing(&self, now: Instant) -> bool {
        self.last_keystroke
            .is_some_and(|last| now.saturating_duration_since(last) < self.idle_after)
    }
}
