//! Section-change tracking for contextual lead questions.

use tracing::debug;

/// Remembers the last visible section and reports changes.
///
/// The widget arms its section timer whenever [`SectionTrigger::observe`]
/// returns `true`; arming replaces the pending timer, so only the most
/// recently entered section can produce a lead question.
#[derive(Debug, Clone, Default)]
pub struct SectionTrigger {
    last: Option<String>,
}

impl SectionTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the currently visible section. Returns whether it differs from
    /// the previously recorded one. Empty contexts are ignored.
    pub fn observe(&mut self, context: &str) -> bool {
        if context.trim().is_empty() {
            return false;
        }
        if self.last.as_deref() == Some(context) {
            return false;
        }

        debug!(chars = context.chars().count(), "SECTION_CHANGED");
        self.last = Some(context.to_string());
        true
    }

    /// The most recently recorded section.
    pub fn current(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
