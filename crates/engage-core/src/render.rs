//! Renderer trait and implementations.

use async_trait::async_trait;

use crate::message::ChatMessage;

/// Receives transcript changes for display.
///
/// Abstracted to support different front ends (terminal, tests, etc.)
#[async_trait]
pub trait TranscriptRenderer: Send + Sync {
    /// A message was appended at `index`.
    async fn message_appended(&self, index: usize, message: &ChatMessage);

    /// A direct send started or finished.
    async fn loading_changed(&self, loading: bool);

    /// The transcript was cleared by a reset.
    async fn cleared(&self);
}

/// A renderer that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpRenderer;

#[async_trait]
impl TranscriptRenderer for NoOpRenderer {
    async fn message_appended(&self, _index: usize, _message: &ChatMessage) {}

    async fn loading_changed(&self, _loading: bool) {}

    async fn cleared(&self) {}
}

/// A renderer that logs every transcript change.
#[derive(Debug, Clone, Default)]
pub struct LoggingRenderer;

#[async_trait]
impl TranscriptRenderer for LoggingRenderer {
    async fn message_appended(&self, index: usize, message: &ChatMessage) {
        tracing::info!(
            "[{}] {}: {} (buttons: {:?})",
            index,
            message.role.as_str(),
            message.content,
            message.buttons
        );
    }

    async fn loading_changed(&self, loading: bool) {
        tracing::debug!("Loading: {}", loading);
    }

    async fn cleared(&self) {
        tracing::info!("Transcript cleared");
    }
}
