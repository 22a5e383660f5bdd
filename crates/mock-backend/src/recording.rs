//! Recording renderer - captures transcript changes for assertions.

use async_trait::async_trait;
use engage_core::{ChatMessage, TranscriptRenderer};
use tokio::sync::Mutex;

/// One change delivered to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Appended { index: usize, message: ChatMessage },
    Loading(bool),
    Cleared,
}

/// A renderer that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in delivery order.
    pub async fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().await.clone()
    }

    /// Messages appended since the last clear.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        let events = self.events.lock().await;
        let start = events
            .iter()
            .rposition(|e| matches!(e, RenderEvent::Cleared))
            .map_or(0, |i| i + 1);

        events[start..]
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Appended { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Contents of the messages appended since the last clear.
    pub async fn contents(&self) -> Vec<String> {
        self.messages().await.into_iter().map(|m| m.content).collect()
    }
}

#[async_trait]
impl TranscriptRenderer for RecordingRenderer {
    async fn message_appended(&self, index: usize, message: &ChatMessage) {
        self.events.lock().await.push(RenderEvent::Appended {
            index,
            message: message.clone(),
        });
    }

    async fn loading_changed(&self, loading: bool) {
        self.events.lock().await.push(RenderEvent::Loading(loading));
    }

    async fn cleared(&self) {
        self.events.lock().await.push(RenderEvent::Cleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_clears() {
        let renderer = RecordingRenderer::new();
        renderer.message_appended(0, &ChatMessage::assistant("old")).await;
        renderer.cleared().await;
        renderer.loading_changed(true).await;
        renderer.message_appended(0, &ChatMessage::user("new")).await;

        assert_eq!(renderer.events().await.len(), 4);
        assert_eq!(renderer.contents().await, vec!["new"]);
    }
}
