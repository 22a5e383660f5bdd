//! Scripted backend - answers from a queue and records every call.

use std::collections::VecDeque;

use async_trait::async_trait;
use engage_core::{
    ChatBackend, ChatReply, ChatRequest, ClearHistoryRequest, EngageError, HistoryQuery,
    HistoryResponse, NudgeEvent,
};
use tokio::sync::Mutex;
use tracing::debug;

enum Scripted {
    Reply(ChatReply),
    Fail(EngageError),
}

/// A backend that replays canned replies in order.
///
/// When the queue runs dry, visitor questions are echoed back and background
/// requests get a generic greeting. Every call is recorded for assertions.
#[derive(Default)]
pub struct ScriptedBackend {
    history: Mutex<HistoryResponse>,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ChatRequest>>,
    history_queries: Mutex<Vec<HistoryQuery>>,
    clears: Mutex<Vec<ClearHistoryRequest>>,
    nudges: Mutex<Vec<NudgeEvent>>,
}

impl ScriptedBackend {
    /// Create a backend with no history and an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this history from `fetch_history`.
    pub fn with_history(mut self, history: HistoryResponse) -> Self {
        *self.history.get_mut() = history;
        self
    }

    /// Queue a reply.
    pub fn with_reply(mut self, reply: ChatReply) -> Self {
        self.script.get_mut().push_back(Scripted::Reply(reply));
        self
    }

    /// Queue a failure.
    pub fn with_error(mut self, error: EngageError) -> Self {
        self.script.get_mut().push_back(Scripted::Fail(error));
        self
    }

    /// Queue a reply after construction.
    pub async fn push_reply(&self, reply: ChatReply) {
        self.script.lock().await.push_back(Scripted::Reply(reply));
    }

    /// Queue a failure after construction.
    pub async fn push_error(&self, error: EngageError) {
        self.script.lock().await.push_back(Scripted::Fail(error));
    }

    /// Every `send` request received, in order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    /// Every history query received.
    pub async fn history_queries(&self) -> Vec<HistoryQuery> {
        self.history_queries.lock().await.clone()
    }

    /// Every clear-history request received.
    pub async fn clears(&self) -> Vec<ClearHistoryRequest> {
        self.clears.lock().await.clone()
    }

    /// Every nudge event received.
    pub async fn nudges(&self) -> Vec<NudgeEvent> {
        self.nudges.lock().await.clone()
    }

    /// Number of scripted entries not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }

    fn fallback_reply(request: &ChatRequest) -> ChatReply {
        match &request.question {
            Some(question) => ChatReply::text(format!("You asked: {question}")),
            None => ChatReply::text("How can I help you today?"),
        }
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryResponse, EngageError> {
        self.history_queries.lock().await.push(query.clone());
        Ok(self.history.lock().await.clone())
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, EngageError> {
        self.requests.lock().await.push(request.clone());

        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(error)) => {
                debug!(error = %error, "SCRIPTED_FAILURE");
                Err(error)
            }
            None => Ok(Self::fallback_reply(request)),
        }
    }

    async fn clear_history(&self, request: &ClearHistoryRequest) -> Result<(), EngageError> {
        self.clears.lock().await.push(request.clone());
        Ok(())
    }

    async fn track_nudge(&self, event: &NudgeEvent) -> Result<(), EngageError> {
        self.nudges.lock().await.push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "ScriptedBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order() {
        let backend = ScriptedBackend::new()
            .with_reply(ChatReply::text("first"))
            .with_error(EngageError::Network("down".to_string()))
            .with_reply(ChatReply::text("third"));

        let request = ChatRequest::new("s", "/").question("hi");
        assert_eq!(backend.send(&request).await.unwrap().answer, "first");
        assert!(matches!(backend.send(&request).await, Err(EngageError::Network(_))));
        assert_eq!(backend.send(&request).await.unwrap().answer, "third");
        assert_eq!(backend.remaining().await, 0);
        assert_eq!(backend.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn test_fallback_replies() {
        let backend = ScriptedBackend::new();

        let reply = backend.send(&ChatRequest::new("s", "/").question("Pricing?")).await.unwrap();
        assert_eq!(reply.answer, "You asked: Pricing?");

        let reply = backend.send(&ChatRequest::new("s", "/").proactive(false)).await.unwrap();
        assert_eq!(reply.answer, "How can I help you today?");
    }

    #[tokio::test]
    async fn test_records_side_calls() {
        let backend = ScriptedBackend::new().with_history(HistoryResponse {
            history: Vec::new(),
            page_summary: Some("Landing".to_string()),
        });

        let history = backend.fetch_history(&HistoryQuery::new("s", "/")).await.unwrap();
        assert_eq!(history.page_summary.as_deref(), Some("Landing"));

        backend.clear_history(&ClearHistoryRequest::new("s")).await.unwrap();
        backend
            .track_nudge(&NudgeEvent {
                label: "Pricing".to_string(),
                context: "/".to_string(),
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(backend.history_queries().await.len(), 1);
        assert_eq!(backend.clears().await[0].session_id, "s");
        assert_eq!(backend.nudges().await[0].label, "Pricing");
        assert_eq!(backend.name(), "ScriptedBackend");
    }
}
