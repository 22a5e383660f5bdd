//! Failing backend - every call errors.

use async_trait::async_trait;
use engage_core::{
    ChatBackend, ChatReply, ChatRequest, ClearHistoryRequest, EngageError, HistoryQuery,
    HistoryResponse, NudgeEvent,
};
use tokio::sync::Mutex;

/// A backend whose every operation fails with a network error.
///
/// Counts calls so tests can assert that nothing is retried.
#[derive(Debug, Default)]
pub struct FailingBackend {
    reason: String,
    calls: Mutex<usize>,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self::with_reason("connection refused")
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            calls: Mutex::new(0),
        }
    }

    /// Number of calls made so far, across all operations.
    pub async fn calls(&self) -> usize {
        *self.calls.lock().await
    }

    async fn fail<T>(&self) -> Result<T, EngageError> {
        *self.calls.lock().await += 1;
        Err(EngageError::Network(self.reason.clone()))
    }
}

#[async_trait]
impl ChatBackend for FailingBackend {
    async fn fetch_history(&self, _query: &HistoryQuery) -> Result<HistoryResponse, EngageError> {
        self.fail().await
    }

    async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, EngageError> {
        self.fail().await
    }

    async fn clear_history(&self, _request: &ClearHistoryRequest) -> Result<(), EngageError> {
        self.fail().await
    }

    async fn track_nudge(&self, _event: &NudgeEvent) -> Result<(), EngageError> {
        self.fail().await
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_call_fails() {
        let backend = FailingBackend::with_reason("offline");

        let err = backend.send(&ChatRequest::new("s", "/")).await.unwrap_err();
        assert_eq!(err.to_string(), "network error: offline");
        assert!(backend.fetch_history(&HistoryQuery::new("s", "/")).await.is_err());
        assert!(backend.clear_history(&ClearHistoryRequest::new("s")).await.is_err());
        assert_eq!(backend.calls().await, 3);
    }
}
