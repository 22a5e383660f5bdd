//! Delayed backend - wraps another backend with artificial latency.

use std::time::Duration;

use async_trait::async_trait;
use engage_core::{
    ChatBackend, ChatReply, ChatRequest, ClearHistoryRequest, EngageError, HistoryQuery,
    HistoryResponse, NudgeEvent,
};
use tokio::time::sleep;

/// A backend that delays `send` before delegating to an inner backend.
///
/// Useful for simulating a slow proactive request that is still in flight
/// when the visitor sends a message. Works with paused tokio time.
pub struct DelayedBackend<B: ChatBackend> {
    inner: B,
    delay: Duration,
    background_only: bool,
}

impl<B: ChatBackend> DelayedBackend<B> {
    /// Create a new DelayedBackend wrapping the given backend with the specified delay.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            background_only: false,
        }
    }

    /// Create a backend with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Create a backend with a delay in seconds.
    pub fn with_secs(inner: B, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// Only delay requests that carry no visitor question.
    pub fn background_only(mut self) -> Self {
        self.background_only = true;
        self
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: ChatBackend> ChatBackend for DelayedBackend<B> {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryResponse, EngageError> {
        self.inner.fetch_history(query).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, EngageError> {
        if !self.background_only || request.is_background() {
            sleep(self.delay).await;
        }
        self.inner.send(request).await
    }

    async fn clear_history(&self, request: &ClearHistoryRequest) -> Result<(), EngageError> {
        self.inner.clear_history(request).await
    }

    async fn track_nudge(&self, event: &NudgeEvent) -> Result<(), EngageError> {
        self.inner.track_nudge(event).await
    }

    fn name(&self) -> &str {
        "DelayedBackend"
    }
}
