//! The ChatBackend trait definition.

use async_trait::async_trait;

use crate::error::EngageError;
use crate::wire::{
    ChatReply, ChatRequest, ClearHistoryRequest, HistoryQuery, HistoryResponse, NudgeEvent,
};

/// The remote chat service the widget talks to.
///
/// Implementations range from the HTTP client in `engage-client` to scripted
/// test doubles. This trait is object-safe and can be used as
/// `Arc<dyn ChatBackend>`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Load the stored conversation for a session.
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryResponse, EngageError>;

    /// Send a turn (visitor question, proactive greeting, follow-up or lead question).
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, EngageError>;

    /// Delete the stored conversation for a session.
    async fn clear_history(&self, request: &ClearHistoryRequest) -> Result<(), EngageError>;

    /// Record a quick-reply click for analytics.
    async fn track_nudge(&self, event: &NudgeEvent) -> Result<(), EngageError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}
