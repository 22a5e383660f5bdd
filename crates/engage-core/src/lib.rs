//! Core traits and types for the proactive chat engagement engine.
//!
//! This crate provides the shared vocabulary for every other crate in the
//! workspace. It defines:
//!
//! - [`ChatMessage`] / [`Transcript`] - The conversation data model
//! - [`ChatBackend`] - The trait every chat backend implements
//! - [`KeyValueStore`] - Client-side storage (session id, greeted flag, visited pages)
//! - [`TranscriptRenderer`] - Where appended messages are delivered for display
//! - [`EngageError`] - Error types shared across the workspace
//!
//! # Example
//!
//! ```rust
//! use engage_core::{
//!     async_trait, ChatBackend, ChatReply, ChatRequest, ClearHistoryRequest, EngageError,
//!     HistoryQuery, HistoryResponse, NudgeEvent,
//! };
//!
//! struct HelloBackend;
//!
//! #[async_trait]
//! impl ChatBackend for HelloBackend {
//!     async fn fetch_history(&self, _query: &HistoryQuery) -> Result<HistoryResponse, EngageError> {
//!         Ok(HistoryResponse::default())
//!     }
//!
//!     async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, EngageError> {
//!         Ok(ChatReply::text("Hello!"))
//!     }
//!
//!     async fn clear_history(&self, _request: &ClearHistoryRequest) -> Result<(), EngageError> {
//!         Ok(())
//!     }
//!
//!     async fn track_nudge(&self, _event: &NudgeEvent) -> Result<(), EngageError> {
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "HelloBackend"
//!     }
//! }
//! ```

mod backend;
mod error;
mod message;
mod render;
mod store;
mod transcript;
mod wire;

pub use backend::ChatBackend;
pub use error::EngageError;
pub use message::{BotMode, ChatMessage, Enrichment, Role};
pub use render::{LoggingRenderer, NoOpRenderer, TranscriptRenderer};
pub use store::{
    KeyValueStore, MemoryStore, CLEAR_HISTORY_BEFORE_PROACTIVE_KEY, GREETED_KEY, SESSION_ID_KEY,
    VISITED_PAGES_KEY,
};
pub use transcript::Transcript;
pub use wire::{
    ChatReply, ChatRequest, ClearHistoryRequest, HistoryQuery, HistoryResponse, NudgeEvent,
    WireMessage, MESSAGE_TYPE_BUTTON, MESSAGE_TYPE_TEXT,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
