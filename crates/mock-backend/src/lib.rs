//! Scripted chat backends and recording renderers for testing.
//!
//! This crate provides test implementations of the `ChatBackend` and
//! `TranscriptRenderer` traits:
//! - `ScriptedBackend` - Answers from a queue of canned replies and records every call
//! - `DelayedBackend` - Wraps another backend with artificial latency
//! - `FailingBackend` - Fails every call
//! - `RecordingRenderer` - Records every transcript change
//!
//! For a live service, use the `engage-client` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_backend::{ChatBackend, ChatReply, ChatRequest, ScriptedBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_backend::EngageError> {
//!     let backend = ScriptedBackend::new().with_reply(ChatReply::text("Hi there!"));
//!
//!     let request = ChatRequest::new("session-1", "https://example.com/").question("Hello");
//!     let reply = backend.send(&request).await?;
//!
//!     assert_eq!(reply.answer, "Hi there!");
//!     assert_eq!(backend.requests().await.len(), 1);
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
mod recording;
mod scripted;

pub use engage_core::{
    async_trait, ChatBackend, ChatMessage, ChatReply, ChatRequest, ClearHistoryRequest,
    EngageError, HistoryQuery, HistoryResponse, NudgeEvent, TranscriptRenderer, WireMessage,
};

pub use delayed::DelayedBackend;
pub use failing::FailingBackend;
pub use recording::{RecordingRenderer, RenderEvent};
pub use scripted::ScriptedBackend;
