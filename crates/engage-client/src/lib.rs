//! HTTP chat backend for the engagement engine.
//!
//! Talks to the site's chat API:
//!
//! - `GET /api/chat` - conversation history for a session
//! - `POST /api/chat` - every kind of chat turn
//! - `DELETE /api/chat` - clear a session's history
//! - `POST /api/track-nudge` - quick-reply click tracking
//!
//! # Example
//!
//! ```rust,no_run
//! use engage_client::{BackendConfig, HttpBackend};
//! use engage_core::{ChatBackend, ChatRequest};
//!
//! # async fn run() -> Result<(), engage_core::EngageError> {
//! let backend = HttpBackend::new(BackendConfig::builder().api_url("https://example.com").build())?;
//! let reply = backend
//!     .send(&ChatRequest::new("session-1", "https://example.com/").question("Hi"))
//!     .await?;
//! println!("{}", reply.answer);
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;

pub use backend::HttpBackend;
pub use config::{BackendConfig, BackendConfigBuilder, DEFAULT_TIMEOUT_SECS};
