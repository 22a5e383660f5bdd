//! Error types for engagement operations.

use thiserror::Error;

/// Errors that can occur while talking to the chat backend or client storage.
#[derive(Debug, Error)]
pub enum EngageError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Client storage is unavailable or rejected the operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An edit targeted something other than a prior user message.
    #[error("message {0} is not an editable user message")]
    InvalidEdit(usize),

    /// The widget has been shut down.
    #[error("widget shut down")]
    ShutDown,
}

impl From<serde_json::Error> for EngageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
