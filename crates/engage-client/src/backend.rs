//! HttpBackend implementation over the site's JSON API.

use async_trait::async_trait;
use engage_core::{
    ChatBackend, ChatReply, ChatRequest, ClearHistoryRequest, EngageError, HistoryQuery,
    HistoryResponse, NudgeEvent,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::BackendConfig;

const CHAT_PATH: &str = "/api/chat";
const NUDGE_PATH: &str = "/api/track-nudge";

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// A chat backend reached over HTTP.
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Create a new HttpBackend with the given configuration.
    pub fn new(config: BackendConfig) -> Result<Self, EngageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngageError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "HttpBackend initialized for {} (timeout: {}s)",
            config.api_url,
            config.timeout.as_secs()
        );

        Ok(Self { client, config })
    }

    /// Create an HttpBackend from environment variables.
    ///
    /// See [`BackendConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, EngageError> {
        Self::new(BackendConfig::from_env()?)
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Map a non-success response to [`EngageError::Api`].
    async fn check_status(response: Response) -> Result<Response, EngageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&error_text)
            .ok()
            .and_then(|body| body.error.or(body.message))
            .unwrap_or(error_text);

        Err(EngageError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, EngageError> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| EngageError::Decode(format!("Failed to parse response: {}", e)))
    }
}

fn network_error(e: reqwest::Error) -> EngageError {
    EngageError::Network(format!("Failed to send request: {}", e))
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryResponse, EngageError> {
        debug!(session_id = %query.session_id, "Fetching chat history");

        let response = self
            .client
            .get(self.config.endpoint(CHAT_PATH))
            .query(query)
            .send()
            .await
            .map_err(network_error)?;

        Self::decode(response).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, EngageError> {
        debug!("Sending chat request: {:?}", request);

        let response = self
            .client
            .post(self.config.endpoint(CHAT_PATH))
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        let reply: ChatReply = Self::decode(response).await?;
        debug!("Received chat reply: {:?}", reply);
        Ok(reply)
    }

    async fn clear_history(&self, request: &ClearHistoryRequest) -> Result<(), EngageError> {
        let response = self
            .client
            .delete(self.config.endpoint(CHAT_PATH))
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        Self::check_status(response).await?;
        info!(session_id = %request.session_id, "Cleared chat history");
        Ok(())
    }

    async fn track_nudge(&self, event: &NudgeEvent) -> Result<(), EngageError> {
        let response = self
            .client
            .post(self.config.endpoint(NUDGE_PATH))
            .json(event)
            .send()
            .await
            .map_err(network_error)?;

        Self::check_status(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "HttpBackend"
    }
}
