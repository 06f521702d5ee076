//! HTTP client for the model endpoint.
//!
//! The endpoint is stateless: each POST carries the agent's full history and
//! answers with `{output}`.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use dungeonforge_shared::{ChatRequest, ChatResponse};

use crate::infrastructure::ports::{ChatError, ChatPort};

/// Default chat endpoint URL.
pub const DEFAULT_CHAT_URL: &str = "http://localhost:8100/v1/chat";

/// Client for the chat endpoint.
#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    url: String,
}

impl HttpChatClient {
    pub fn new(url: &str) -> Self {
        // Use 120 second timeout at the transport level (model replies can be slow);
        // the gateway applies the per-call timeout on top.
        Self::with_timeout(url, 120)
    }

    pub fn with_timeout(url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Create client from `DUNGEONFORGE_CHAT_URL`, falling back to the default URL.
    pub fn from_env() -> Self {
        let url =
            std::env::var("DUNGEONFORGE_CHAT_URL").unwrap_or_else(|_| DEFAULT_CHAT_URL.to_string());
        Self::new(&url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpChatClient {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_URL)
    }
}

#[async_trait]
impl ChatPort for HttpChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .map_err(|e| ChatError::Transport(e.to_string()))?;
            return Err(ChatError::Transport(format!("{status}: {error_text}")));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        if reply.output.trim().is_empty() {
            return Err(ChatError::EmptyOutput);
        }
        Ok(reply)
    }
}
