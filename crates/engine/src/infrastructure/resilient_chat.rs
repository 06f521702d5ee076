//! Resilient chat client wrapper with exponential backoff retry
//!
//! Wraps any ChatPort implementation with retry logic to handle transient failures.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use dungeonforge_shared::{ChatRequest, ChatResponse};

use crate::infrastructure::ports::{ChatError, ChatPort};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries, just the initial attempt)
    pub max_retries: u32,
    /// Base delay in milliseconds before first retry
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing delays
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 5000,
            jitter_factor: 0.2,
        }
    }
}

/// Wrapper that adds retry logic to any chat client
pub struct ResilientChatClient {
    inner: Arc<dyn ChatPort>,
    config: RetryConfig,
}

impl ResilientChatClient {
    pub fn new(inner: Arc<dyn ChatPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Calculate delay for a given attempt number using exponential backoff with jitter
    fn calculate_delay(&self, attempt: u32) -> u64 {
        let base = self.config.base_delay_ms;
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        let jitter_range = (capped as f64 * self.config.jitter_factor) as i64;
        if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        }
    }

    fn is_retryable(error: &ChatError) -> bool {
        match error {
            ChatError::Transport(msg) => {
                !msg.contains("401") && !msg.contains("403") && !msg.contains("400")
            }
            ChatError::InvalidResponse(_) | ChatError::EmptyOutput => true,
            // The gateway owns the per-call deadline; retrying would overrun it.
            ChatError::Timeout { .. } => false,
        }
    }
}

#[async_trait]
impl ChatPort for ResilientChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.chat(request.clone()).await {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::info!(
                            attempt = attempt + 1,
                            agent = %request.agent_name,
                            "Chat request succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let is_retryable = Self::is_retryable(&e);

                    if attempt < self.config.max_retries && is_retryable {
                        let delay = self.calculate_delay(attempt + 1);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = self.config.max_retries,
                            delay_ms = delay,
                            error = %e,
                            agent = %request.agent_name,
                            "Chat request failed, retrying..."
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    } else if !is_retryable {
                        tracing::error!(
                            error = %e,
                            agent = %request.agent_name,
                            "Chat request failed with non-retryable error"
                        );
                        return Err(e);
                    }

                    last_error = Some(e);
                }
            }
        }

        let error =
            last_error.unwrap_or_else(|| ChatError::Transport("Unknown error".to_string()));
        tracing::error!(
            attempts = self.config.max_retries + 1,
            error = %error,
            agent = %request.agent_name,
            "Chat request failed after all retry attempts"
        );
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Chat double that fails a configurable number of times before succeeding
    struct FailingChat {
        failures_remaining: AtomicU32,
        error: ChatError,
    }

    impl FailingChat {
        fn new(failure_count: u32, error: ChatError) -> Self {
            Self {
                failures_remaining: AtomicU32::new(failure_count),
                error,
            }
        }
    }

    #[async_trait]
    impl ChatPort for FailingChat {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, ChatError> {
            let remaining = self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
            if remaining > 0 {
                Err(self.error.clone())
            } else {
                Ok(ChatResponse::new("Success!"))
            }
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 10,
            jitter_factor: 0.0,
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new("Aria", "hello", Vec::new())
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let mock = Arc::new(FailingChat::new(0, ChatError::Transport("test".into())));
        let client = ResilientChatClient::new(mock, RetryConfig::default());

        let result = client.chat(request()).await.expect("chat");
        assert_eq!(result.output, "Success!");
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let mock = Arc::new(FailingChat::new(2, ChatError::EmptyOutput));
        let client = ResilientChatClient::new(mock, fast_config(3));

        assert!(client.chat(request()).await.is_ok());
    }

    #[tokio::test]
    async fn fails_after_max_retries() {
        let mock = Arc::new(FailingChat::new(10, ChatError::Transport("down".into())));
        let client = ResilientChatClient::new(mock, fast_config(2));

        assert!(client.chat(request()).await.is_err());
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let mock = Arc::new(FailingChat::new(
            10,
            ChatError::Transport("401 Unauthorized".into()),
        ));
        let mock_ref = Arc::clone(&mock);
        let client = ResilientChatClient::new(mock, fast_config(3));

        assert!(client.chat(request()).await.is_err());
        assert_eq!(mock_ref.failures_remaining.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let client = ResilientChatClient::new(
            Arc::new(FailingChat::new(0, ChatError::EmptyOutput)),
            RetryConfig {
                max_retries: 5,
                base_delay_ms: 1000,
                max_delay_ms: 5000,
                jitter_factor: 0.0,
            },
        );

        assert_eq!(client.calculate_delay(1), 1000);
        assert_eq!(client.calculate_delay(2), 2000);
        assert_eq!(client.calculate_delay(3), 4000);
        assert_eq!(client.calculate_delay(4), 5000);
    }
}
