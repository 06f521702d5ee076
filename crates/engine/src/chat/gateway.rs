//! Chat gateway over a [`ChatPort`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use dungeonforge_shared::{ChatRequest, ChatResponse};

use crate::infrastructure::ports::{ChatError, ChatPort};

/// Issues chat requests with a per-call timeout.
///
/// `gather` runs every request concurrently and yields once the last one
/// completes; results come back in request order regardless of completion order.
#[derive(Clone)]
pub struct ChatSystem {
    port: Arc<dyn ChatPort>,
    timeout: Duration,
    user_name: String,
}

impl ChatSystem {
    pub fn new(port: Arc<dyn ChatPort>, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            user_name: String::new(),
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One request under the configured timeout.
    pub async fn request(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let request = if request.user_name.is_empty() {
            request.with_user_name(self.user_name.clone())
        } else {
            request
        };
        let agent = request.agent_name.clone();
        let started = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.port.chat(request)).await {
            Ok(Ok(response)) if response.output.trim().is_empty() => Err(ChatError::EmptyOutput),
            Ok(result) => result,
            Err(_) => Err(ChatError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        };

        match &result {
            Ok(_) => tracing::debug!(
                agent = %agent,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Chat request completed"
            ),
            Err(e) => tracing::warn!(
                agent = %agent,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Chat request failed"
            ),
        }
        result
    }

    /// Run all requests concurrently; the i-th result belongs to the i-th request.
    pub async fn gather(&self, requests: Vec<ChatRequest>) -> Vec<Result<ChatResponse, ChatError>> {
        if requests.is_empty() {
            return Vec::new();
        }
        tracing::debug!(count = requests.len(), "Gathering chat requests");
        join_all(requests.into_iter().map(|request| self.request(request))).await
    }

    /// Blocking variant for callers outside the async runtime.
    ///
    /// Must not be called from within a tokio runtime.
    pub fn request_blocking(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        runtime.block_on(self.request(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockChatPort;
    use async_trait::async_trait;

    /// Replies after a per-agent delay, echoing the agent name.
    struct DelayedEcho;

    #[async_trait]
    impl ChatPort for DelayedEcho {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
            let delay = match request.agent_name.as_str() {
                "slow" => 60,
                "stuck" => 10_000,
                _ => 1,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(ChatResponse::new(format!("reply from {}", request.agent_name)))
        }
    }

    #[tokio::test]
    async fn gather_returns_results_in_request_order() {
        let chat = ChatSystem::new(Arc::new(DelayedEcho), Duration::from_secs(5));
        let results = chat
            .gather(vec![
                ChatRequest::new("slow", "a", Vec::new()),
                ChatRequest::new("fast", "b", Vec::new()),
            ])
            .await;

        let outputs: Vec<String> = results
            .into_iter()
            .map(|r| r.expect("reply").output)
            .collect();
        assert_eq!(outputs, vec!["reply from slow", "reply from fast"]);
    }

    #[tokio::test]
    async fn slow_call_times_out_without_blocking_others() {
        let chat = ChatSystem::new(Arc::new(DelayedEcho), Duration::from_millis(200));
        let results = chat
            .gather(vec![
                ChatRequest::new("stuck", "a", Vec::new()),
                ChatRequest::new("fast", "b", Vec::new()),
            ])
            .await;

        assert!(matches!(results[0], Err(ChatError::Timeout { .. })));
        assert!(results[1].is_ok());
    }

    #[tokio::test]
    async fn empty_output_is_a_failure() {
        let mut port = MockChatPort::new();
        port.expect_chat()
            .returning(|_| Ok(ChatResponse::new("   ")));
        let chat = ChatSystem::new(Arc::new(port), Duration::from_secs(1));

        let result = chat.request(ChatRequest::new("Aria", "hi", Vec::new())).await;
        assert_eq!(result, Err(ChatError::EmptyOutput));
    }

    #[tokio::test]
    async fn user_name_is_filled_in() {
        let mut port = MockChatPort::new();
        port.expect_chat()
            .withf(|request| request.user_name == "ada")
            .times(1)
            .returning(|_| Ok(ChatResponse::new("ok")));
        let chat = ChatSystem::new(Arc::new(port), Duration::from_secs(1)).with_user_name("ada");

        assert!(chat
            .request(ChatRequest::new("Aria", "hi", Vec::new()))
            .await
            .is_ok());
    }

    #[test]
    fn blocking_request_runs_outside_a_runtime() {
        let chat = ChatSystem::new(Arc::new(DelayedEcho), Duration::from_secs(5));
        let response = chat
            .request_blocking(ChatRequest::new("fast", "hi", Vec::new()))
            .expect("reply");
        assert_eq!(response.output, "reply from fast");
    }
}
