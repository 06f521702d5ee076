//! Scripted model endpoint.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use dungeonforge_shared::{ChatRequest, ChatResponse};

use crate::infrastructure::ports::{ChatError, ChatPort};

/// Answers each agent from its own FIFO of replies and records every request.
///
/// An agent with no queued reply gets a transport error, which is how tests
/// simulate an unreachable endpoint.
#[derive(Debug, Default)]
pub struct ScriptedChat {
    replies: Mutex<BTreeMap<String, VecDeque<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, agent: &str, reply: impl Into<String>) {
        self.replies
            .lock()
            .expect("replies lock")
            .entry(agent.to_string())
            .or_default()
            .push_back(reply.into());
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn requests_for(&self, agent: &str) -> Vec<ChatRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.agent_name == agent)
            .collect()
    }

    /// Replies still queued for `agent`.
    pub fn pending(&self, agent: &str) -> usize {
        self.replies
            .lock()
            .expect("replies lock")
            .get(agent)
            .map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl ChatPort for ScriptedChat {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let agent = request.agent_name.clone();
        self.requests.lock().expect("requests lock").push(request);
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .get_mut(&agent)
            .and_then(VecDeque::pop_front);
        reply
            .map(ChatResponse::new)
            .ok_or_else(|| ChatError::Transport(format!("no scripted reply for {agent}")))
    }
}
