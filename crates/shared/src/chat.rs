//! Model endpoint contract.
//!
//! The service is stateless: every request carries the agent's full chat history.

use serde::{Deserialize, Serialize};

use dungeonforge_domain::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub agent_name: String,
    pub user_name: String,
    pub input: String,
    pub chat_history: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(
        agent_name: impl Into<String>,
        input: impl Into<String>,
        chat_history: Vec<ChatMessage>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            user_name: String::new(),
            input: input.into(),
            chat_history,
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub output: String,
}

impl ChatResponse {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_matches_endpoint_field_names() {
        let request = ChatRequest::new("Aria", "Describe the room", vec![ChatMessage::system("You are Aria")])
            .with_user_name("player-1");
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["agent_name"], "Aria");
        assert_eq!(json["user_name"], "player-1");
        assert_eq!(json["input"], "Describe the room");
        assert_eq!(json["chat_history"][0]["type"], "system");
    }

    #[test]
    fn missing_output_defaults_to_empty() {
        let response: ChatResponse = serde_json::from_str("{}").expect("parse");
        assert!(response.output.is_empty());
    }
}
