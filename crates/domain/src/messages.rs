//! Chat messages kept in agent short-term memory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    Human,
    Ai,
}

/// One entry of an agent's chat history. Human messages may carry opaque
/// context tags (for example `combat_kickoff_tag`) used to locate slices later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    Human {
        content: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        tags: BTreeMap<String, String>,
    },
    Ai {
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn human_with_tags(content: impl Into<String>, tags: BTreeMap<String, String>) -> Self {
        Self::Human {
            content: content.into(),
            tags,
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai {
            content: content.into(),
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Self::System { .. } => MessageRole::System,
            Self::Human { .. } => MessageRole::Human,
            Self::Ai { .. } => MessageRole::Ai,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::Human { content, .. } | Self::Ai { content } => {
                content
            }
        }
    }

    /// Value of a context tag; only human messages carry tags.
    pub fn tag(&self, key: &str) -> Option<&str> {
        match self {
            Self::Human { tags, .. } => tags.get(key).map(String::as_str),
            _ => None,
        }
    }
}
