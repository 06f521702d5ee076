//! Response types for the player-facing surface
//!
//! Error codes are numbered so front ends can branch on them without parsing
//! messages; notifications wrap in-world events for the player's outbound buffer.

use serde::{Deserialize, Serialize};

use dungeonforge_domain::GameEvent;

// =============================================================================
// Response Result
// =============================================================================

/// Result of a player command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseResult {
    /// Command accepted
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// Command rejected
    Error {
        /// Error classification code
        code: ErrorCode,
        /// Human-readable error message
        message: String,
    },
}

impl ResponseResult {
    /// Create a success response with data
    pub fn success<T: Serialize>(data: T) -> Self {
        ResponseResult::Success {
            data: Some(serde_json::to_value(data).unwrap_or_default()),
        }
    }

    /// Create a success response without data
    pub fn success_empty() -> Self {
        ResponseResult::Success { data: None }
    }

    /// Create an error response
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ResponseResult::Error {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseResult::Success { .. })
    }
}

// =============================================================================
// Error Codes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Command text was malformed
    BadRequest,
    /// Command tag is not recognized
    UnknownCommand,
    /// Target actor or stage does not exist or is not reachable
    InvalidTarget,
    /// Command is not allowed in the current combat phase or game mode
    WrongPhase,
    /// Command is only available with debug commands enabled
    DebugDisabled,
    /// Failure inside the engine
    InternalError,
}

impl ErrorCode {
    /// Stable number surfaced to front ends.
    pub fn as_number(&self) -> u16 {
        match self {
            Self::BadRequest => 1000,
            Self::UnknownCommand => 1001,
            Self::InvalidTarget => 1002,
            Self::WrongPhase => 1003,
            Self::DebugDisabled => 1004,
            Self::InternalError => 5000,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.as_number())
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// One outbound message for the player, consumed and cleared by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNotification {
    pub header: String,
    pub data: GameEvent,
}

impl PlayerNotification {
    pub fn new(header: impl Into<String>, data: GameEvent) -> Self {
        Self {
            header: header.into(),
            data,
        }
    }
}
