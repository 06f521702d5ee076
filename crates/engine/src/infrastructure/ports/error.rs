//! Error types for port operations.

/// Failures of a single chat-gateway call.
///
/// Callers treat every variant as an empty reply: the pending memory
/// exchange is discarded and no component is replaced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Chat request timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("Chat transport failed: {0}")]
    Transport(String),
    #[error("Chat reply had empty output")]
    EmptyOutput,
    #[error("Invalid chat response: {0}")]
    InvalidResponse(String),
}

/// World document storage errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem operation failed - includes operation name for tracing.
    #[error("I/O error in {operation}: {message}")]
    Io {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Document was written by an incompatible schema version.
    #[error("Incompatible world version {found} (expected {expected})")]
    IncompatibleVersion { found: String, expected: String },

    /// No world document and no boot data to build one from.
    #[error("World {0} not found")]
    MissingWorld(String),
}

impl PersistenceError {
    /// Create an Io error with operation context.
    pub fn io(operation: &'static str, message: impl ToString) -> Self {
        Self::Io {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}
