//! Chat gateway: single requests and concurrent fan-out with per-call
//! timeouts, plus cleanup of structured model replies.

mod gateway;
pub mod json_format;

pub use gateway::ChatSystem;
pub use json_format::parse_structured;
