//! Player-facing entry point: command text in, [`ResponseResult`] out.
//!
//! [`ResponseResult`]: dungeonforge_shared::ResponseResult

mod commands;

pub use commands::{handle_command, run_command};
