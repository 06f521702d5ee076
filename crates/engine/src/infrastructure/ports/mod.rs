//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The model endpoint (could swap the HTTP service for a local runner)
//! - World persistence (could swap JSON files for a database)
//! - Clock/Random (for testing)

mod error;
mod external;
mod testing;

pub use error::{ChatError, PersistenceError};
pub use external::{ChatPort, WorldRepo};
pub use testing::{shuffle, ClockPort, RandomPort};

#[cfg(test)]
pub use external::{MockChatPort, MockWorldRepo};
#[cfg(test)]
pub use testing::MockClockPort;
