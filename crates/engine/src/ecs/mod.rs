//! Entity store: entities with one component per kind, matcher groups and
//! per-subscriber collectors that feed reactive processors.

mod matcher;
mod store;

pub use matcher::{GroupEvent, Matcher};
pub use store::{CollectorId, EntityStore};
