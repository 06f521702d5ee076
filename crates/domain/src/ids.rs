use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Store-local handle; never persisted.
define_id!(EntityId);
// Value of the world-scoped monotonic allocator.
define_id!(RuntimeIndex);
// Stable identity of an authored or spawned instance.
define_id!(Guid);

/// Type tag mixed into runtime guids so they never collide with authored ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidTag {
    WorldSystem = 1,
    Stage = 2,
    Actor = 3,
}

impl Guid {
    /// Authored guids must stay below this bound.
    pub const AUTHORED_LIMIT: u64 = 1 << 48;

    /// Compose a guid for an instance created while the world is running.
    pub fn runtime(tag: GuidTag, index: RuntimeIndex) -> Self {
        Self(((tag as u64) << 48) | (index.get() & (Self::AUTHORED_LIMIT - 1)))
    }

    pub fn is_runtime(&self) -> bool {
        self.0 >= Self::AUTHORED_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_guids_do_not_overlap_authored_range() {
        let guid = Guid::runtime(GuidTag::Actor, RuntimeIndex::new(7));
        assert!(guid.is_runtime());
        assert!(!Guid::new(1_000).is_runtime());
        assert_ne!(
            Guid::runtime(GuidTag::Actor, RuntimeIndex::new(7)),
            Guid::runtime(GuidTag::Stage, RuntimeIndex::new(7))
        );
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&Guid::new(42)).expect("serialize");
        assert_eq!(json, "42");
    }
}
