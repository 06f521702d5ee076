//! Dungeon: an ordered run of stage levels plus the engagement fought in them.

use serde::{Deserialize, Serialize};

use crate::engagement::Engagement;
use crate::prototypes::StageInstance;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dungeon {
    pub name: String,
    pub levels: Vec<StageInstance>,
    pub engagement: Engagement,
    /// -1 until the first level is entered.
    pub position: i64,
}

impl Default for Dungeon {
    fn default() -> Self {
        Self::new("", Vec::new())
    }
}

impl Dungeon {
    pub fn new(name: impl Into<String>, levels: Vec<StageInstance>) -> Self {
        Self {
            name: name.into(),
            levels,
            engagement: Engagement::new(),
            position: -1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.position >= 0
    }

    pub fn current_level(&self) -> Option<&StageInstance> {
        usize::try_from(self.position)
            .ok()
            .and_then(|i| self.levels.get(i))
    }

    pub fn next_level(&self) -> Option<&StageInstance> {
        usize::try_from(self.position + 1)
            .ok()
            .and_then(|i| self.levels.get(i))
    }

    /// Move the cursor forward; returns false when there is no next level.
    pub fn advance_level(&mut self) -> bool {
        if self.next_level().is_none() {
            return false;
        }
        self.position += 1;
        true
    }

    pub fn level_names(&self) -> Vec<String> {
        self.levels.iter().map(|l| l.name.clone()).collect()
    }
}
