//! Component-set matchers.

use std::collections::BTreeSet;

use dungeonforge_domain::ComponentKind;

/// Which membership change a collector records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEvent {
    Added,
    Removed,
    AddedOrRemoved,
}

/// Conjunction of `all_of`, `any_of` and `none_of` over component kinds.
///
/// An empty `any_of` places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matcher {
    all_of: BTreeSet<ComponentKind>,
    any_of: BTreeSet<ComponentKind>,
    none_of: BTreeSet<ComponentKind>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_of(mut self, kinds: &[ComponentKind]) -> Self {
        self.all_of.extend(kinds.iter().copied());
        self
    }

    pub fn any_of(mut self, kinds: &[ComponentKind]) -> Self {
        self.any_of.extend(kinds.iter().copied());
        self
    }

    pub fn none_of(mut self, kinds: &[ComponentKind]) -> Self {
        self.none_of.extend(kinds.iter().copied());
        self
    }

    /// Evaluate against a membership predicate.
    pub fn matches(&self, has: impl Fn(ComponentKind) -> bool) -> bool {
        self.all_of.iter().all(|k| has(*k))
            && (self.any_of.is_empty() || self.any_of.iter().any(|k| has(*k)))
            && !self.none_of.iter().any(|k| has(*k))
    }

    /// True if the matcher mentions `kind` in any clause.
    pub fn references(&self, kind: ComponentKind) -> bool {
        self.all_of.contains(&kind) || self.any_of.contains(&kind) || self.none_of.contains(&kind)
    }
}
