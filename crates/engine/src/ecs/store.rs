//! In-memory entity store.
//!
//! # Invariants
//!
//! - Entity names are unique; `by_name` always mirrors `entities`
//! - An entity holds at most one component per [`ComponentKind`]
//! - Collector pending lists never contain an entity twice

use std::collections::{BTreeMap, HashMap};

use dungeonforge_domain::{Component, ComponentKind, ComponentType, DomainError, EntityId};

use super::matcher::{GroupEvent, Matcher};

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    components: BTreeMap<ComponentKind, Component>,
}

impl Entity {
    fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    fn matches(&self, matcher: &Matcher) -> bool {
        matcher.matches(|k| self.has(k))
    }
}

/// Handle of a registered collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectorId(usize);

#[derive(Debug)]
struct Collector {
    matcher: Matcher,
    event: GroupEvent,
    pending: Vec<EntityId>,
}

impl Collector {
    fn collect(&mut self, id: EntityId) {
        if !self.pending.contains(&id) {
            self.pending.push(id);
        }
    }
}

#[derive(Debug, Default)]
pub struct EntityStore {
    next_id: u64,
    /// Ordered by id, which is creation order.
    entities: BTreeMap<EntityId, Entity>,
    by_name: HashMap<String, EntityId>,
    collectors: Vec<Collector>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    pub fn create_entity(&mut self, name: impl Into<String>) -> Result<EntityId, DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::validation("entity name cannot be empty"));
        }
        if self.by_name.contains_key(&name) {
            return Err(DomainError::validation(format!(
                "entity {name} already exists"
            )));
        }
        self.next_id += 1;
        let id = EntityId::new(self.next_id);
        self.by_name.insert(name.clone(), id);
        self.entities.insert(
            id,
            Entity {
                name,
                components: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    /// Remove an entity from every index. Returns false if it did not exist.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(&id) else {
            return false;
        };
        self.by_name.remove(&entity.name);
        for collector in &mut self.collectors {
            collector.pending.retain(|e| *e != id);
        }
        true
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.entities.get(&id).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entity ids in creation order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    // =========================================================================
    // Components
    // =========================================================================

    pub fn has<T: ComponentType>(&self, id: EntityId) -> bool {
        self.has_kind(id, T::KIND)
    }

    pub fn has_kind(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.entities.get(&id).is_some_and(|e| e.has(kind))
    }

    pub fn get<T: ComponentType>(&self, id: EntityId) -> Option<&T> {
        self.entities
            .get(&id)
            .and_then(|e| e.components.get(&T::KIND))
            .and_then(T::from_component)
    }

    /// Components of an entity in kind order.
    pub fn components(&self, id: EntityId) -> impl Iterator<Item = &Component> {
        self.entities
            .get(&id)
            .into_iter()
            .flat_map(|e| e.components.values())
    }

    /// Add or overwrite the component of `T`'s kind.
    pub fn replace<T: ComponentType>(&mut self, id: EntityId, value: T) -> Result<(), DomainError> {
        self.replace_component(id, value.into())
    }

    pub fn replace_component(
        &mut self,
        id: EntityId,
        component: Component,
    ) -> Result<(), DomainError> {
        let Some(entity) = self.entities.get_mut(&id) else {
            return Err(DomainError::not_found("Entity", id.to_string()));
        };
        let kind = component.kind();
        let before: Vec<bool> = self.collectors.iter().map(|c| entity.matches(&c.matcher)).collect();
        let existed = entity.components.insert(kind, component).is_some();

        for (collector, was) in self.collectors.iter_mut().zip(before) {
            let now = entity.matches(&collector.matcher);
            let fire = match collector.event {
                GroupEvent::Added | GroupEvent::AddedOrRemoved if now && !was => true,
                GroupEvent::Removed | GroupEvent::AddedOrRemoved if was && !now => true,
                // Overwriting a watched component of a member counts as a fresh add.
                GroupEvent::Added | GroupEvent::AddedOrRemoved => {
                    existed && was && now && collector.matcher.references(kind)
                }
                GroupEvent::Removed => false,
            };
            if fire {
                collector.collect(id);
            }
        }
        Ok(())
    }

    /// Remove the component of `T`'s kind; a no-op when absent.
    pub fn remove<T: ComponentType>(&mut self, id: EntityId) -> Option<T> {
        match self.remove_kind(id, T::KIND) {
            Some(component) => T::from_component(&component).cloned(),
            None => None,
        }
    }

    pub fn remove_kind(&mut self, id: EntityId, kind: ComponentKind) -> Option<Component> {
        let entity = self.entities.get_mut(&id)?;
        if !entity.has(kind) {
            return None;
        }
        let before: Vec<bool> = self.collectors.iter().map(|c| entity.matches(&c.matcher)).collect();
        let removed = entity.components.remove(&kind);

        for (collector, was) in self.collectors.iter_mut().zip(before) {
            let now = entity.matches(&collector.matcher);
            let fire = match collector.event {
                GroupEvent::Removed | GroupEvent::AddedOrRemoved => was && !now,
                GroupEvent::Added => !was && now,
            };
            if fire {
                collector.collect(id);
            }
        }
        removed
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Snapshot of the entities matching `matcher`, in creation order.
    ///
    /// The returned ids are a copy, so callers may mutate the store while iterating.
    pub fn get_group(&self, matcher: &Matcher) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.matches(matcher))
            .map(|(id, _)| *id)
            .collect()
    }

    // =========================================================================
    // Collectors
    // =========================================================================

    pub fn register_collector(&mut self, matcher: Matcher, event: GroupEvent) -> CollectorId {
        self.collectors.push(Collector {
            matcher,
            event,
            pending: Vec::new(),
        });
        CollectorId(self.collectors.len() - 1)
    }

    /// Take the entities collected since the last drain, in collection order.
    pub fn drain_collector(&mut self, id: CollectorId) -> Vec<EntityId> {
        self.collectors
            .get_mut(id.0)
            .map(|c| std::mem::take(&mut c.pending))
            .unwrap_or_default()
    }

    pub fn clear_collector(&mut self, id: CollectorId) {
        if let Some(collector) = self.collectors.get_mut(id.0) {
            collector.pending.clear();
        }
    }

    /// Entities waiting across every collector.
    pub fn pending_collected(&self) -> usize {
        self.collectors.iter().map(|c| c.pending.len()).sum()
    }
}
