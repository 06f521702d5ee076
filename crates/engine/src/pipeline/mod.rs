//! Pipeline runner.
//!
//! A [`Pipeline`] is an ordered list of [`Processor`]s. One tick runs:
//!
//! 1. every `a_execute1`, in declaration order
//! 2. for each processor in declaration order: `execute`, then (if it declares
//!    a trigger) drain its collector, `filter`, and `react`
//! 3. every `a_execute2`, in declaration order
//! 4. cleanup: every reactive queue is cleared
//!
//! Collectors live in the entity store, so a reactive processor sees every
//! matching change made before its slot in the current tick, deduplicated by
//! entity. Changes made after its slot are dropped at cleanup.

use async_trait::async_trait;
use dungeonforge_domain::EntityId;

use crate::ecs::{CollectorId, GroupEvent, Matcher};
use crate::game::TcgGame;

// =============================================================================
// Processor
// =============================================================================

/// A unit of per-tick behaviour. Every hook is optional.
#[async_trait]
pub trait Processor: Send {
    fn name(&self) -> &'static str;

    /// Once, before the first tick.
    fn initialize(&mut self, _game: &mut TcgGame) {}

    /// Async work before the synchronous phase.
    async fn a_execute1(&mut self, _game: &mut TcgGame) {}

    fn execute(&mut self, _game: &mut TcgGame) {}

    /// Declaring a trigger makes the processor reactive.
    fn trigger(&self) -> Option<(Matcher, GroupEvent)> {
        None
    }

    fn filter(&self, _game: &TcgGame, _entity: EntityId) -> bool {
        true
    }

    /// Called with the collected entities that still exist and pass [`Processor::filter`].
    async fn react(&mut self, _game: &mut TcgGame, _entities: Vec<EntityId>) {}

    /// Async work after the synchronous phase.
    async fn a_execute2(&mut self, _game: &mut TcgGame) {}

    /// Once, at exit.
    fn tear_down(&mut self, _game: &mut TcgGame) {}
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct Pipeline {
    name: &'static str,
    processors: Vec<Box<dyn Processor>>,
    collectors: Vec<Option<CollectorId>>,
    initialized: bool,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            processors: Vec::new(),
            collectors: Vec::new(),
            initialized: false,
        }
    }

    pub fn add(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn processor_names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register collectors and run every `initialize` hook. Idempotent.
    pub fn initialize(&mut self, game: &mut TcgGame) {
        if self.initialized {
            return;
        }
        self.collectors = self
            .processors
            .iter()
            .map(|p| {
                p.trigger()
                    .map(|(matcher, event)| game.store.register_collector(matcher, event))
            })
            .collect();
        for processor in &mut self.processors {
            processor.initialize(game);
        }
        self.initialized = true;
        tracing::debug!(
            pipeline = self.name,
            processors = self.processors.len(),
            "Pipeline initialized"
        );
    }

    /// Run one tick.
    pub async fn execute(&mut self, game: &mut TcgGame) {
        if !self.initialized {
            self.initialize(game);
        }

        for processor in &mut self.processors {
            processor.a_execute1(game).await;
        }

        for (processor, collector) in self.processors.iter_mut().zip(&self.collectors) {
            processor.execute(game);

            let Some(collector) = *collector else {
                continue;
            };
            let entities: Vec<EntityId> = game
                .store
                .drain_collector(collector)
                .into_iter()
                .filter(|&e| game.store.contains(e) && processor.filter(game, e))
                .collect();
            if !entities.is_empty() {
                tracing::trace!(
                    processor = processor.name(),
                    count = entities.len(),
                    "Reacting"
                );
                processor.react(game, entities).await;
            }
        }

        for processor in &mut self.processors {
            processor.a_execute2(game).await;
        }

        self.clear_reactive_queues(game);
    }

    /// Drop everything collected so far, e.g. when switching pipelines.
    pub fn clear_reactive_queues(&mut self, game: &mut TcgGame) {
        for collector in self.collectors.iter().flatten() {
            game.store.clear_collector(*collector);
        }
    }

    pub fn tear_down(&mut self, game: &mut TcgGame) {
        for processor in &mut self.processors {
            processor.tear_down(game);
        }
        tracing::debug!(pipeline = self.name, "Pipeline torn down");
    }
}
