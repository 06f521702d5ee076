//! Event delivery and stage transitions.

use dungeonforge_domain::components::{ActorComponent, HomeComponent, PlayerComponent};
use dungeonforge_domain::{DomainError, EntityId, GameEvent};

use super::TcgGame;

/// Outcome of checking whether `speaker` can address `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationCheck {
    Valid,
    InvalidTarget,
    NoStage,
    NotSameStage,
}

/// Agents read events in the second person unless they were `@`-addressed.
fn replace_name_with_you(message: &str, name: &str) -> String {
    if message.is_empty() || !message.contains(name) || message.contains(&format!("@{name}")) {
        return message.to_string();
    }
    message.replace(name, "you")
}

impl TcgGame {
    /// Append the event to each target's memory; the player's actor also
    /// forwards it to the notification buffer.
    pub fn notify_event(&mut self, targets: &[EntityId], event: &GameEvent) {
        for &entity in targets {
            let Some(name) = self.store.name(entity).map(str::to_string) else {
                continue;
            };
            self.memory
                .append_human(&name, replace_name_with_you(event.message(), &name));
            if self.store.has::<PlayerComponent>(entity) {
                self.player.add_notification(name, event.clone());
            }
        }
    }

    /// Notify `origin`'s stage and every actor on it, minus `exclude`.
    pub fn broadcast_event(&mut self, origin: EntityId, event: &GameEvent, exclude: &[EntityId]) {
        let Some(stage) = self.stage_of(origin) else {
            tracing::warn!(
                entity = %self.entity_name(origin),
                "Broadcast origin has no stage"
            );
            return;
        };
        let mut targets = vec![stage];
        targets.extend(self.actors_on_stage(stage));
        targets.retain(|e| !exclude.contains(e));
        self.notify_event(&targets, event);
    }

    pub fn validate_conversation(&self, speaker: EntityId, target: &str) -> ConversationCheck {
        let Some(target) = self.actor_entity(target) else {
            return ConversationCheck::InvalidTarget;
        };
        let Some(stage) = self.stage_of(speaker) else {
            return ConversationCheck::NoStage;
        };
        if self.stage_of(target) != Some(stage) {
            return ConversationCheck::NotSameStage;
        }
        ConversationCheck::Valid
    }

    /// Move actors to `destination`, announcing the departure and arrival to
    /// everyone else and keeping home action orders in sync.
    pub fn stage_transition(
        &mut self,
        actors: &[EntityId],
        destination: EntityId,
    ) -> Result<(), DomainError> {
        let destination_name = self.entity_name(destination).to_string();
        let movers: Vec<(EntityId, EntityId)> = actors
            .iter()
            .filter_map(|&actor| {
                let current = self.stage_of(actor)?;
                if current == destination {
                    tracing::warn!(
                        actor = %self.entity_name(actor),
                        stage = %destination_name,
                        "Actor is already on the destination stage"
                    );
                    return None;
                }
                Some((actor, current))
            })
            .collect();

        for &(actor, current) in &movers {
            let actor_name = self.entity_name(actor).to_string();
            let message = format!(
                "# Event! {actor_name} left the stage {}.",
                self.entity_name(current)
            );
            self.broadcast_event(current, &GameEvent::agent(message), &[actor]);
        }

        for &(actor, current) in &movers {
            let actor_name = self.entity_name(actor).to_string();
            let from_stage = self.entity_name(current).to_string();
            self.store.replace(
                actor,
                ActorComponent {
                    name: actor_name.clone(),
                    current_stage: destination_name.clone(),
                },
            )?;
            let event = GameEvent::StageTransitionEvent {
                message: format!(
                    "# Event! {actor_name} left {from_stage} and entered {destination_name}."
                ),
                actor: actor_name.clone(),
                from_stage,
                to_stage: destination_name.clone(),
            };
            self.notify_event(&[actor], &event);

            if let Some(mut home) = self.store.get::<HomeComponent>(current).cloned() {
                home.action_order.retain(|name| name != &actor_name);
                self.store.replace(current, home)?;
            }
            if let Some(mut home) = self.store.get::<HomeComponent>(destination).cloned() {
                if !home.action_order.contains(&actor_name) {
                    home.action_order.push(actor_name.clone());
                    self.store.replace(destination, home)?;
                }
            }
        }

        for &(actor, _) in &movers {
            let message = format!(
                "# Event! {} entered the stage {destination_name}.",
                self.entity_name(actor)
            );
            self.broadcast_event(destination, &GameEvent::agent(message), &[actor]);
        }
        Ok(())
    }
}
