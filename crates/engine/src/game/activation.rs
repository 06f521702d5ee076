//! Player-driven activations: attach action components ahead of a tick.

use std::collections::BTreeMap;

use dungeonforge_domain::components::{
    AnnounceAction, DrawCardsAction, EnvironmentComponent, HandComponent, SpeakAction, TurnAction,
    WhisperAction, XCardPlayerComponent,
};
use dungeonforge_domain::{DomainError, EntityId, Round, Skill};

use super::TcgGame;
use crate::infrastructure::ports::shuffle;
use crate::infrastructure::settings::TurnOrderPolicy;

impl TcgGame {
    fn require_player_entity(&self) -> Result<EntityId, DomainError> {
        self.player_entity()
            .ok_or_else(|| DomainError::not_found("Player", self.player.name()))
    }

    /// Ask every combat participant to draw a fresh hand.
    pub fn activate_draw_cards(&mut self) -> Result<usize, DomainError> {
        let participants = self.combat_participants();
        for &entity in &participants {
            let name = self.entity_name(entity).to_string();
            self.store.replace(entity, DrawCardsAction { name })?;
        }
        Ok(participants.len())
    }

    /// Reuse the last round while it is incomplete, otherwise open a new one
    /// with a fresh turn order.
    pub fn create_combat_round(&mut self) -> Result<Round, DomainError> {
        if let Some(round) = self.world.dungeon.engagement.last_round() {
            if !round.is_complete() {
                return Ok(round.clone());
            }
        }

        let mut participants = self.combat_participants();
        if participants.is_empty() {
            return Err(DomainError::validation("no combat participants on stage"));
        }
        match self.settings.turn_order {
            TurnOrderPolicy::Shuffle => shuffle(self.random(), &mut participants),
            TurnOrderPolicy::Dexterity => participants.sort_by_key(|&e| {
                std::cmp::Reverse(
                    self.combat_role(e)
                        .map(|role| role.profile.dexterity())
                        .unwrap_or_default(),
                )
            }),
        }
        let round_turns: Vec<String> = participants
            .iter()
            .map(|&e| self.entity_name(e).to_string())
            .collect();
        let environment = self
            .player_stage()
            .and_then(|stage| self.store.get::<EnvironmentComponent>(stage))
            .map(|env| env.narrate.clone())
            .unwrap_or_default();

        self.world.dungeon.engagement.new_round(round_turns)?;
        let round = self
            .world
            .dungeon
            .engagement
            .last_round_mut()
            .ok_or_else(|| DomainError::validation("round was not recorded"))?;
        round.stage_environment = environment;
        tracing::info!(round = %round.tag, turns = ?round.round_turns, "Combat round created");
        Ok(round.clone())
    }

    /// Give every actor in the current round its turn. Nothing is attached
    /// unless every actor in `round_turns` holds a hand.
    pub fn activate_play_cards(&mut self) -> Result<usize, DomainError> {
        let engagement = &self.world.dungeon.engagement;
        if !engagement.is_ongoing_phase() {
            return Err(DomainError::invalid_state_transition(format!(
                "cards can only be played while ongoing, found {}",
                engagement.phase()
            )));
        }
        let round = engagement
            .last_round()
            .ok_or_else(|| DomainError::validation("no round to play"))?;
        if round.is_complete() {
            return Err(DomainError::validation(format!(
                "{} is already complete",
                round.tag
            )));
        }
        let round_number = engagement.rounds().len();
        let round_turns = round.round_turns.clone();

        let mut turns = Vec::with_capacity(round_turns.len());
        for name in &round_turns {
            let entity = self
                .actor_entity(name)
                .ok_or_else(|| DomainError::not_found("Actor", name.clone()))?;
            let has_cards = self
                .store
                .get::<HandComponent>(entity)
                .is_some_and(|hand| !hand.skills.is_empty());
            if !has_cards {
                return Err(DomainError::validation(format!("{name} has no cards in hand")));
            }
            turns.push(entity);
        }

        for (turn, &entity) in turns.iter().enumerate() {
            self.store.replace(
                entity,
                TurnAction {
                    name: round_turns[turn].clone(),
                    turn,
                    round: round_number,
                    round_turns: round_turns.clone(),
                },
            )?;
        }
        Ok(turns.len())
    }

    /// Targets are validated by the speak processor, which answers with a hint.
    pub fn activate_speak(&mut self, target: &str, content: &str) -> Result<(), DomainError> {
        let player = self.require_player_entity()?;
        let name = self.entity_name(player).to_string();
        let data = BTreeMap::from([(target.to_string(), content.to_string())]);
        self.store.replace(player, SpeakAction { name, data })
    }

    pub fn activate_whisper(&mut self, target: &str, content: &str) -> Result<(), DomainError> {
        let player = self.require_player_entity()?;
        let name = self.entity_name(player).to_string();
        let data = BTreeMap::from([(target.to_string(), content.to_string())]);
        self.store.replace(player, WhisperAction { name, data })
    }

    pub fn activate_announce(&mut self, content: &str) -> Result<(), DomainError> {
        let player = self.require_player_entity()?;
        let name = self.entity_name(player).to_string();
        self.store.replace(
            player,
            AnnounceAction {
                name,
                data: content.to_string(),
            },
        )
    }

    /// Author a one-shot skill that replaces the player's next drawn hand.
    pub fn activate_xcard(&mut self, skill: Skill) -> Result<(), DomainError> {
        if skill.name.trim().is_empty() {
            return Err(DomainError::validation("x-card skill needs a name"));
        }
        let player = self.require_player_entity()?;
        let name = self.entity_name(player).to_string();
        self.store
            .replace(player, XCardPlayerComponent { name, skill })
    }
}
