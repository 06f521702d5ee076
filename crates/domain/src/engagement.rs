//! Engagement state machine: combats, rounds and phase transitions.
//!
//! ```text
//! none -> kickoff -> ongoing -> complete -> post-wait
//! ```
//!
//! Transitions check their preconditions and return
//! [`DomainError::InvalidStateTransition`] instead of mutating on a violation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    #[default]
    None,
    KickOff,
    Ongoing,
    Complete,
    PostWait,
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::KickOff => "kickoff",
            Self::Ongoing => "ongoing",
            Self::Complete => "complete",
            Self::PostWait => "post-wait",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatResult {
    #[default]
    None,
    HeroWin,
    HeroLose,
}

impl fmt::Display for CombatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::HeroWin => "hero-win",
            Self::HeroLose => "hero-lose",
        };
        f.write_str(s)
    }
}

/// One cycle in which every participant plays a skill and receives feedback.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Round {
    pub tag: String,
    pub round_turns: Vec<String>,
    pub stage_environment: String,
    pub select_report: BTreeMap<String, String>,
    pub stage_director_calculation: String,
    pub stage_director_performance: String,
    pub feedback_report: BTreeMap<String, String>,
}

impl Round {
    pub fn new(tag: impl Into<String>, round_turns: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            round_turns,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.round_turns.is_empty()
            && !self.stage_director_calculation.is_empty()
            && !self.stage_director_performance.is_empty()
            && !self.feedback_report.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    pub name: String,
    pub phase: CombatPhase,
    pub result: CombatResult,
    pub rounds: Vec<Round>,
    pub summarize_report: BTreeMap<String, String>,
}

impl Combat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: CombatPhase::None,
            result: CombatResult::None,
            rounds: Vec::new(),
            summarize_report: BTreeMap::new(),
        }
    }
}

/// Ordered history of combats; only the last one is live.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Engagement {
    combats: Vec<Combat>,
}

impl Engagement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combats(&self) -> &[Combat] {
        &self.combats
    }

    pub fn last_combat(&self) -> Option<&Combat> {
        self.combats.last()
    }

    pub fn last_combat_mut(&mut self) -> Option<&mut Combat> {
        self.combats.last_mut()
    }

    /// Rounds of the live combat.
    pub fn rounds(&self) -> &[Round] {
        self.last_combat().map(|c| c.rounds.as_slice()).unwrap_or(&[])
    }

    pub fn last_round(&self) -> Option<&Round> {
        self.last_combat().and_then(|c| c.rounds.last())
    }

    pub fn last_round_mut(&mut self) -> Option<&mut Round> {
        self.last_combat_mut().and_then(|c| c.rounds.last_mut())
    }

    pub fn phase(&self) -> CombatPhase {
        self.last_combat().map(|c| c.phase).unwrap_or_default()
    }

    pub fn result(&self) -> CombatResult {
        self.last_combat().map(|c| c.result).unwrap_or_default()
    }

    pub fn is_kickoff_phase(&self) -> bool {
        self.phase() == CombatPhase::KickOff
    }

    pub fn is_ongoing_phase(&self) -> bool {
        self.phase() == CombatPhase::Ongoing
    }

    pub fn is_complete_phase(&self) -> bool {
        self.phase() == CombatPhase::Complete
    }

    pub fn is_post_wait_phase(&self) -> bool {
        self.phase() == CombatPhase::PostWait
    }

    pub fn has_hero_won(&self) -> bool {
        self.result() == CombatResult::HeroWin
    }

    pub fn has_hero_lost(&self) -> bool {
        self.result() == CombatResult::HeroLose
    }

    /// Append a fresh combat and move it to `kickoff`.
    pub fn combat_kickoff(&mut self, mut combat: Combat) -> Result<(), DomainError> {
        if combat.phase != CombatPhase::None {
            return Err(DomainError::invalid_state_transition(format!(
                "combat {} must start in phase none, found {}",
                combat.name, combat.phase
            )));
        }
        combat.phase = CombatPhase::KickOff;
        self.combats.push(combat);
        Ok(())
    }

    pub fn combat_ongoing(&mut self) -> Result<(), DomainError> {
        let combat = self.live_combat_mut("ongoing")?;
        if combat.phase != CombatPhase::KickOff || combat.result != CombatResult::None {
            return Err(DomainError::invalid_state_transition(format!(
                "ongoing requires kickoff with no result, found {} / {}",
                combat.phase, combat.result
            )));
        }
        combat.phase = CombatPhase::Ongoing;
        Ok(())
    }

    pub fn combat_complete(&mut self, result: CombatResult) -> Result<(), DomainError> {
        let combat = self.live_combat_mut("complete")?;
        if combat.phase != CombatPhase::Ongoing {
            return Err(DomainError::invalid_state_transition(format!(
                "complete requires ongoing, found {}",
                combat.phase
            )));
        }
        if result == CombatResult::None {
            return Err(DomainError::invalid_state_transition(
                "complete requires a hero-win or hero-lose result",
            ));
        }
        combat.result = result;
        combat.phase = CombatPhase::Complete;
        Ok(())
    }

    pub fn combat_post_wait(&mut self) -> Result<(), DomainError> {
        let combat = self.live_combat_mut("post-wait")?;
        if combat.phase != CombatPhase::Complete {
            return Err(DomainError::invalid_state_transition(format!(
                "post-wait requires complete, found {}",
                combat.phase
            )));
        }
        combat.phase = CombatPhase::PostWait;
        Ok(())
    }

    /// Allocate the next round of the ongoing combat.
    pub fn new_round(&mut self, round_turns: Vec<String>) -> Result<&Round, DomainError> {
        let combat = self.live_combat_mut("new round")?;
        if combat.phase != CombatPhase::Ongoing {
            return Err(DomainError::invalid_state_transition(format!(
                "rounds can only be created while ongoing, found {}",
                combat.phase
            )));
        }
        let tag = format!("round_{}", combat.rounds.len() + 1);
        combat.rounds.push(Round::new(tag, round_turns));
        combat
            .rounds
            .last()
            .ok_or_else(|| DomainError::validation("round was not recorded"))
    }

    fn live_combat_mut(&mut self, transition: &str) -> Result<&mut Combat, DomainError> {
        self.combats.last_mut().ok_or_else(|| {
            DomainError::invalid_state_transition(format!("{transition}: no combat in progress"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ongoing_engagement() -> Engagement {
        let mut engagement = Engagement::new();
        engagement
            .combat_kickoff(Combat::new("Sunken Crypt"))
            .expect("kickoff");
        engagement.combat_ongoing().expect("ongoing");
        engagement
    }

    #[test]
    fn full_lifecycle_walks_every_phase() {
        let mut engagement = ongoing_engagement();
        assert!(engagement.is_ongoing_phase());

        engagement
            .combat_complete(CombatResult::HeroWin)
            .expect("complete");
        assert!(engagement.is_complete_phase());
        assert!(engagement.has_hero_won());

        engagement.combat_post_wait().expect("post wait");
        assert!(engagement.is_post_wait_phase());
    }

    #[test]
    fn kickoff_rejects_combat_not_in_phase_none() {
        let mut engagement = Engagement::new();
        let mut combat = Combat::new("Crypt");
        combat.phase = CombatPhase::Ongoing;
        assert!(engagement.combat_kickoff(combat).is_err());
        assert!(engagement.combats().is_empty());
    }

    #[test]
    fn ongoing_without_combat_is_an_error() {
        let mut engagement = Engagement::new();
        assert!(matches!(
            engagement.combat_ongoing(),
            Err(DomainError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn complete_rejects_none_result_and_wrong_phase() {
        let mut engagement = ongoing_engagement();
        assert!(engagement.combat_complete(CombatResult::None).is_err());
        assert!(engagement.is_ongoing_phase());

        let mut kicked = Engagement::new();
        kicked.combat_kickoff(Combat::new("Crypt")).expect("kickoff");
        assert!(kicked.combat_complete(CombatResult::HeroLose).is_err());
    }

    #[test]
    fn post_wait_requires_complete() {
        let mut engagement = ongoing_engagement();
        assert!(engagement.combat_post_wait().is_err());
    }

    #[test]
    fn rounds_are_tagged_sequentially() {
        let mut engagement = ongoing_engagement();
        let tag = engagement
            .new_round(vec!["Aria".into(), "Goblin".into()])
            .expect("round")
            .tag
            .clone();
        assert_eq!(tag, "round_1");
        engagement.new_round(vec!["Aria".into()]).expect("round");
        assert_eq!(engagement.rounds().len(), 2);
        assert_eq!(
            engagement.last_round().map(|r| r.tag.as_str()),
            Some("round_2")
        );
    }

    #[test]
    fn round_completion_needs_director_and_feedback() {
        let mut round = Round::new("round_1", vec!["Aria".into()]);
        assert!(!round.is_complete());
        round.stage_director_calculation = "Aria hp 90/100".into();
        round.stage_director_performance = "Sparks fly".into();
        assert!(!round.is_complete());
        round
            .feedback_report
            .insert("Aria".into(), "took a hit".into());
        assert!(round.is_complete());
    }

    #[test]
    fn phase_defaults_to_none_without_combat() {
        let engagement = Engagement::new();
        assert_eq!(engagement.phase(), CombatPhase::None);
        assert!(engagement.last_round().is_none());
        assert!(engagement.rounds().is_empty());
    }
}
