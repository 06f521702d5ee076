//! RPG character profile, skills and status effects.
//!
//! # Invariants
//!
//! - `0 <= hp <= max_hp` and `max_hp >= 1`; every mutation clamps
//! - Derived attack/defence values are recomputed from the base attributes,
//!   never stored independently of them

use serde::{Deserialize, Serialize};

/// Base attributes an actor prototype is authored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAttributes {
    pub strength: i64,
    pub dexterity: i64,
    pub wisdom: i64,
}

impl BaseAttributes {
    pub const fn new(strength: i64, dexterity: i64, wisdom: i64) -> Self {
        Self {
            strength,
            dexterity,
            wisdom,
        }
    }
}

/// Full combat profile of an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpgCharacterProfile {
    hp: i64,
    max_hp: i64,
    strength: i64,
    dexterity: i64,
    wisdom: i64,
    physical_attack: i64,
    physical_defense: i64,
    magic_attack: i64,
    magic_defense: i64,
}

/// Result of changing hit points, so callers can report what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HpChange {
    pub previous: i64,
    pub current: i64,
    pub max_hp: i64,
}

impl HpChange {
    pub fn delta(&self) -> i64 {
        self.current - self.previous
    }
}

impl RpgCharacterProfile {
    /// Build a fresh profile at full health from base attributes.
    ///
    /// # Example
    ///
    /// ```
    /// use dungeonforge_domain::rpg::{BaseAttributes, RpgCharacterProfile};
    ///
    /// let profile = RpgCharacterProfile::from_attributes(BaseAttributes::new(5, 5, 5));
    /// assert_eq!(profile.max_hp(), 100);
    /// assert_eq!(profile.hp(), 100);
    /// ```
    pub fn from_attributes(attributes: BaseAttributes) -> Self {
        let strength = attributes.strength;
        let wisdom = attributes.wisdom;
        let max_hp = (50 + 10 * strength).max(1);
        Self {
            hp: max_hp,
            max_hp,
            strength,
            dexterity: attributes.dexterity,
            wisdom,
            physical_attack: 5 + 2 * strength,
            physical_defense: 5 + strength,
            magic_attack: 5 + 2 * wisdom,
            magic_defense: 5 + wisdom,
        }
    }

    pub fn hp(&self) -> i64 {
        self.hp
    }

    pub fn max_hp(&self) -> i64 {
        self.max_hp
    }

    pub fn strength(&self) -> i64 {
        self.strength
    }

    pub fn dexterity(&self) -> i64 {
        self.dexterity
    }

    pub fn wisdom(&self) -> i64 {
        self.wisdom
    }

    pub fn physical_attack(&self) -> i64 {
        self.physical_attack
    }

    pub fn physical_defense(&self) -> i64 {
        self.physical_defense
    }

    pub fn magic_attack(&self) -> i64 {
        self.magic_attack
    }

    pub fn magic_defense(&self) -> i64 {
        self.magic_defense
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Set hit points, clamped to `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: i64) -> HpChange {
        let previous = self.hp;
        self.hp = hp.clamp(0, self.max_hp);
        HpChange {
            previous,
            current: self.hp,
            max_hp: self.max_hp,
        }
    }

    /// Set maximum hit points (at least 1); current hp is pulled down if needed.
    pub fn set_max_hp(&mut self, max_hp: i64) {
        self.max_hp = max_hp.max(1);
        self.hp = self.hp.min(self.max_hp);
    }

    pub fn restore_full_hp(&mut self) -> HpChange {
        self.set_hp(self.max_hp)
    }

    /// Compact one-line stat block used in prompts.
    pub fn stats_prompt(&self) -> String {
        format!(
            "HP:{}/{} | STR:{} DEX:{} WIS:{} | PATK:{} PDEF:{} MATK:{} MDEF:{}",
            self.hp,
            self.max_hp,
            self.strength,
            self.dexterity,
            self.wisdom,
            self.physical_attack,
            self.physical_defense,
            self.magic_attack,
            self.magic_defense
        )
    }
}

/// A skill card. Generated per round, never persisted across combats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub effect: String,
}

/// Model-suggested usage that accompanies a drawn skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandDetail {
    pub skill: String,
    pub targets: Vec<String>,
    pub reason: String,
    pub dialogue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub description: String,
    pub rounds: u32,
}

/// Outcome of a round boundary: effects still active and effects that just ran out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusEffectSettlement {
    pub remaining: Vec<StatusEffect>,
    pub expired: Vec<StatusEffect>,
}

/// Decrement every effect by one round and split out the ones reaching zero.
pub fn settle_status_effects(effects: Vec<StatusEffect>) -> StatusEffectSettlement {
    let mut settlement = StatusEffectSettlement::default();
    for mut effect in effects {
        effect.rounds = effect.rounds.saturating_sub(1);
        if effect.rounds == 0 {
            settlement.expired.push(effect);
        } else {
            settlement.remaining.push(effect);
        }
    }
    settlement
}

pub fn format_status_effects(effects: &[StatusEffect]) -> String {
    if effects.is_empty() {
        return "none".to_string();
    }
    effects
        .iter()
        .map(|e| format!("{} ({} rounds): {}", e.name, e.rounds, e.description))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(name: &str, rounds: u32) -> StatusEffect {
        StatusEffect {
            name: name.to_string(),
            description: format!("{name} description"),
            rounds,
        }
    }

    #[test]
    fn derived_stats_follow_base_attributes() {
        let profile = RpgCharacterProfile::from_attributes(BaseAttributes::new(3, 7, 4));
        assert_eq!(profile.max_hp(), 80);
        assert_eq!(profile.hp(), 80);
        assert_eq!(profile.physical_attack(), 11);
        assert_eq!(profile.physical_defense(), 8);
        assert_eq!(profile.magic_attack(), 13);
        assert_eq!(profile.magic_defense(), 9);
        assert_eq!(profile.dexterity(), 7);
    }

    #[test]
    fn set_hp_clamps_into_valid_range() {
        let mut profile = RpgCharacterProfile::from_attributes(BaseAttributes::new(0, 1, 1));
        assert_eq!(profile.max_hp(), 50);

        let change = profile.set_hp(-20);
        assert_eq!(change.current, 0);
        assert_eq!(change.delta(), -50);
        assert!(profile.is_dead());

        profile.set_hp(500);
        assert_eq!(profile.hp(), 50);
    }

    #[test]
    fn lowering_max_hp_pulls_hp_down() {
        let mut profile = RpgCharacterProfile::from_attributes(BaseAttributes::new(5, 5, 5));
        profile.set_max_hp(30);
        assert_eq!(profile.hp(), 30);
        profile.set_max_hp(-4);
        assert_eq!(profile.max_hp(), 1);
        assert_eq!(profile.hp(), 1);
    }

    #[test]
    fn settlement_expires_effects_reaching_zero() {
        let settlement = settle_status_effects(vec![effect("burn", 1), effect("shield", 3)]);
        assert_eq!(settlement.expired, vec![effect("burn", 0)]);
        assert_eq!(settlement.remaining, vec![effect("shield", 2)]);
    }

    #[test]
    fn settlement_treats_zero_round_effects_as_expired() {
        let settlement = settle_status_effects(vec![effect("stale", 0)]);
        assert!(settlement.remaining.is_empty());
        assert_eq!(settlement.expired.len(), 1);
    }
}
