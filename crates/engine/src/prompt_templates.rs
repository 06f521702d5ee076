//! Prompt text for every model call site.
//!
//! Templates are plain strings with `{placeholder}` slots filled by [`render`].
//! Each key can be overridden by an environment variable derived from the key
//! (see [`key_to_env_var`]); an empty override falls back to the default.

use serde::{Deserialize, Serialize};

/// Categories for grouping prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptTemplateCategory {
    /// First message every agent receives.
    KickOff,
    /// Stage narration and actor planning outside combat.
    Home,
    /// Combat kickoff, cards, director and feedback.
    Combat,
    /// Post-combat journal.
    Summary,
}

impl PromptTemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KickOff => "kickoff",
            Self::Home => "home",
            Self::Combat => "combat",
            Self::Summary => "summary",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::KickOff => "Agent Kickoff",
            Self::Home => "Home Planning",
            Self::Combat => "Combat",
            Self::Summary => "Combat Summary",
        }
    }
}

/// Metadata about a prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplateMetadata {
    pub key: String,
    pub label: String,
    pub description: String,
    pub category: PromptTemplateCategory,
    /// The hard-coded default value.
    pub default_value: String,
    /// Environment variable name for override.
    pub env_var: String,
}

/// All prompt template keys as constants.
pub mod keys {
    // === Kickoff ===
    pub const KICKOFF_ACTOR: &str = "kickoff.actor";
    pub const KICKOFF_STAGE: &str = "kickoff.stage";
    pub const KICKOFF_WORLD_SYSTEM: &str = "kickoff.world_system";

    // === Home ===
    /// Scene description request, also used for dungeon levels.
    pub const STAGE_PLAN: &str = "home.stage_plan";
    /// What the stage remembers having been asked.
    pub const STAGE_PLAN_COMPRESSED: &str = "home.stage_plan_compressed";
    pub const ACTOR_PLAN: &str = "home.actor_plan";
    pub const ACTOR_PLAN_COMPRESSED: &str = "home.actor_plan_compressed";

    // === Combat ===
    pub const COMBAT_KICKOFF: &str = "combat.kickoff";
    pub const DRAW_CARDS: &str = "combat.draw_cards";
    pub const PLAY_CARD: &str = "combat.play_card";
    /// Damage and healing rules quoted in the director prompt.
    pub const COMBAT_MECHANICS: &str = "combat.mechanics";
    pub const DIRECTOR: &str = "combat.director";
    pub const FEEDBACK: &str = "combat.feedback";

    // === Summary ===
    pub const COMBAT_JOURNAL: &str = "summary.combat_journal";
}

/// Default values for all prompt templates.
pub mod defaults {
    pub const KICKOFF_ACTOR: &str = r#"# Game start! You begin your role here; take this as your starting state.
## Your kickoff message
{epoch_script}
{kick_off_message}
## Output
- Your inner thoughts as one compact paragraph, no line breaks."#;

    pub const KICKOFF_STAGE: &str = r#"# Game start! You begin your role here; take this as your starting state.
## Your kickoff message
{epoch_script}
{kick_off_message}
## Output
- Describe the scene as one compact paragraph, no line breaks."#;

    pub const KICKOFF_WORLD_SYSTEM: &str = r#"# Game start! You begin your role here; take this as your starting state.
## Your kickoff message
{epoch_script}
{kick_off_message}
## Output
- Confirm your function as one compact paragraph, no line breaks."#;

    pub const STAGE_PLAN: &str = r#"# Describe your scene
## Actors on the stage
{actors}
## Output
- The environment of the scene only; do not describe any actor.
- Third person.
- Do not wrap the reply in ```json```.
### Output format (JSON)
{"environment_narration":"The environment of the scene"}"#;

    pub const STAGE_PLAN_COMPRESSED: &str = "# Describe your scene and reply in JSON.";

    pub const ACTOR_PLAN: &str = r#"# Make your plan! Decide what you will do next and reply in JSON.
## Current stage
{stage} | {narrate}
## Actors on the stage
{actors}
## Stages you can walk to
{stages}
## Output
- Plan from the current stage, the actors present and your history.
- Always use full names.
- First person.
## Output format
{"speak_actions":{"Full name of an actor on the stage":"What you say (everyone on the stage hears it)"},"whisper_actions":{"Full name of an actor on the stage":"What you say (only the two of you hear it)"},"announce_actions":"What you announce (everyone hears it)","mind_voice_actions":"Your inner voice (only you hear it)","enter_stage":""}
### Notes
- Choose only one of speak_actions, whisper_actions and announce_actions.
- mind_voice_actions is optional.
- enter_stage is a stage name from the list above, or empty to stay.
- Reply with valid JSON only."#;

    pub const ACTOR_PLAN_COMPRESSED: &str = "# Make your plan and reply in JSON.";

    pub const COMBAT_KICKOFF: &str = r#"# Event! Combat triggered! Describe, in the first person, how the moment feels.
## Stage
{stage} | {narrate}
## Actors on the stage
{actors}
## Your attributes (combat only)
{stats}
## Output
1. How you feel: one compact paragraph, no line breaks, no numbers.
2. Status effects on you: a list with name, description and remaining rounds.
## Output format
{"description":"First-person description (under 200 words)","status_effects":[{"name":"Effect one","description":"What effect one does","rounds":1},{"name":"Effect two","description":"What effect two does","rounds":2}]}
- Reply with valid JSON only."#;

    pub const DRAW_CARDS: &str = r#"# You are designing skills for a role-playing game. Create {count} skills for yourself.
Pick one of two modes. Mode one: one defensive skill and one offensive skill. Mode two: one defensive or offensive skill plus one skill that observes and exploits the environment (only when the scene names an object you can use; otherwise use mode one).
Offensive and defensive skills scale with your attributes; environment skills do not. An environment object can be used once per combat and by one actor per round, and its effect must obey physics.
## Current stage
{stage} | {narrate}
## Turn order (left to right)
{round_turns}
## Output
- When a skill changes hp, attack or defense, state the amount in its description and effect.
## Output format (JSON)
{example}
### Notes
- No line breaks or blank lines.
- Reply with valid JSON only."#;

    pub const PLAY_CARD: &str = r#"# Your turn! Round {round}, you act at position {turn} of: {round_turns}
## Your hand
{hand}
## Actors on the stage
{actors}
## Your attributes
{stats}
## Output
- Choose exactly one skill from your hand by its name.
- Targets must be full names of actors on the stage.
## Output format
{"skill":"Skill name","targets":["Target full name"],"reason":"Why you use it","dialogue":"What you say as you act"}
- Reply with valid JSON only."#;

    pub const COMBAT_MECHANICS: &str = r#"Damage (A -> B)
1. Hit check. On a miss, damage = 0.
2. On a hit:
   physical damage = max(1, ceil(A.physical_attack * alpha - B.physical_defense * beta))
   magic damage = max(1, ceil(A.magic_attack * alpha - B.magic_defense * beta))
   B.HP -= (physical damage + magic damage + B.ongoing damage) - B.ongoing healing
   if B.HP <= 0, B is dead
   A.HP += ceil(A.lifesteal * (physical damage + magic damage) * gamma)

Healing (A -> B)
1. Always lands:
   healing = ceil(A.magic_attack * alpha)
   B.HP = min(B.MAX_HP, B.HP + healing) + B.ongoing healing

Core rules
1. Every value is rounded up.
2. Hit chance follows the story; alpha, beta and gamma follow the situation and the buffs and debuffs on A and B.
3. Damage is at least 1. Healing never exceeds MAX_HP.
4. An environment object used in a round cannot be used again by anyone else in that round, and disappears for the rest of the combat. An actor trying to use it anyway cancels that skill and uses another one."#;

    pub const DIRECTOR: &str = r#"# Notice! Round action order. Resolve this combat round:
## Action sequence (later skills resolve after earlier ones)
{sequence}
## Actors and skills
{details}
## Combat rules
{mechanics}
## Output
1. calculation:
    - The full damage and healing calculation, following the combat rules.
    - After resolution, state every actor's current HP/MAX_HP.
2. performance (~200 words):
    - A literary depiction of the round; no numbers and no calculation.
## Output format
{"calculation":"Calculation","performance":"Performance"}
- No line breaks or blank lines.
- Reply with valid JSON only."#;

    pub const FEEDBACK: &str = r#"# Round resolved! Update your status from the ruling below.
## Calculation
{calculation}
## Performance
{performance}
## Your attributes before the round
{stats}
## Your status effects before the round
{effects}
## Output
- description: how you fared this round, first person, one paragraph.
- update_hp: your HP after the round, as stated in the calculation.
- update_max_hp: your MAX_HP after the round.
- effects: every status effect now on you, with remaining rounds.
## Output format
{"description":"How the round went for you","update_hp":0,"update_max_hp":0,"effects":[{"name":"Effect","description":"What it does","rounds":1}]}
- Reply with valid JSON only."#;

    pub const COMBAT_JOURNAL: &str = r#"# The combat is over. Write a journal entry about it.
## Stage
{stage}
## Result
{result}
## Output
- Recall the scene, your opponents, how the fight went, how you felt and what your companions did.
- First person, one paragraph, no line breaks."#;
}

/// Convert a template key to its environment variable name.
pub fn key_to_env_var(key: &str) -> String {
    format!("DUNGEONFORGE_PROMPT_{}", key.to_uppercase().replace('.', "_"))
}

/// Get the default value for a template key.
pub fn get_default(key: &str) -> Option<&'static str> {
    match key {
        keys::KICKOFF_ACTOR => Some(defaults::KICKOFF_ACTOR),
        keys::KICKOFF_STAGE => Some(defaults::KICKOFF_STAGE),
        keys::KICKOFF_WORLD_SYSTEM => Some(defaults::KICKOFF_WORLD_SYSTEM),
        keys::STAGE_PLAN => Some(defaults::STAGE_PLAN),
        keys::STAGE_PLAN_COMPRESSED => Some(defaults::STAGE_PLAN_COMPRESSED),
        keys::ACTOR_PLAN => Some(defaults::ACTOR_PLAN),
        keys::ACTOR_PLAN_COMPRESSED => Some(defaults::ACTOR_PLAN_COMPRESSED),
        keys::COMBAT_KICKOFF => Some(defaults::COMBAT_KICKOFF),
        keys::DRAW_CARDS => Some(defaults::DRAW_CARDS),
        keys::PLAY_CARD => Some(defaults::PLAY_CARD),
        keys::COMBAT_MECHANICS => Some(defaults::COMBAT_MECHANICS),
        keys::DIRECTOR => Some(defaults::DIRECTOR),
        keys::FEEDBACK => Some(defaults::FEEDBACK),
        keys::COMBAT_JOURNAL => Some(defaults::COMBAT_JOURNAL),
        _ => None,
    }
}

/// Resolve a template: a non-empty environment override wins over the default.
pub fn resolve(key: &str) -> String {
    resolve_with(key, |var| std::env::var(var).ok())
}

/// [`resolve`] against an arbitrary lookup. Unknown keys resolve to an empty string.
pub fn resolve_with(key: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    if let Some(value) = lookup(&key_to_env_var(key)) {
        if !value.trim().is_empty() {
            return value;
        }
    }
    get_default(key).unwrap_or_default().to_string()
}

/// Fill `{name}` slots. Slots without a value are left untouched, so JSON
/// samples inside a template survive rendering.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}

/// Resolve then render.
pub fn build(key: &str, values: &[(&str, &str)]) -> String {
    render(&resolve(key), values)
}

/// Get metadata for all prompt templates.
pub fn prompt_template_metadata() -> Vec<PromptTemplateMetadata> {
    let entry = |key: &str, label: &str, description: &str, category| PromptTemplateMetadata {
        key: key.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        category,
        default_value: get_default(key).unwrap_or_default().to_string(),
        env_var: key_to_env_var(key),
    };
    use PromptTemplateCategory::*;
    vec![
        entry(keys::KICKOFF_ACTOR, "Actor Kickoff", "First message sent to an actor", KickOff),
        entry(keys::KICKOFF_STAGE, "Stage Kickoff", "First message sent to a stage", KickOff),
        entry(
            keys::KICKOFF_WORLD_SYSTEM,
            "World System Kickoff",
            "First message sent to a world system",
            KickOff,
        ),
        entry(keys::STAGE_PLAN, "Stage Narration", "Scene description request", Home),
        entry(
            keys::STAGE_PLAN_COMPRESSED,
            "Stage Narration (memory)",
            "What the stage's memory records instead of the full request",
            Home,
        ),
        entry(keys::ACTOR_PLAN, "Actor Plan", "Speak, whisper, announce and inner voice plan", Home),
        entry(
            keys::ACTOR_PLAN_COMPRESSED,
            "Actor Plan (memory)",
            "What the actor's memory records instead of the full request",
            Home,
        ),
        entry(
            keys::COMBAT_KICKOFF,
            "Combat Kickoff",
            "Scene-entry description and initial status effects",
            Combat,
        ),
        entry(keys::DRAW_CARDS, "Draw Cards", "Skill generation for a new hand", Combat),
        entry(keys::PLAY_CARD, "Play Card", "Skill and target selection for a turn", Combat),
        entry(
            keys::COMBAT_MECHANICS,
            "Combat Rules",
            "Damage and healing rules quoted to the director",
            Combat,
        ),
        entry(keys::DIRECTOR, "Director", "Round adjudication: calculation and performance", Combat),
        entry(keys::FEEDBACK, "Feedback", "Per-actor hp and status effect update", Combat),
        entry(
            keys::COMBAT_JOURNAL,
            "Combat Journal",
            "First-person summary written by each hero after a combat",
            Summary,
        ),
    ]
}

/// Get all known template keys.
pub fn all_keys() -> Vec<&'static str> {
    vec![
        keys::KICKOFF_ACTOR,
        keys::KICKOFF_STAGE,
        keys::KICKOFF_WORLD_SYSTEM,
        keys::STAGE_PLAN,
        keys::STAGE_PLAN_COMPRESSED,
        keys::ACTOR_PLAN,
        keys::ACTOR_PLAN_COMPRESSED,
        keys::COMBAT_KICKOFF,
        keys::DRAW_CARDS,
        keys::PLAY_CARD,
        keys::COMBAT_MECHANICS,
        keys::DIRECTOR,
        keys::FEEDBACK,
        keys::COMBAT_JOURNAL,
    ]
}
