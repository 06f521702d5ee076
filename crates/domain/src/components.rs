//! Entity components.
//!
//! Every component is a plain value record and a member of the [`Component`]
//! sum type. Snapshots carry the variant name as a string discriminator, so
//! adding a component means adding one struct and one line to the
//! `define_components!` invocation at the bottom of this file.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{Guid, RuntimeIndex};
use crate::rpg::{HandDetail, RpgCharacterProfile, Skill, StatusEffect};
use crate::snapshot::ComponentSnapshot;

/// Typed access to one variant of [`Component`].
pub trait ComponentType: Clone + Into<Component> {
    const KIND: ComponentKind;

    fn from_component(component: &Component) -> Option<&Self>;
}

// =============================================================================
// Identity / role
// =============================================================================

/// Runtime identity: allocation order and guid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeComponent {
    pub name: String,
    pub runtime_index: RuntimeIndex,
    pub guid: Guid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSystemComponent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageComponent {
    pub name: String,
}

/// An actor. `current_stage` is empty while in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorComponent {
    pub name: String,
    pub current_stage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerComponent {
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroComponent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterComponent {
    pub name: String,
}

/// A home stage; `action_order` is the round-robin order for actor permits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeComponent {
    pub name: String,
    pub action_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonComponent {
    pub name: String,
}

// =============================================================================
// Kickoff
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickOffMessageComponent {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickOffDoneComponent {
    pub name: String,
    pub response: String,
}

// =============================================================================
// Presentation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceComponent {
    pub name: String,
    pub appearance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentComponent {
    pub name: String,
    pub narrate: String,
}

// =============================================================================
// Combat role
// =============================================================================

/// Present only while the owning actor is engaged in a dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRoleComponent {
    pub name: String,
    pub profile: RpgCharacterProfile,
    pub status_effects: Vec<StatusEffect>,
}

/// A one-shot skill authored by the player; replaces the next drawn hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XCardPlayerComponent {
    pub name: String,
    pub skill: Skill,
}

// =============================================================================
// Turn-local action markers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCardsAction {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandComponent {
    pub name: String,
    pub skills: Vec<Skill>,
    pub details: Vec<HandDetail>,
}

impl HandComponent {
    pub fn find_skill(&self, skill_name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name == skill_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAction {
    pub name: String,
    pub turn: usize,
    pub round: usize,
    pub round_turns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayCardAction {
    pub name: String,
    pub skill: Skill,
    pub targets: Vec<String>,
    pub reason: String,
    pub dialogue: String,
}

/// Stage-side slot filled by the director once every actor has played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorAction {
    pub name: String,
    pub calculation: String,
    pub performance: String,
}

impl DirectorAction {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calculation: String::new(),
            performance: String::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.calculation.is_empty() && !self.performance.is_empty()
    }
}

/// Actor-side slot filled by the feedback request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAction {
    pub name: String,
    pub description: String,
    pub update_hp: Option<i64>,
    pub update_max_hp: Option<i64>,
    pub effects: Vec<StatusEffect>,
}

impl FeedbackAction {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            update_hp: None,
            update_max_hp: None,
            effects: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.update_hp.is_some()
    }
}

// =============================================================================
// Home actions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakAction {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhisperAction {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnounceAction {
    pub name: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindVoiceAction {
    pub name: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterStageAction {
    pub name: String,
    pub target: String,
}

// =============================================================================
// Lifecycle
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyComponent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathComponent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningPermit {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePermit {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPermit {
    pub name: String,
}

// =============================================================================
// Sum type
// =============================================================================

macro_rules! define_components {
    ($($ty:ident),+ $(,)?) => {
        /// Discriminant of [`Component`], used as the store key and in matchers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ComponentKind {
            $($ty),+
        }

        impl ComponentKind {
            pub const ALL: &'static [ComponentKind] = &[$(ComponentKind::$ty),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ComponentKind::$ty => stringify!($ty)),+
                }
            }
        }

        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "name", content = "data")]
        pub enum Component {
            $($ty($ty)),+
        }

        impl Component {
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(Component::$ty(_) => ComponentKind::$ty),+
                }
            }
        }

        $(
            impl ComponentType for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn from_component(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Component {
                fn from(value: $ty) -> Self {
                    Component::$ty(value)
                }
            }
        )+
    };
}

define_components!(
    RuntimeComponent,
    WorldSystemComponent,
    StageComponent,
    ActorComponent,
    PlayerComponent,
    HeroComponent,
    MonsterComponent,
    HomeComponent,
    DungeonComponent,
    KickOffMessageComponent,
    KickOffDoneComponent,
    AppearanceComponent,
    EnvironmentComponent,
    CombatRoleComponent,
    XCardPlayerComponent,
    DrawCardsAction,
    HandComponent,
    TurnAction,
    PlayCardAction,
    DirectorAction,
    FeedbackAction,
    SpeakAction,
    WhisperAction,
    AnnounceAction,
    MindVoiceAction,
    EnterStageAction,
    DestroyComponent,
    DeathComponent,
    PlanningPermit,
    StagePermit,
    ActorPermit,
);

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ComponentKind {
    /// Components cleared by the post-action step at the end of a tick.
    pub const ACTIONS: &'static [ComponentKind] = &[
        ComponentKind::DrawCardsAction,
        ComponentKind::TurnAction,
        ComponentKind::PlayCardAction,
        ComponentKind::DirectorAction,
        ComponentKind::FeedbackAction,
        ComponentKind::SpeakAction,
        ComponentKind::WhisperAction,
        ComponentKind::AnnounceAction,
        ComponentKind::MindVoiceAction,
        ComponentKind::EnterStageAction,
    ];

    /// Transient markers authorising planning for the current tick.
    pub const PERMITS: &'static [ComponentKind] = &[
        ComponentKind::PlanningPermit,
        ComponentKind::StagePermit,
        ComponentKind::ActorPermit,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl Component {
    /// Split into `{name, data}` for the world document.
    pub fn to_snapshot(&self) -> Result<ComponentSnapshot, DomainError> {
        let data = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => map
                .remove("data")
                .unwrap_or(serde_json::Value::Object(Default::default())),
            Ok(other) => {
                return Err(DomainError::parse(format!(
                    "component {} serialized to non-object {other}",
                    self.kind()
                )))
            }
            Err(e) => return Err(DomainError::parse(e.to_string())),
        };
        Ok(ComponentSnapshot {
            name: self.kind().as_str().to_string(),
            data,
        })
    }

    /// Rebuild from a snapshot entry. Unknown names and malformed payloads are errors.
    pub fn from_snapshot(snapshot: &ComponentSnapshot) -> Result<Self, DomainError> {
        if ComponentKind::from_name(&snapshot.name).is_none() {
            return Err(DomainError::not_found("Component", snapshot.name.clone()));
        }
        let tagged = serde_json::json!({
            "name": snapshot.name,
            "data": snapshot.data,
        });
        serde_json::from_value(tagged)
            .map_err(|e| DomainError::parse(format!("component {}: {e}", snapshot.name)))
    }
}
