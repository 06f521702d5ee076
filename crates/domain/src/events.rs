//! In-world events delivered to agents' memories and the player's notification buffer.
//!
//! Every variant is serialized with its class name in `event_type`, so clients
//! can dispatch without a pre-registered schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum GameEvent {
    /// Plain narration.
    AgentEvent { message: String },
    SpeakEvent {
        message: String,
        speaker: String,
        listener: String,
        content: String,
    },
    WhisperEvent {
        message: String,
        speaker: String,
        listener: String,
        content: String,
    },
    AnnounceEvent {
        message: String,
        announcer: String,
        stage: String,
        content: String,
    },
    MindVoiceEvent {
        message: String,
        actor: String,
        content: String,
    },
    /// Validation feedback for a dropped action.
    HintEvent { message: String },
    StageTransitionEvent {
        message: String,
        actor: String,
        from_stage: String,
        to_stage: String,
    },
    CombatKickOffEvent {
        message: String,
        actor: String,
        description: String,
    },
    CombatPerformanceEvent {
        message: String,
        stage: String,
        performance: String,
    },
    CombatDeathEvent { message: String, actor: String },
    CombatCompleteEvent {
        message: String,
        actor: String,
        summary: String,
    },
}

impl GameEvent {
    pub fn agent(message: impl Into<String>) -> Self {
        Self::AgentEvent {
            message: message.into(),
        }
    }

    pub fn hint(message: impl Into<String>) -> Self {
        Self::HintEvent {
            message: message.into(),
        }
    }

    /// Text appended to an agent's memory when the event reaches it.
    pub fn message(&self) -> &str {
        match self {
            Self::AgentEvent { message }
            | Self::SpeakEvent { message, .. }
            | Self::WhisperEvent { message, .. }
            | Self::AnnounceEvent { message, .. }
            | Self::MindVoiceEvent { message, .. }
            | Self::HintEvent { message }
            | Self::StageTransitionEvent { message, .. }
            | Self::CombatKickOffEvent { message, .. }
            | Self::CombatPerformanceEvent { message, .. }
            | Self::CombatDeathEvent { message, .. }
            | Self::CombatCompleteEvent { message, .. } => message,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AgentEvent { .. } => "AgentEvent",
            Self::SpeakEvent { .. } => "SpeakEvent",
            Self::WhisperEvent { .. } => "WhisperEvent",
            Self::AnnounceEvent { .. } => "AnnounceEvent",
            Self::MindVoiceEvent { .. } => "MindVoiceEvent",
            Self::HintEvent { .. } => "HintEvent",
            Self::StageTransitionEvent { .. } => "StageTransitionEvent",
            Self::CombatKickOffEvent { .. } => "CombatKickOffEvent",
            Self::CombatPerformanceEvent { .. } => "CombatPerformanceEvent",
            Self::CombatDeathEvent { .. } => "CombatDeathEvent",
            Self::CombatCompleteEvent { .. } => "CombatCompleteEvent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_event_carries_class_name() {
        let event = GameEvent::SpeakEvent {
            message: "Aria to Borin: hello".into(),
            speaker: "Aria".into(),
            listener: "Borin".into(),
            content: "hello".into(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event_type"], "SpeakEvent");
        assert_eq!(json["event_type"], event.event_type());
        assert_eq!(event.message(), "Aria to Borin: hello");
    }
}
