//! Agent short-term memory.
//!
//! One ordered chat log per agent name. Logs only grow, except for
//! [`AgentMemory::discard_last_human_ai_pair`] (rollback of a failed exchange)
//! and [`AgentMemory::compress_between_tags`] (combat summaries).

use std::collections::BTreeMap;

use dungeonforge_domain::{AgentShortTermMemory, ChatMessage, MessageRole};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMemory {
    slots: BTreeMap<String, Vec<ChatMessage>>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log with its system message. Ignored once the log has entries.
    pub fn append_system(&mut self, name: &str, content: impl Into<String>) {
        let slot = self.slots.entry(name.to_string()).or_default();
        if slot.is_empty() {
            slot.push(ChatMessage::system(content));
        }
    }

    pub fn append_human(&mut self, name: &str, content: impl Into<String>) {
        self.slots
            .entry(name.to_string())
            .or_default()
            .push(ChatMessage::human(content));
    }

    pub fn append_human_with_tags(
        &mut self,
        name: &str,
        content: impl Into<String>,
        tags: BTreeMap<String, String>,
    ) {
        self.slots
            .entry(name.to_string())
            .or_default()
            .push(ChatMessage::human_with_tags(content, tags));
    }

    pub fn append_ai(&mut self, name: &str, content: impl Into<String>) {
        self.slots
            .entry(name.to_string())
            .or_default()
            .push(ChatMessage::ai(content));
    }

    /// Replace the log wholesale, used on restore.
    pub fn initialize_from_snapshot(&mut self, name: &str, messages: Vec<ChatMessage>) {
        self.slots.insert(name.to_string(), messages);
    }

    /// Drop the trailing human+ai exchange. Returns false (and changes nothing)
    /// unless the log ends with a human message followed by an ai message.
    pub fn discard_last_human_ai_pair(&mut self, name: &str) -> bool {
        let Some(slot) = self.slots.get_mut(name) else {
            return false;
        };
        let len = slot.len();
        if len < 2
            || slot[len - 1].role() != MessageRole::Ai
            || slot[len - 2].role() != MessageRole::Human
        {
            return false;
        }
        slot.truncate(len - 2);
        true
    }

    pub fn history(&self, name: &str) -> &[ChatMessage] {
        self.slots.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self, name: &str) -> usize {
        self.history(name).len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<ChatMessage>> {
        self.slots.remove(name)
    }

    /// Most recent human message whose tag `key` equals `value`, with its index.
    pub fn retrieve_recent_human_message_by_tag(
        &self,
        name: &str,
        key: &str,
        value: &str,
    ) -> Option<(usize, &ChatMessage)> {
        self.history(name)
            .iter()
            .enumerate()
            .rev()
            .find(|(_, m)| m.tag(key) == Some(value))
    }

    /// Replace the messages strictly between the most recent `begin` and `end`
    /// tagged human messages with a single human `summary`. The tagged
    /// messages themselves are kept. Returns false if either tag is missing or
    /// they are out of order.
    pub fn compress_between_tags(
        &mut self,
        name: &str,
        begin: (&str, &str),
        end: (&str, &str),
        summary: impl Into<String>,
    ) -> bool {
        let Some((start, _)) = self.retrieve_recent_human_message_by_tag(name, begin.0, begin.1)
        else {
            return false;
        };
        let Some((stop, _)) = self.retrieve_recent_human_message_by_tag(name, end.0, end.1) else {
            return false;
        };
        if stop <= start {
            return false;
        }
        let Some(slot) = self.slots.get_mut(name) else {
            return false;
        };
        slot.splice(start + 1..stop, [ChatMessage::human(summary)]);
        true
    }

    pub fn to_snapshot(&self) -> BTreeMap<String, AgentShortTermMemory> {
        self.slots
            .iter()
            .map(|(name, messages)| {
                (
                    name.clone(),
                    AgentShortTermMemory {
                        name: name.clone(),
                        chat_history: messages.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(key: &str, value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(key.to_string(), value.to_string())])
    }

    #[test]
    fn system_message_is_only_written_once() {
        let mut memory = AgentMemory::new();
        memory.append_system("Aria", "You are Aria");
        memory.append_system("Aria", "You are someone else");
        assert_eq!(memory.len("Aria"), 1);
        assert_eq!(memory.history("Aria")[0].content(), "You are Aria");
    }

    #[test]
    fn discard_removes_trailing_pair_only() {
        let mut memory = AgentMemory::new();
        memory.append_system("Aria", "sys");
        memory.append_human("Aria", "prompt");
        memory.append_ai("Aria", "reply");

        assert!(memory.discard_last_human_ai_pair("Aria"));
        assert_eq!(memory.len("Aria"), 1);
        // Tail is now a system message: idempotent no-op.
        assert!(!memory.discard_last_human_ai_pair("Aria"));
        assert_eq!(memory.len("Aria"), 1);
    }

    #[test]
    fn discard_ignores_ai_then_human_tail() {
        let mut memory = AgentMemory::new();
        memory.append_ai("Aria", "earlier reply");
        memory.append_human("Aria", "event");
        assert!(!memory.discard_last_human_ai_pair("Aria"));
        assert_eq!(memory.len("Aria"), 2);
        assert!(!memory.discard_last_human_ai_pair("Nobody"));
    }

    #[test]
    fn tagged_messages_are_found_newest_first() {
        let mut memory = AgentMemory::new();
        memory.append_human_with_tags("Aria", "first", tags("combat_kickoff_tag", "Crypt"));
        memory.append_human_with_tags("Aria", "second", tags("combat_kickoff_tag", "Crypt"));
        let (index, message) = memory
            .retrieve_recent_human_message_by_tag("Aria", "combat_kickoff_tag", "Crypt")
            .expect("found");
        assert_eq!(index, 1);
        assert_eq!(message.content(), "second");
    }

    #[test]
    fn compression_replaces_the_inner_slice() {
        let mut memory = AgentMemory::new();
        memory.append_system("Aria", "sys");
        memory.append_human_with_tags("Aria", "combat starts", tags("combat_kickoff_tag", "Crypt"));
        memory.append_ai("Aria", "I draw my sword");
        memory.append_human("Aria", "round 1");
        memory.append_ai("Aria", "I swing");
        memory.append_human_with_tags("Aria", "you won", tags("combat_result_tag", "Crypt"));

        assert!(memory.compress_between_tags(
            "Aria",
            ("combat_kickoff_tag", "Crypt"),
            ("combat_result_tag", "Crypt"),
            "I fought the goblin and won.",
        ));
        let contents: Vec<&str> = memory.history("Aria").iter().map(|m| m.content()).collect();
        assert_eq!(
            contents,
            vec!["sys", "combat starts", "I fought the goblin and won.", "you won"]
        );
    }

    #[test]
    fn compression_without_both_tags_changes_nothing() {
        let mut memory = AgentMemory::new();
        memory.append_human_with_tags("Aria", "combat starts", tags("combat_kickoff_tag", "Crypt"));
        memory.append_ai("Aria", "ready");
        assert!(!memory.compress_between_tags(
            "Aria",
            ("combat_kickoff_tag", "Crypt"),
            ("combat_result_tag", "Crypt"),
            "summary",
        ));
        assert_eq!(memory.len("Aria"), 2);
    }

    #[test]
    fn snapshot_round_trips() {
        let mut memory = AgentMemory::new();
        memory.append_system("Aria", "sys");
        memory.append_human("Aria", "hello");

        let mut restored = AgentMemory::new();
        for (name, slot) in memory.to_snapshot() {
            restored.initialize_from_snapshot(&name, slot.chat_history);
        }
        assert_eq!(restored, memory);
    }
}
