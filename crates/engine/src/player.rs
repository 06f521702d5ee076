//! Player proxy: inbound command queue and outbound notification buffer.

use std::collections::VecDeque;

use dungeonforge_domain::GameEvent;
use dungeonforge_shared::PlayerNotification;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProxy {
    name: String,
    actor: String,
    commands: VecDeque<String>,
    notifications: Vec<PlayerNotification>,
}

impl PlayerProxy {
    /// `name` identifies the human; `actor` is the hero they control.
    pub fn new(name: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actor: actor.into(),
            commands: VecDeque::new(),
            notifications: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn enqueue_command(&mut self, command: impl Into<String>) {
        self.commands.push_back(command.into());
    }

    /// FIFO: oldest command first.
    pub fn next_command(&mut self) -> Option<String> {
        self.commands.pop_front()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    pub fn add_notification(&mut self, header: impl Into<String>, event: GameEvent) {
        self.notifications
            .push(PlayerNotification::new(header, event));
    }

    pub fn notifications(&self) -> &[PlayerNotification] {
        &self.notifications
    }

    /// Hand the buffered notifications to the front end and clear the buffer.
    pub fn take_notifications(&mut self) -> Vec<PlayerNotification> {
        std::mem::take(&mut self.notifications)
    }
}
