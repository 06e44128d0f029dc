//! Notification bus for team lifecycle events.
//!
//! Lightweight broadcast of "team N was created/updated/removed". Consumers
//! that fall behind lose the oldest events rather than blocking writers.

use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast::{self, Receiver, Sender};

/// Kind of change applied to a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Created,
    Updated,
    Removed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Removed => "Removed",
        };
        f.write_str(name)
    }
}

/// Event sent after a team change has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamEvent {
    /// The affected team
    pub id: u64,
    /// What happened to it
    #[serde(rename = "event")]
    pub kind: EventKind,
}

/// Notification bus for team events.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<TeamEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of buffered events.
    ///   Older events are dropped if consumers fall behind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    ///
    /// Returns a receiver that will receive all future events.
    pub fn subscribe(&self) -> Receiver<TeamEvent> {
        self.sender.subscribe()
    }

    /// Publish an event.
    ///
    /// Returns the number of receivers that received it.
    pub fn notify(&self, id: u64, kind: EventKind) -> usize {
        // send() returns an error if there are no receivers, which is fine
        let delivered = self.sender.send(TeamEvent { id, kind }).unwrap_or(0);
        tracing::trace!(id, %kind, delivered, "Team event published");
        delivered
    }

    /// Get the number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
