//! In-process event bus
//!
//! Managers publish an [`AppEvent`] after every successful state change so
//! views can refresh without registering listeners on the managers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::ProjectStatus;

/// A state change that already happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    SignedIn { user_id: i64 },
    SignedOut { user_id: i64 },
    AccountUpdated { user_id: i64 },
    TeamCreated { team_id: i64 },
    TeamMembersChanged { team_id: i64 },
    TeamCodeChanged { team_id: i64 },
    TeamManagerChanged { team_id: i64, manager_id: i64 },
    TeamDeleted { team_id: i64 },
    ProjectCreated { project_id: i64, team_id: i64 },
    ProjectUpdated { project_id: i64 },
    ProjectStatusChanged {
        project_id: i64,
        from: ProjectStatus,
        to: ProjectStatus,
        actor_id: i64,
    },
}

/// Default buffer capacity for the broadcast channel
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out bus; clones share the same channel
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped when nobody listens.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
