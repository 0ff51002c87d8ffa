use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub manager_id: i64,
    /// Six-digit code other users enter to join the team
    pub code: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn is_manager(&self, user_id: i64) -> bool {
        self.manager_id == user_id
    }
}
