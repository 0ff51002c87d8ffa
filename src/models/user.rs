use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A registered account. The password hash lives only in storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
