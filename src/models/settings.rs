use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted application settings.
///
/// Every field is optional so that a missing or partial settings file falls
/// back to defaults derived from the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
    /// User restored into the session on the next start
    #[serde(default)]
    pub signed_in_user_id: Option<i64>,
}
