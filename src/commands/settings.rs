use crate::models::AppSettings;
use crate::storage::Database;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "teamboard";
const SETTINGS_FILE: &str = "settings.json";

/// Platform data directory used when `--data-dir` is not given
pub fn default_data_dir() -> Result<PathBuf, String> {
    Ok(dirs::data_dir()
        .ok_or("Could not find the application data directory")?
        .join(APP_DIR))
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

/// Read the settings, using defaults when the file does not exist yet
pub fn load_settings(data_dir: &Path) -> Result<AppSettings, String> {
    let settings_path = settings_path(data_dir);

    if !settings_path.exists() {
        return Ok(AppSettings::default());
    }

    let content = fs::read_to_string(&settings_path)
        .map_err(|e| format!("Failed to read settings: {}", e))?;

    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse settings: {}", e))
}

pub fn save_settings(data_dir: &Path, settings: &AppSettings) -> Result<(), String> {
    fs::create_dir_all(data_dir)
        .map_err(|e| format!("Failed to create data directory: {}", e))?;

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;

    fs::write(settings_path(data_dir), content)
        .map_err(|e| format!("Failed to write settings: {}", e))?;

    Ok(())
}

pub fn database_path(data_dir: &Path, settings: &AppSettings) -> PathBuf {
    settings
        .database_path
        .clone()
        .unwrap_or_else(|| Database::db_path(data_dir))
}

pub fn log_dir(data_dir: &Path, settings: &AppSettings) -> PathBuf {
    settings
        .log_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("logs"))
}
