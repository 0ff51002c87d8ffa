//! Database connection management and migrations

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::ProjectStatus;

/// Format used for deadline columns
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("The {entity} with id {id} could not be found in the database")]
    NotFound { entity: &'static str, id: i64 },
    #[error("The {entity} with id {id} was modified concurrently")]
    Conflict { entity: &'static str, id: i64 },
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::QueryFailed(err.to_string())
    }
}

/// Wrapper around SQLite connection
pub struct Database {
    pub conn: Connection,
    /// `None` for in-memory databases
    pub path: Option<PathBuf>,
}

impl Database {
    /// Get the database file path inside a data directory
    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join("teamboard.sqlite")
    }
}

/// Open or create the database at `path`, applying pending migrations
pub fn open_database(path: &Path) -> Result<Database, DatabaseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConnectionFailed(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }
    }

    info!("Opening database at {:?}", path);

    let conn = Connection::open(path)
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
    prepare_connection(&conn)?;

    Ok(Database {
        conn,
        path: Some(path.to_path_buf()),
    })
}

/// Open a private in-memory database with the full schema
pub fn open_in_memory() -> Result<Database, DatabaseError> {
    let conn = Connection::open_in_memory()
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
    prepare_connection(&conn)?;

    Ok(Database { conn, path: None })
}

fn prepare_connection(conn: &Connection) -> Result<(), DatabaseError> {
    // Memberships and projects cascade with their team
    conn.execute("PRAGMA foreign_keys = ON", [])
        .map_err(|e| DatabaseError::MigrationFailed(format!("Failed to enable foreign keys: {}", e)))?;

    run_migrations(conn)
}

/// Run database schema migrations
fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    // A fresh database has no schema_version table yet
    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    debug!("Current schema version: {}", current_version);

    if current_version < 1 {
        info!("Applying migration v1: Initial schema");
        conn.execute_batch(include_str!("schema.sql"))
            .map_err(|e| DatabaseError::MigrationFailed(format!("Failed to apply v1 schema: {}", e)))?;
    }

    Ok(())
}

/// Parse an RFC 3339 timestamp column, falling back to now for legacy rows
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Read a deadline column
pub(crate) fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let value: String = row.get(idx)?;
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a project status column
pub(crate) fn status_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<ProjectStatus> {
    let value: String = row.get(idx)?;
    ProjectStatus::from_str(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(DatabaseError::InvalidData(format!("Unknown project status: {}", value))),
        )
    })
}
