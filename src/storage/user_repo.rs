//! User repository for accounts and credentials

use rusqlite::{params, Connection, OptionalExtension};
use chrono::Utc;

use crate::models::User;
use super::db::parse_timestamp;
use super::DatabaseError;

/// Repository for user accounts
pub struct UserRepo<'a> {
    conn: &'a Connection,
}

impl<'a> UserRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new user and return it with its assigned id
    pub fn create(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
            params![username, password_hash, created_at.to_rfc3339()],
        )?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            created_at,
        })
    }

    /// Get a user by ID
    pub fn get(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let user = self.conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?",
                [id],
                |row| self.row_to_user(row),
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by username
    pub fn get_by_name(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = self.conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?",
                [username],
                |row| self.row_to_user(row),
            )
            .optional()?;
        Ok(user)
    }

    /// Stored PHC hash for a user
    pub fn password_hash(&self, id: i64) -> Result<Option<String>, DatabaseError> {
        let hash = self.conn
            .query_row("SELECT password_hash FROM users WHERE id = ?", [id], |row| row.get(0))
            .optional()?;
        Ok(hash)
    }

    pub fn exists_by_name(&self, username: &str) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn update_username(&self, id: i64, username: &str) -> Result<bool, DatabaseError> {
        let count = self.conn.execute(
            "UPDATE users SET username = ? WHERE id = ?",
            params![username, id],
        )?;
        Ok(count > 0)
    }

    pub fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, DatabaseError> {
        let count = self.conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![password_hash, id],
        )?;
        Ok(count > 0)
    }

    fn row_to_user(&self, row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at_str: String = row.get(2)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            created_at: parse_timestamp(&created_at_str),
        })
    }
}
