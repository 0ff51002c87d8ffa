//! Team repository for teams and memberships

use rusqlite::{params, Connection, OptionalExtension};
use chrono::Utc;

use crate::models::{Team, User};
use super::db::parse_timestamp;
use super::DatabaseError;

/// Repository for teams and team memberships
pub struct TeamRepo<'a> {
    conn: &'a Connection,
}

impl<'a> TeamRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a team and register its manager as the first member
    pub fn create(&self, name: &str, manager_id: i64, code: &str) -> Result<Team, DatabaseError> {
        let created_at = Utc::now();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO teams (name, manager_id, code, created_at) VALUES (?, ?, ?, ?)",
            params![name, manager_id, code, created_at.to_rfc3339()],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO team_members (team_id, user_id, joined_at) VALUES (?, ?, ?)",
            params![id, manager_id, created_at.to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(Team {
            id,
            name: name.to_string(),
            manager_id,
            code: code.to_string(),
            created_at,
        })
    }

    /// Get a team by ID
    pub fn get(&self, id: i64) -> Result<Option<Team>, DatabaseError> {
        let team = self.conn
            .query_row(
                "SELECT id, name, manager_id, code, created_at FROM teams WHERE id = ?",
                [id],
                |row| self.row_to_team(row),
            )
            .optional()?;
        Ok(team)
    }

    /// Get a team by its join code
    pub fn get_by_code(&self, code: &str) -> Result<Option<Team>, DatabaseError> {
        let team = self.conn
            .query_row(
                "SELECT id, name, manager_id, code, created_at FROM teams WHERE code = ?",
                [code],
                |row| self.row_to_team(row),
            )
            .optional()?;
        Ok(team)
    }

    pub fn code_exists(&self, code: &str) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM teams WHERE code = ?",
            [code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get all teams a user is a member of
    pub fn list_for_user(&self, user_id: i64) -> Result<Vec<Team>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.manager_id, t.code, t.created_at
             FROM teams t
             JOIN team_members tm ON tm.team_id = t.id
             WHERE tm.user_id = ?
             ORDER BY t.name"
        )?;

        let rows = stmt.query_map([user_id], |row| self.row_to_team(row))?;

        let mut teams = Vec::new();
        for row in rows {
            teams.push(row?);
        }
        Ok(teams)
    }

    pub fn add_member(&self, team_id: i64, user_id: i64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO team_members (team_id, user_id, joined_at) VALUES (?, ?, ?)",
            params![team_id, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove_member(&self, team_id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let count = self.conn.execute(
            "DELETE FROM team_members WHERE team_id = ? AND user_id = ?",
            params![team_id, user_id],
        )?;
        Ok(count > 0)
    }

    pub fn is_member(&self, team_id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM team_members WHERE team_id = ? AND user_id = ?",
            params![team_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Members of a team, manager included, ordered by username
    pub fn members(&self, team_id: i64) -> Result<Vec<User>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.username, u.created_at
             FROM users u
             JOIN team_members tm ON tm.user_id = u.id
             WHERE tm.team_id = ?
             ORDER BY u.username"
        )?;

        let rows = stmt.query_map([team_id], |row| {
            let created_at_str: String = row.get(2)?;
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                created_at: parse_timestamp(&created_at_str),
            })
        })?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }
        Ok(members)
    }

    pub fn set_code(&self, team_id: i64, code: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE teams SET code = ? WHERE id = ?",
            params![code, team_id],
        )?;
        Ok(())
    }

    pub fn set_manager(&self, team_id: i64, manager_id: i64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE teams SET manager_id = ? WHERE id = ?",
            params![manager_id, team_id],
        )?;
        Ok(())
    }

    /// Delete a team (memberships and projects are cascade deleted)
    pub fn delete(&self, team_id: i64) -> Result<bool, DatabaseError> {
        let count = self.conn.execute("DELETE FROM teams WHERE id = ?", [team_id])?;
        Ok(count > 0)
    }

    fn row_to_team(&self, row: &rusqlite::Row) -> rusqlite::Result<Team> {
        let created_at_str: String = row.get(4)?;
        Ok(Team {
            id: row.get(0)?,
            name: row.get(1)?,
            manager_id: row.get(2)?,
            code: row.get(3)?,
            created_at: parse_timestamp(&created_at_str),
        })
    }
}
