//! Storage module for SQLite database operations
//!
//! This module provides:
//! - Database connection management
//! - Schema migrations
//! - Repository implementations for users, teams and projects

pub mod db;
pub mod user_repo;
pub mod team_repo;
pub mod project_repo;

pub use db::{Database, open_database, open_in_memory, DatabaseError};
pub use user_repo::UserRepo;
pub use team_repo::TeamRepo;
pub use project_repo::ProjectRepo;
