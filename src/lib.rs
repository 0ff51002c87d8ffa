pub mod models;
pub mod storage;
pub mod services;
pub mod commands;
pub mod utils;
pub mod cli;

use std::process::ExitCode;

use storage::{Database, DatabaseError};
use services::{EventBus, Session};

/// Everything the managers and commands work against
pub struct AppState {
    pub db: Database,
    pub session: Session,
    pub events: EventBus,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            session: Session::default(),
            events: EventBus::default(),
        }
    }

    /// State backed by a private in-memory database
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(storage::open_in_memory()?))
    }
}

/// Parse the command line and run the requested command
pub fn run() -> ExitCode {
    cli::run()
}
