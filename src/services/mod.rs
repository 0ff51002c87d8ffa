//! Services module for business logic
//!
//! The managers borrow an [`AppState`](crate::AppState) and coordinate
//! between the session, storage and the event bus. The project status rules
//! live in [`workflow`], independent of storage.

pub mod error;
pub mod events;
pub mod session;
pub mod workflow;
pub mod user_manager;
pub mod team_manager;
pub mod project_manager;

pub use error::ServiceError;
pub use events::{AppEvent, EventBus};
pub use session::Session;
pub use workflow::{AvailableActions, ProjectWorkflow, StatusChange, TransitionError, UnauthorizedReason};
pub use user_manager::UserManager;
pub use team_manager::TeamManager;
pub use project_manager::ProjectManager;
