//! Controller functions over [`AppState`](crate::AppState).
//!
//! Every command returns `Result<T, String>` where the error is the message
//! shown to the user.

pub mod users;
pub mod teams;
pub mod projects;
pub mod project_details;
pub mod settings;
