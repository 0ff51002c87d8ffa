//! Account commands

use crate::models::User;
use crate::services::{ServiceError, UserManager};
use crate::AppState;

pub fn sign_up(state: &AppState, username: &str, password: &str) -> Result<User, String> {
    UserManager::new(state)
        .sign_up(username, password)
        .map_err(|e| match e {
            ServiceError::DuplicateUsername(name) => {
                format!("The username {} is already taken, please choose another one.", name)
            }
            ServiceError::Storage(_) | ServiceError::PasswordHash(_) => {
                "An internal error occurred, the account could not be created.".to_string()
            }
            other => other.to_string(),
        })
}

pub fn sign_in(state: &AppState, username: &str, password: &str) -> Result<User, String> {
    UserManager::new(state)
        .sign_in(username, password)
        .map_err(|e| match e {
            ServiceError::InvalidCredentials => {
                "The username or the password is incorrect.".to_string()
            }
            other => format!("An internal error occurred, could not sign in: {}", other),
        })
}

pub fn sign_out(state: &AppState) -> Result<User, String> {
    UserManager::new(state).sign_out().map_err(|e| e.to_string())
}

pub fn current_user(state: &AppState) -> Result<User, String> {
    UserManager::new(state).current_user().map_err(|e| e.to_string())
}

/// Look up another user by name
pub fn find_user(state: &AppState, username: &str) -> Result<User, String> {
    let users = UserManager::new(state);
    users.current_user().map_err(|e| e.to_string())?;
    users
        .user_by_name(username)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("The user {} doesn't exist.", username.trim()))
}

pub fn update_account(
    state: &AppState,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<User, String> {
    if username.is_none() && password.is_none() {
        return Err("Nothing to update.".to_string());
    }
    UserManager::new(state)
        .update_account(username, password)
        .map_err(|e| match e {
            ServiceError::Storage(_) | ServiceError::PasswordHash(_) => {
                "An internal error occurred, the account could not be updated.".to_string()
            }
            other => other.to_string(),
        })
}
