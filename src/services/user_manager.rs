//! Accounts and the signed-in session

use rusqlite::Connection;
use tracing::{info, warn};

use crate::models::User;
use crate::storage::UserRepo;
use crate::utils::{password, validation};
use crate::AppState;
use super::error::ServiceError;
use super::events::{AppEvent, EventBus};
use super::session::Session;

pub struct UserManager<'a> {
    conn: &'a Connection,
    session: &'a Session,
    events: &'a EventBus,
}

impl<'a> UserManager<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            conn: &state.db.conn,
            session: &state.session,
            events: &state.events,
        }
    }

    /// Register a new account. Does not sign it in.
    pub fn sign_up(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let username = username.trim();
        validation::check_username(username).map_err(ServiceError::Validation)?;
        validation::check_password(password).map_err(ServiceError::Validation)?;

        let repo = UserRepo::new(self.conn);
        if repo.exists_by_name(username)? {
            return Err(ServiceError::DuplicateUsername(username.to_string()));
        }

        let hash = hash(password)?;
        let user = repo.create(username, &hash)?;
        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub fn sign_in(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let repo = UserRepo::new(self.conn);
        let user = repo
            .get_by_name(username.trim())?
            .ok_or(ServiceError::InvalidCredentials)?;
        let stored = repo
            .password_hash(user.id)?
            .ok_or(ServiceError::InvalidCredentials)?;

        let matches = password::verify_password(password, &stored)
            .map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
        if !matches {
            warn!("Failed sign-in for {}", user.username);
            return Err(ServiceError::InvalidCredentials);
        }

        self.session.set_user(user.clone());
        self.events.publish(AppEvent::SignedIn { user_id: user.id });
        info!("Signed in {}", user.username);
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<User, ServiceError> {
        let user = self.session.clear().ok_or(ServiceError::NoSignedInUser)?;
        self.events.publish(AppEvent::SignedOut { user_id: user.id });
        info!("Signed out {}", user.username);
        Ok(user)
    }

    /// Re-establish the session of a user remembered from a previous run
    pub fn restore_session(&self, user_id: i64) -> Result<User, ServiceError> {
        let user = UserRepo::new(self.conn)
            .get(user_id)?
            .ok_or_else(|| ServiceError::InexistentUser(format!("with id {}", user_id)))?;
        self.session.set_user(user.clone());
        Ok(user)
    }

    pub fn current_user(&self) -> Result<User, ServiceError> {
        self.session.require_user()
    }

    /// Change the username and/or password of the signed-in user
    pub fn update_account(
        &self,
        new_username: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<User, ServiceError> {
        let mut user = self.session.require_user()?;
        let repo = UserRepo::new(self.conn);

        if let Some(username) = new_username.map(str::trim) {
            if username != user.username {
                validation::check_username(username).map_err(ServiceError::Validation)?;
                if repo.exists_by_name(username)? {
                    return Err(ServiceError::DuplicateUsername(username.to_string()));
                }
                repo.update_username(user.id, username)?;
                user.username = username.to_string();
            }
        }

        if let Some(password) = new_password {
            validation::check_password(password).map_err(ServiceError::Validation)?;
            repo.update_password_hash(user.id, &hash(password)?)?;
        }

        self.session.set_user(user.clone());
        self.events.publish(AppEvent::AccountUpdated { user_id: user.id });
        info!("Updated account {}", user.id);
        Ok(user)
    }

    pub fn user_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        Ok(UserRepo::new(self.conn).get(id)?)
    }

    pub fn user_by_name(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(UserRepo::new(self.conn).get_by_name(username.trim())?)
    }
}

fn hash(password: &str) -> Result<String, ServiceError> {
    password::hash_password(password).map_err(|e| ServiceError::PasswordHash(e.to_string()))
}
