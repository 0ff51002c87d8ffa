//! Signed-in user of the running application

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::User;
use super::error::ServiceError;

#[derive(Debug, Default)]
pub struct Session {
    current: Mutex<Option<User>>,
}

impl Session {
    pub fn current_user(&self) -> Option<User> {
        self.slot().clone()
    }

    /// The signed-in user, or `NoSignedInUser`
    pub fn require_user(&self) -> Result<User, ServiceError> {
        self.current_user().ok_or(ServiceError::NoSignedInUser)
    }

    pub fn set_user(&self, user: User) {
        *self.slot() = Some(user);
    }

    /// Sign out, returning the user who was signed in
    pub fn clear(&self) -> Option<User> {
        self.slot().take()
    }

    fn slot(&self) -> MutexGuard<'_, Option<User>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
