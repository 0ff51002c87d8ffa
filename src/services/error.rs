//! Errors raised by the domain managers

use thiserror::Error;

use crate::storage::DatabaseError;
use super::workflow::TransitionError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No user is signed in, this functionality is accessible to signed-in users only")]
    NoSignedInUser,

    #[error("The user {0} doesn't exist")]
    InexistentUser(String),

    #[error("The team with id {0} doesn't exist")]
    InexistentTeam(i64),

    #[error("No team has the code {0}")]
    InexistentTeamCode(String),

    #[error("The project with id {0} doesn't exist")]
    InexistentProject(i64),

    #[error("Unauthorised operation: {0}")]
    Unauthorised(String),

    #[error("{user} is already a member of team {team}")]
    AlreadyMember { user: String, team: String },

    #[error("{user} is not a member of team {team}")]
    UnregisteredMember { user: String, team: String },

    #[error("{user} cannot be {role} because they are not a member of team {team}")]
    UnregisteredMemberRole {
        user: String,
        role: &'static str,
        team: String,
    },

    #[error("{manager} cannot leave team {team} because they are the manager")]
    ManagerRemoval { team: String, manager: String },

    #[error("Invalid project name: a project with name {title} already exists in team {team}")]
    DuplicateProjectName { title: String, team: String },

    #[error("The username {0} is already taken")]
    DuplicateUsername(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}
