//! Team and membership commands

use crate::models::{Team, User};
use crate::services::{ServiceError, TeamManager};
use crate::AppState;

pub fn create_team(state: &AppState, name: &str) -> Result<Team, String> {
    TeamManager::new(state).create_team(name).map_err(|e| match e {
        ServiceError::Storage(_) => {
            "An internal error occurred, the team could not be created.".to_string()
        }
        other => other.to_string(),
    })
}

pub fn my_teams(state: &AppState) -> Result<Vec<Team>, String> {
    TeamManager::new(state)
        .teams_of_current_user()
        .map_err(|e| e.to_string())
}

pub fn team(state: &AppState, team_id: i64) -> Result<Team, String> {
    TeamManager::new(state).team(team_id).map_err(|e| e.to_string())
}

pub fn join_team(state: &AppState, code: &str) -> Result<Team, String> {
    TeamManager::new(state).join_team(code).map_err(|e| match e {
        ServiceError::InexistentTeamCode(code) => {
            format!("There is no team with the code {}.", code)
        }
        ServiceError::AlreadyMember { team, .. } => {
            format!("You are already a member of the team {}.", team)
        }
        other => other.to_string(),
    })
}

pub fn leave_team(state: &AppState, team_id: i64) -> Result<(), String> {
    TeamManager::new(state).leave_team(team_id).map_err(|e| match e {
        ServiceError::ManagerRemoval { .. } => {
            "The manager cannot leave the team, pass the manager position to another member first."
                .to_string()
        }
        other => other.to_string(),
    })
}

pub fn team_members(state: &AppState, team_id: i64) -> Result<Vec<User>, String> {
    TeamManager::new(state)
        .members_of_team(team_id)
        .map_err(|e| match e {
            ServiceError::Storage(_) => {
                "An internal error occurred, the members could not be displayed.".to_string()
            }
            other => other.to_string(),
        })
}

pub fn add_member(state: &AppState, team_id: i64, name: &str) -> Result<User, String> {
    TeamManager::new(state)
        .add_member(team_id, name)
        .map_err(|e| match e {
            ServiceError::Storage(_) => format!(
                "An internal error occurred, the member {} could not be added to the team.",
                name
            ),
            ServiceError::Unauthorised(_) => {
                "You are not allowed to add a new member to the team.".to_string()
            }
            ServiceError::InexistentUser(_) => format!(
                "The user {} doesn't exist.\nCheck that you have introduced the name correctly.",
                name
            ),
            ServiceError::AlreadyMember { .. } => {
                format!("The user {} is already a member of this team.", name)
            }
            other => other.to_string(),
        })
}

pub fn remove_member(state: &AppState, team_id: i64, name: &str) -> Result<User, String> {
    TeamManager::new(state)
        .remove_member(team_id, name)
        .map_err(|e| match e {
            ServiceError::Storage(_) => format!(
                "An internal error occurred, the member {} could not be removed.",
                name
            ),
            ServiceError::Unauthorised(_) => {
                "You are not allowed to remove a member from this team.".to_string()
            }
            ServiceError::UnregisteredMember { .. } => {
                format!("The user {} is not a member of this team.", name)
            }
            ServiceError::InexistentUser(_) => format!(
                "The user {} could not be removed, because it doesn't exist.",
                name
            ),
            ServiceError::ManagerRemoval { .. } => {
                "The manager cannot be removed from the team.".to_string()
            }
            other => other.to_string(),
        })
}

pub fn regenerate_code(state: &AppState, team_id: i64) -> Result<String, String> {
    TeamManager::new(state)
        .regenerate_code(team_id)
        .map_err(|e| match e {
            ServiceError::Unauthorised(_) => {
                "You are not allowed to change the code of this team.".to_string()
            }
            other => other.to_string(),
        })
}

pub fn pass_manager_position(state: &AppState, team_id: i64, name: &str) -> Result<Team, String> {
    TeamManager::new(state)
        .pass_manager_position(team_id, name)
        .map_err(|e| match e {
            ServiceError::Unauthorised(_) => {
                "You are not allowed to pass the manager position of this team.".to_string()
            }
            ServiceError::InexistentUser(_) => format!("The user {} doesn't exist.", name),
            ServiceError::UnregisteredMemberRole { .. } => format!(
                "The user {} is not a member of this team and cannot become its manager.",
                name
            ),
            other => other.to_string(),
        })
}

pub fn delete_team(state: &AppState, team_id: i64) -> Result<(), String> {
    TeamManager::new(state).delete_team(team_id).map_err(|e| match e {
        ServiceError::Unauthorised(_) => "You are not allowed to delete this team.".to_string(),
        other => other.to_string(),
    })
}
