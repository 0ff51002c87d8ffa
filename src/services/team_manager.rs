//! Teams, join codes and memberships

use rusqlite::Connection;
use tracing::{debug, info};

use crate::models::{Team, User};
use crate::storage::{TeamRepo, UserRepo};
use crate::utils::validation;
use crate::AppState;
use super::error::ServiceError;
use super::events::{AppEvent, EventBus};
use super::session::Session;

/// Attempts at drawing a join code nobody else uses
const CODE_ATTEMPTS: usize = 32;

pub struct TeamManager<'a> {
    conn: &'a Connection,
    session: &'a Session,
    events: &'a EventBus,
}

impl<'a> TeamManager<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            conn: &state.db.conn,
            session: &state.session,
            events: &state.events,
        }
    }

    /// Create a team managed by the signed-in user
    pub fn create_team(&self, name: &str) -> Result<Team, ServiceError> {
        let user = self.session.require_user()?;
        let name = validation::check_name("team", name).map_err(ServiceError::Validation)?;

        let code = self.unused_code()?;
        let team = TeamRepo::new(self.conn).create(&name, user.id, &code)?;

        self.events.publish(AppEvent::TeamCreated { team_id: team.id });
        info!("Team {} ({}) created by {}", team.name, team.id, user.username);
        Ok(team)
    }

    pub fn teams_of_current_user(&self) -> Result<Vec<Team>, ServiceError> {
        let user = self.session.require_user()?;
        Ok(TeamRepo::new(self.conn).list_for_user(user.id)?)
    }

    /// A team the signed-in user belongs to
    pub fn team(&self, team_id: i64) -> Result<Team, ServiceError> {
        self.joined(team_id)
    }

    pub fn join_team(&self, code: &str) -> Result<Team, ServiceError> {
        let user = self.session.require_user()?;
        let code = code.trim();
        let repo = TeamRepo::new(self.conn);

        let team = repo
            .get_by_code(code)?
            .ok_or_else(|| ServiceError::InexistentTeamCode(code.to_string()))?;
        if repo.is_member(team.id, user.id)? {
            return Err(ServiceError::AlreadyMember {
                user: user.username,
                team: team.name,
            });
        }

        repo.add_member(team.id, user.id)?;
        self.events.publish(AppEvent::TeamMembersChanged { team_id: team.id });
        info!("{} joined team {}", user.username, team.id);
        Ok(team)
    }

    /// Leave a team. The manager has to pass the position on first.
    pub fn leave_team(&self, team_id: i64) -> Result<(), ServiceError> {
        let user = self.session.require_user()?;
        let team = self.load(team_id)?;

        if team.is_manager(user.id) {
            return Err(ServiceError::ManagerRemoval {
                team: team.name,
                manager: user.username,
            });
        }
        if !TeamRepo::new(self.conn).remove_member(team.id, user.id)? {
            return Err(ServiceError::UnregisteredMember {
                user: user.username,
                team: team.name,
            });
        }

        self.events.publish(AppEvent::TeamMembersChanged { team_id });
        info!("{} left team {}", user.username, team_id);
        Ok(())
    }

    pub fn add_member(&self, team_id: i64, username: &str) -> Result<User, ServiceError> {
        let team = self.managed(team_id)?;
        let member = self.existing_user(username)?;
        let repo = TeamRepo::new(self.conn);

        if repo.is_member(team.id, member.id)? {
            return Err(ServiceError::AlreadyMember {
                user: member.username,
                team: team.name,
            });
        }

        repo.add_member(team.id, member.id)?;
        self.events.publish(AppEvent::TeamMembersChanged { team_id });
        info!("{} added to team {}", member.username, team_id);
        Ok(member)
    }

    pub fn remove_member(&self, team_id: i64, username: &str) -> Result<User, ServiceError> {
        let team = self.managed(team_id)?;
        let member = self.existing_user(username)?;

        if team.is_manager(member.id) {
            return Err(ServiceError::ManagerRemoval {
                team: team.name,
                manager: member.username,
            });
        }
        if !TeamRepo::new(self.conn).remove_member(team.id, member.id)? {
            return Err(ServiceError::UnregisteredMember {
                user: member.username,
                team: team.name,
            });
        }

        self.events.publish(AppEvent::TeamMembersChanged { team_id });
        info!("{} removed from team {}", member.username, team_id);
        Ok(member)
    }

    /// Replace the join code; the old one stops working
    pub fn regenerate_code(&self, team_id: i64) -> Result<String, ServiceError> {
        let team = self.managed(team_id)?;
        let code = self.unused_code()?;

        TeamRepo::new(self.conn).set_code(team.id, &code)?;
        self.events.publish(AppEvent::TeamCodeChanged { team_id });
        info!("New join code for team {}", team_id);
        Ok(code)
    }

    pub fn pass_manager_position(&self, team_id: i64, username: &str) -> Result<Team, ServiceError> {
        let mut team = self.managed(team_id)?;
        let successor = self.existing_user(username)?;
        let repo = TeamRepo::new(self.conn);

        if !repo.is_member(team.id, successor.id)? {
            return Err(ServiceError::UnregisteredMemberRole {
                user: successor.username,
                role: "manager",
                team: team.name,
            });
        }

        repo.set_manager(team.id, successor.id)?;
        team.manager_id = successor.id;
        self.events.publish(AppEvent::TeamManagerChanged {
            team_id,
            manager_id: successor.id,
        });
        info!("{} is now the manager of team {}", successor.username, team_id);
        Ok(team)
    }

    /// Delete a team together with its memberships and projects
    pub fn delete_team(&self, team_id: i64) -> Result<(), ServiceError> {
        let team = self.managed(team_id)?;
        TeamRepo::new(self.conn).delete(team.id)?;
        self.events.publish(AppEvent::TeamDeleted { team_id });
        info!("Team {} ({}) deleted", team.name, team_id);
        Ok(())
    }

    pub fn members_of_team(&self, team_id: i64) -> Result<Vec<User>, ServiceError> {
        let team = self.joined(team_id)?;
        Ok(TeamRepo::new(self.conn).members(team.id)?)
    }

    fn load(&self, team_id: i64) -> Result<Team, ServiceError> {
        TeamRepo::new(self.conn)
            .get(team_id)?
            .ok_or(ServiceError::InexistentTeam(team_id))
    }

    /// The team, if the signed-in user is a member
    fn joined(&self, team_id: i64) -> Result<Team, ServiceError> {
        let user = self.session.require_user()?;
        let team = self.load(team_id)?;
        if !TeamRepo::new(self.conn).is_member(team.id, user.id)? {
            return Err(ServiceError::UnregisteredMember {
                user: user.username,
                team: team.name,
            });
        }
        Ok(team)
    }

    /// The team, if the signed-in user manages it
    fn managed(&self, team_id: i64) -> Result<Team, ServiceError> {
        let user = self.session.require_user()?;
        let team = self.load(team_id)?;
        if !team.is_manager(user.id) {
            return Err(ServiceError::Unauthorised(format!(
                "only the manager of team {} can do this",
                team.name
            )));
        }
        Ok(team)
    }

    fn existing_user(&self, username: &str) -> Result<User, ServiceError> {
        let username = username.trim();
        UserRepo::new(self.conn)
            .get_by_name(username)?
            .ok_or_else(|| ServiceError::InexistentUser(username.to_string()))
    }

    fn unused_code(&self) -> Result<String, ServiceError> {
        let repo = TeamRepo::new(self.conn);
        for _ in 0..CODE_ATTEMPTS {
            let code = validation::generate_team_code();
            if !repo.code_exists(&code)? {
                return Ok(code);
            }
            debug!("Join code collision, drawing again");
        }
        Err(ServiceError::Validation(
            "Could not generate an unused team code".to_string(),
        ))
    }
}
