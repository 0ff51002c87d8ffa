//! Project status workflow
//!
//! Decides whether a requested status change is legal for the requesting
//! user and applies it through a [`ProjectStore`]. Roles are relative to a
//! single project:
//!
//! | Current       | Supervisor may set to          | Assignee may set to      |
//! |---------------|--------------------------------|--------------------------|
//! | `TO_DO`       | none                           | `IN_PROGRESS`, `TURNED_IN` |
//! | `IN_PROGRESS` | none                           | `TO_DO`, `TURNED_IN`     |
//! | `TURNED_IN`   | `FINISHED`, `IN_PROGRESS`, `TO_DO` | `IN_PROGRESS`, `TO_DO` |
//! | `FINISHED`    | none                           | none                     |
//!
//! A user holding both roles gets the union of both columns.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::ProjectStatus;
use crate::storage::DatabaseError;
use super::events::{AppEvent, EventBus};

/// Fresh reads after a write lost to a concurrent modification
const STALE_WRITE_RETRIES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Supervisor,
    Assignee,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Supervisor, Role::Assignee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supervisor => "supervisor",
            Role::Assignee => "assignee",
        }
    }
}

/// Statuses `role` may move a project to from `current`
pub fn allowed_targets(current: ProjectStatus, role: Role) -> &'static [ProjectStatus] {
    use crate::models::ProjectStatus::*;

    match (current, role) {
        (ToDo, Role::Assignee) => &[InProgress, TurnedIn],
        (InProgress, Role::Assignee) => &[ToDo, TurnedIn],
        (TurnedIn, Role::Assignee) => &[InProgress, ToDo],
        (TurnedIn, Role::Supervisor) => &[Finished, InProgress, ToDo],
        _ => &[],
    }
}

/// Whether any role may move a project from `from` to `to`
pub fn is_reachable(from: ProjectStatus, to: ProjectStatus) -> bool {
    Role::ALL.iter().any(|role| allowed_targets(from, *role).contains(&to))
}

/// Status-relevant slice of a stored project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectState {
    pub id: i64,
    pub status: ProjectStatus,
    pub supervisor_id: i64,
    pub assignee_id: i64,
    pub version: i64,
}

/// Persistence the workflow reads from and writes through
pub trait ProjectStore {
    /// Missing projects are `DatabaseError::NotFound`
    fn load_project_state(&self, project_id: i64) -> Result<ProjectState, DatabaseError>;

    /// Write `status` if the stored version equals `expected_version`.
    /// Returns `false` when the project changed since it was read.
    fn save_project_status(
        &self,
        project_id: i64,
        expected_version: i64,
        status: ProjectStatus,
    ) -> Result<bool, DatabaseError>;
}

/// The roles a user holds on one project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectRoles {
    pub supervisor: bool,
    pub assignee: bool,
}

impl ProjectRoles {
    pub fn of(user_id: i64, state: &ProjectState) -> Self {
        Self {
            supervisor: user_id == state.supervisor_id,
            assignee: user_id == state.assignee_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.supervisor && !self.assignee
    }

    pub fn holds(&self, role: Role) -> bool {
        match role {
            Role::Supervisor => self.supervisor,
            Role::Assignee => self.assignee,
        }
    }

    pub fn permits(&self, from: ProjectStatus, to: ProjectStatus) -> bool {
        Role::ALL
            .iter()
            .filter(|role| self.holds(**role))
            .any(|role| allowed_targets(from, *role).contains(&to))
    }
}

/// Which status controls a user may use on a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AvailableActions {
    pub to_do: bool,
    pub in_progress: bool,
    pub turned_in: bool,
    pub finished: bool,
}

impl AvailableActions {
    pub fn for_roles(status: ProjectStatus, roles: ProjectRoles) -> Self {
        let mut actions = Self::default();
        for role in Role::ALL.iter().filter(|role| roles.holds(**role)) {
            for target in allowed_targets(status, *role) {
                actions.enable(*target);
            }
        }
        actions
    }

    pub fn allows(&self, status: ProjectStatus) -> bool {
        match status {
            ProjectStatus::ToDo => self.to_do,
            ProjectStatus::InProgress => self.in_progress,
            ProjectStatus::TurnedIn => self.turned_in,
            ProjectStatus::Finished => self.finished,
        }
    }

    pub fn any(&self) -> bool {
        self.to_do || self.in_progress || self.turned_in || self.finished
    }

    fn enable(&mut self, status: ProjectStatus) {
        match status {
            ProjectStatus::ToDo => self.to_do = true,
            ProjectStatus::InProgress => self.in_progress = true,
            ProjectStatus::TurnedIn => self.turned_in = true,
            ProjectStatus::Finished => self.finished = true,
        }
    }
}

/// Why a requester may not perform a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// Requester is neither supervisor nor assignee
    NotProjectMember,
    /// Only the supervisor may accept a turned-in project
    SupervisorOnly { target: ProjectStatus },
    /// Only the assignee drives the work between To Do, In Progress and Turned In
    AssigneeOnly { target: ProjectStatus },
}

impl UnauthorizedReason {
    pub fn required_role(&self) -> Option<Role> {
        match self {
            UnauthorizedReason::NotProjectMember => None,
            UnauthorizedReason::SupervisorOnly { .. } => Some(Role::Supervisor),
            UnauthorizedReason::AssigneeOnly { .. } => Some(Role::Assignee),
        }
    }
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthorizedReason::NotProjectMember => {
                f.write_str("Only the supervisor or the assignee can change the status of this project.")
            }
            UnauthorizedReason::SupervisorOnly { .. } => {
                f.write_str("Only the supervisor can set the project as finished.")
            }
            UnauthorizedReason::AssigneeOnly { target: ProjectStatus::ToDo } => {
                f.write_str("Only the assignee can set the project back to to do.")
            }
            UnauthorizedReason::AssigneeOnly { .. } => f.write_str(
                "Only the assignee can set the project as in progress or turn in the project.",
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("{0}")]
    Unauthorized(UnauthorizedReason),

    #[error("You cannot set the project from status {from} to {to}")]
    IllegalTransition {
        from: ProjectStatus,
        to: ProjectStatus,
    },

    #[error("The project status could not be saved: {0}")]
    StorageFailure(#[from] DatabaseError),
}

/// A status change that was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub project_id: i64,
    pub from: ProjectStatus,
    pub to: ProjectStatus,
}

/// Check a requested change against the roles of `requester`.
///
/// Role membership is checked first, so a user unrelated to the project is
/// `Unauthorized` even when the target is unreachable.
pub fn check_transition(
    state: &ProjectState,
    requester: i64,
    target: ProjectStatus,
) -> Result<(), TransitionError> {
    let roles = ProjectRoles::of(requester, state);
    if roles.is_empty() {
        return Err(TransitionError::Unauthorized(UnauthorizedReason::NotProjectMember));
    }

    if !is_reachable(state.status, target) {
        return Err(TransitionError::IllegalTransition {
            from: state.status,
            to: target,
        });
    }

    if roles.permits(state.status, target) {
        return Ok(());
    }

    // Reachable, so the role the requester lacks is the one that may do it
    let reason = if roles.supervisor {
        UnauthorizedReason::AssigneeOnly { target }
    } else {
        UnauthorizedReason::SupervisorOnly { target }
    };
    Err(TransitionError::Unauthorized(reason))
}

/// Applies status changes to stored projects
pub struct ProjectWorkflow<S> {
    store: S,
    events: Option<EventBus>,
}

impl<S: ProjectStore> ProjectWorkflow<S> {
    pub fn new(store: S) -> Self {
        Self { store, events: None }
    }

    /// Publish `ProjectStatusChanged` after every applied change
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Move a project to `target` on behalf of `requester`.
    ///
    /// Nothing is written unless the change is authorized and legal. The
    /// write is conditioned on the version that was checked; if another
    /// writer got in between, the check runs again on a fresh read.
    pub fn request_status_change(
        &self,
        project_id: i64,
        requester: i64,
        target: ProjectStatus,
    ) -> Result<StatusChange, TransitionError> {
        for attempt in 0..=STALE_WRITE_RETRIES {
            let state = self.store.load_project_state(project_id)?;

            if let Err(e) = check_transition(&state, requester, target) {
                warn!(
                    "Refused status change of project {} by user {}: {}",
                    project_id, requester, e
                );
                return Err(e);
            }

            if self.store.save_project_status(project_id, state.version, target)? {
                info!(
                    "Project {} moved from {} to {} by user {}",
                    project_id, state.status, target, requester
                );

                if let Some(events) = &self.events {
                    events.publish(AppEvent::ProjectStatusChanged {
                        project_id,
                        from: state.status,
                        to: target,
                        actor_id: requester,
                    });
                }

                return Ok(StatusChange {
                    project_id,
                    from: state.status,
                    to: target,
                });
            }

            warn!(
                "Project {} changed while updating its status (attempt {})",
                project_id,
                attempt + 1
            );
        }

        Err(TransitionError::StorageFailure(DatabaseError::Conflict {
            entity: "project",
            id: project_id,
        }))
    }

    /// Status controls `requester` may use on the project right now
    pub fn available_actions(
        &self,
        project_id: i64,
        requester: i64,
    ) -> Result<AvailableActions, TransitionError> {
        let state = self.store.load_project_state(project_id)?;
        Ok(AvailableActions::for_roles(
            state.status,
            ProjectRoles::of(requester, &state),
        ))
    }
}
