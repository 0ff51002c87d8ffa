//! Commands behind the single-project view

use serde::Serialize;

use crate::models::{Project, ProjectStatus, ProjectUpdate, User};
use crate::services::{
    ProjectManager, ServiceError, StatusChange, TransitionError, UnauthorizedReason, UserManager,
};
use crate::storage::DatabaseError;
use crate::AppState;

/// A project with its people resolved, as shown in the details view
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetails {
    pub project: Project,
    pub supervisor: Option<User>,
    pub assignee: Option<User>,
    /// Whether the signed-in user may edit the fields
    pub editable: bool,
}

/// Which status buttons are enabled, and which one shows the current status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusButtons {
    pub selected: ProjectStatus,
    pub to_do: bool,
    pub in_progress: bool,
    pub turned_in: bool,
    pub finished: bool,
}

pub fn project_details(state: &AppState, project_id: i64) -> Result<ProjectDetails, String> {
    let projects = ProjectManager::new(state);
    let users = UserManager::new(state);

    let project = projects.project(project_id).map_err(|e| e.to_string())?;
    let editable = projects.can_edit(project_id).map_err(|e| e.to_string())?;
    let supervisor = users.user_by_id(project.supervisor_id).map_err(|e| e.to_string())?;
    let assignee = users.user_by_id(project.assignee_id).map_err(|e| e.to_string())?;

    Ok(ProjectDetails {
        project,
        supervisor,
        assignee,
        editable,
    })
}

pub fn status_buttons(state: &AppState, project_id: i64) -> Result<StatusButtons, String> {
    let projects = ProjectManager::new(state);
    let project = projects.project(project_id).map_err(|e| e.to_string())?;
    let actions = projects
        .available_actions(project_id)
        .map_err(|e| e.to_string())?;

    Ok(StatusButtons {
        selected: project.status,
        to_do: actions.allows(ProjectStatus::ToDo),
        in_progress: actions.allows(ProjectStatus::InProgress),
        turned_in: actions.allows(ProjectStatus::TurnedIn),
        finished: actions.allows(ProjectStatus::Finished),
    })
}

pub fn set_project_status(
    state: &AppState,
    project_id: i64,
    target: ProjectStatus,
) -> Result<StatusChange, String> {
    ProjectManager::new(state)
        .change_status(project_id, target)
        .map_err(|e| match e {
            ServiceError::Transition(TransitionError::Unauthorized(reason)) => match (reason, target) {
                (UnauthorizedReason::NotProjectMember, _) => reason.to_string(),
                // The message follows the requested status, not the missing role
                (_, ProjectStatus::Finished) => UnauthorizedReason::SupervisorOnly { target }.to_string(),
                (_, ProjectStatus::InProgress | ProjectStatus::TurnedIn) => {
                    UnauthorizedReason::AssigneeOnly { target }.to_string()
                }
                (_, ProjectStatus::ToDo) => reason.to_string(),
            },
            ServiceError::Transition(TransitionError::StorageFailure(DatabaseError::NotFound { .. })) => {
                format!("The project with id {} doesn't exist", project_id)
            }
            ServiceError::Transition(TransitionError::StorageFailure(DatabaseError::Conflict { .. })) => {
                "The project was changed by someone else, please try again.".to_string()
            }
            other => other.to_string(),
        })
}

pub fn save_project(state: &AppState, project_id: i64, update: ProjectUpdate) -> Result<Project, String> {
    let projects = ProjectManager::new(state);
    let current = projects.project(project_id).map_err(|e| e.to_string())?;
    let new_title = update.title.trim().to_string();

    projects
        .update_project(project_id, update)
        .map_err(|e| match e {
            ServiceError::InexistentProject(_) | ServiceError::Storage(DatabaseError::NotFound { .. }) => format!(
                "The project \"{}\" could not be found in the database.",
                current.title
            ),
            ServiceError::Storage(DatabaseError::Conflict { .. }) => format!(
                "The project \"{}\" was changed by someone else, please reload it.",
                current.title
            ),
            ServiceError::NoSignedInUser
            | ServiceError::Unauthorised(_)
            | ServiceError::InexistentUser(_)
            | ServiceError::UnregisteredMemberRole { .. } => format!(
                "You don't have access to edit the project \"{}\"",
                current.title
            ),
            ServiceError::DuplicateProjectName { .. } => {
                format!("The project with title \"{}\" already exists", new_title)
            }
            other => other.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::commands::projects::create_project;
    use crate::commands::teams::{add_member, create_team};
    use crate::commands::users::{sign_in, sign_up};
    use crate::models::NewProject;

    /// ann supervises "Logo", assigned to bob; cat is in the team too
    fn setup() -> (AppState, Project) {
        let state = AppState::in_memory().unwrap();
        for name in ["ann", "bob", "cat"] {
            sign_up(&state, name, "secret1").unwrap();
        }
        sign_in(&state, "ann", "secret1").unwrap();
        let team = create_team(&state, "Design").unwrap();
        add_member(&state, team.id, "bob").unwrap();
        add_member(&state, team.id, "cat").unwrap();

        let project = create_project(
            &state,
            NewProject {
                title: "Logo".to_string(),
                team_id: team.id,
                assignee: "bob".to_string(),
                deadline: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                description: None,
            },
        )
        .unwrap();
        (state, project)
    }

    fn update(title: &str) -> ProjectUpdate {
        ProjectUpdate {
            title: title.to_string(),
            assignee: "bob".to_string(),
            supervisor: "ann".to_string(),
            deadline: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            description: Some("Bigger".to_string()),
        }
    }

    #[test]
    fn test_status_messages() {
        let (state, project) = setup();

        assert_eq!(
            set_project_status(&state, project.id, ProjectStatus::InProgress).unwrap_err(),
            "Only the assignee can set the project as in progress or turn in the project."
        );
        assert_eq!(
            set_project_status(&state, project.id, ProjectStatus::Finished).unwrap_err(),
            "You cannot set the project from status TO_DO to FINISHED"
        );

        sign_in(&state, "bob", "secret1").unwrap();
        set_project_status(&state, project.id, ProjectStatus::TurnedIn).unwrap();
        assert_eq!(
            set_project_status(&state, project.id, ProjectStatus::Finished).unwrap_err(),
            "Only the supervisor can set the project as finished."
        );

        sign_in(&state, "cat", "secret1").unwrap();
        assert_eq!(
            set_project_status(&state, project.id, ProjectStatus::ToDo).unwrap_err(),
            "Only the supervisor or the assignee can change the status of this project."
        );
        assert_eq!(
            set_project_status(&state, 999, ProjectStatus::ToDo).unwrap_err(),
            "The project with id 999 doesn't exist"
        );
    }

    #[test]
    fn test_back_to_to_do_message() {
        let (state, project) = setup();
        sign_in(&state, "bob", "secret1").unwrap();
        set_project_status(&state, project.id, ProjectStatus::InProgress).unwrap();

        sign_in(&state, "ann", "secret1").unwrap();
        assert_eq!(
            set_project_status(&state, project.id, ProjectStatus::ToDo).unwrap_err(),
            "Only the assignee can set the project back to to do."
        );
    }

    #[test]
    fn test_status_buttons() {
        let (state, project) = setup();
        let buttons = status_buttons(&state, project.id).unwrap();
        assert_eq!(buttons.selected, ProjectStatus::ToDo);
        assert!(!buttons.to_do && !buttons.in_progress && !buttons.turned_in && !buttons.finished);

        sign_in(&state, "bob", "secret1").unwrap();
        set_project_status(&state, project.id, ProjectStatus::TurnedIn).unwrap();
        let buttons = status_buttons(&state, project.id).unwrap();
        assert!(buttons.to_do && buttons.in_progress);
        assert!(!buttons.finished);

        sign_in(&state, "ann", "secret1").unwrap();
        let buttons = status_buttons(&state, project.id).unwrap();
        assert_eq!(buttons.selected, ProjectStatus::TurnedIn);
        assert!(buttons.finished && buttons.to_do && buttons.in_progress);
        assert!(!buttons.turned_in);
    }

    #[test]
    fn test_save_project_messages() {
        let (state, project) = setup();

        let saved = save_project(&state, project.id, update("Brand")).unwrap();
        assert_eq!(saved.title, "Brand");

        sign_in(&state, "bob", "secret1").unwrap();
        assert_eq!(
            save_project(&state, project.id, update("Other")).unwrap_err(),
            "You don't have access to edit the project \"Brand\""
        );

        let details = project_details(&state, project.id).unwrap();
        assert!(!details.editable);
        assert_eq!(details.supervisor.unwrap().username, "ann");
        assert_eq!(details.assignee.unwrap().username, "bob");
    }
}
