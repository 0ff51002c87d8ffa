//! Project creation and listing commands

use chrono::NaiveDate;
use tracing::info;

use crate::models::{NewProject, Project, ProjectFilter};
use crate::services::{ProjectManager, ServiceError};
use crate::AppState;

pub fn create_project(state: &AppState, request: NewProject) -> Result<Project, String> {
    let title = request.title.trim().to_string();
    let project = ProjectManager::new(state)
        .create_project(request)
        .map_err(|e| match e {
            ServiceError::DuplicateProjectName { .. } => {
                format!("The project with title \"{}\" already exists", title)
            }
            ServiceError::UnregisteredMemberRole { user, .. } => {
                format!("The user {} is not a member of this team and cannot be the assignee.", user)
            }
            ServiceError::UnregisteredMember { .. } => {
                "You can only create projects in teams you are a member of.".to_string()
            }
            ServiceError::InexistentUser(name) => format!("The user {} doesn't exist.", name),
            ServiceError::Storage(_) => {
                format!("An internal error occurred, the project \"{}\" could not be created.", title)
            }
            other => other.to_string(),
        })?;

    info!("Created project: {} ({})", project.title, project.id);
    Ok(project)
}

/// Projects of a team matching `filter`, with deadlines measured from `today`
pub fn list_projects(
    state: &AppState,
    team_id: i64,
    filter: &ProjectFilter,
    today: NaiveDate,
) -> Result<Vec<Project>, String> {
    ProjectManager::new(state)
        .projects_of_team(team_id, filter, today)
        .map_err(|e| match e {
            ServiceError::Storage(_) => {
                "An internal error occurred, the projects could not be displayed.".to_string()
            }
            other => other.to_string(),
        })
}
