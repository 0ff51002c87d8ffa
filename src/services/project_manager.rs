//! Team projects: creation, editing, listing and status changes

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use crate::models::{NewProject, Project, ProjectFilter, ProjectStatus, ProjectUpdate, Team, User};
use crate::storage::{DatabaseError, ProjectRepo, TeamRepo, UserRepo};
use crate::utils::validation;
use crate::AppState;
use super::error::ServiceError;
use super::events::{AppEvent, EventBus};
use super::session::Session;
use super::workflow::{AvailableActions, ProjectWorkflow, Role, StatusChange};

pub struct ProjectManager<'a> {
    conn: &'a Connection,
    session: &'a Session,
    events: &'a EventBus,
}

impl<'a> ProjectManager<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            conn: &state.db.conn,
            session: &state.session,
            events: &state.events,
        }
    }

    /// Create a project supervised by the signed-in user
    pub fn create_project(&self, new: NewProject) -> Result<Project, ServiceError> {
        let user = self.session.require_user()?;
        let team = self.team_of_member(new.team_id, &user)?;
        let title = validation::check_name("project", &new.title).map_err(ServiceError::Validation)?;
        let assignee = self.member_for_role(&team, &new.assignee, Role::Assignee)?;

        let repo = ProjectRepo::new(self.conn);
        if repo.get_by_title(team.id, &title)?.is_some() {
            return Err(ServiceError::DuplicateProjectName { title, team: team.name });
        }

        let mut project = Project::new(title, team.id, new.deadline, user.id, assignee.id)
            .with_description(new.description);
        project.id = repo.create(&project)?;

        self.events.publish(AppEvent::ProjectCreated {
            project_id: project.id,
            team_id: team.id,
        });
        info!(
            "Project {} ({}) created in team {} by {}",
            project.title, project.id, team.id, user.username
        );
        Ok(project)
    }

    /// A project of one of the signed-in user's teams
    pub fn project(&self, project_id: i64) -> Result<Project, ServiceError> {
        let user = self.session.require_user()?;
        self.visible_project(project_id, &user)
    }

    /// Replace the editable fields. Only the supervisor may edit, and only
    /// until the project is finished.
    pub fn update_project(&self, project_id: i64, update: ProjectUpdate) -> Result<Project, ServiceError> {
        let user = self.session.require_user()?;
        let mut project = self.load(project_id)?;
        if !editable_by(&project, user.id) {
            return Err(ServiceError::Unauthorised(
                "only the supervisor can edit an unfinished project".to_string(),
            ));
        }

        let team = self.load_team(project.team_id)?;
        let title = validation::check_name("project", &update.title).map_err(ServiceError::Validation)?;
        let supervisor = self.member_for_role(&team, &update.supervisor, Role::Supervisor)?;
        let assignee = self.member_for_role(&team, &update.assignee, Role::Assignee)?;

        let repo = ProjectRepo::new(self.conn);
        if let Some(other) = repo.get_by_title(team.id, &title)? {
            if other.id != project.id {
                return Err(ServiceError::DuplicateProjectName { title, team: team.name });
            }
        }

        project.title = title;
        project.supervisor_id = supervisor.id;
        project.assignee_id = assignee.id;
        project.deadline = update.deadline;
        project = project.with_description(update.description);

        if !repo.update(&project)? {
            return Err(DatabaseError::Conflict { entity: "project", id: project_id }.into());
        }
        project.version += 1;

        self.events.publish(AppEvent::ProjectUpdated { project_id });
        info!("Project {} updated by {}", project_id, user.username);
        Ok(project)
    }

    /// Whether the signed-in user may edit the project fields
    pub fn can_edit(&self, project_id: i64) -> Result<bool, ServiceError> {
        let user = self.session.require_user()?;
        let project = self.visible_project(project_id, &user)?;
        Ok(editable_by(&project, user.id))
    }

    /// Projects of a team visible through `filter`, ordered by deadline.
    /// Deadline buckets are measured from `today`.
    pub fn projects_of_team(
        &self,
        team_id: i64,
        filter: &ProjectFilter,
        today: NaiveDate,
    ) -> Result<Vec<Project>, ServiceError> {
        let user = self.session.require_user()?;
        self.team_of_member(team_id, &user)?;

        let (assignee, supervisor) = if filter.restricts_privilege() {
            (
                filter.assigned_to_me.then_some(user.id),
                filter.supervised_by_me.then_some(user.id),
            )
        } else {
            (None, None)
        };

        let projects = ProjectRepo::new(self.conn).list_for_team(team_id, filter.status, assignee, supervisor)?;
        Ok(projects
            .into_iter()
            .filter(|p| filter.turn_in_time.matches(p, today))
            .collect())
    }

    /// Move a project to `target` on behalf of the signed-in user
    pub fn change_status(&self, project_id: i64, target: ProjectStatus) -> Result<StatusChange, ServiceError> {
        let user = self.session.require_user()?;
        Ok(self.workflow().request_status_change(project_id, user.id, target)?)
    }

    pub fn available_actions(&self, project_id: i64) -> Result<AvailableActions, ServiceError> {
        let user = self.session.require_user()?;
        Ok(self.workflow().available_actions(project_id, user.id)?)
    }

    fn workflow(&self) -> ProjectWorkflow<ProjectRepo<'a>> {
        ProjectWorkflow::new(ProjectRepo::new(self.conn)).with_events(self.events.clone())
    }

    fn load(&self, project_id: i64) -> Result<Project, ServiceError> {
        ProjectRepo::new(self.conn)
            .get(project_id)?
            .ok_or(ServiceError::InexistentProject(project_id))
    }

    fn visible_project(&self, project_id: i64, user: &User) -> Result<Project, ServiceError> {
        let project = self.load(project_id)?;
        self.team_of_member(project.team_id, user)?;
        Ok(project)
    }

    fn load_team(&self, team_id: i64) -> Result<Team, ServiceError> {
        TeamRepo::new(self.conn)
            .get(team_id)?
            .ok_or(ServiceError::InexistentTeam(team_id))
    }

    fn team_of_member(&self, team_id: i64, user: &User) -> Result<Team, ServiceError> {
        let team = self.load_team(team_id)?;
        if !TeamRepo::new(self.conn).is_member(team.id, user.id)? {
            return Err(ServiceError::UnregisteredMember {
                user: user.username.clone(),
                team: team.name,
            });
        }
        Ok(team)
    }

    /// Resolve `username` to a member of `team` who will hold `role`
    fn member_for_role(&self, team: &Team, username: &str, role: Role) -> Result<User, ServiceError> {
        let username = username.trim();
        let user = UserRepo::new(self.conn)
            .get_by_name(username)?
            .ok_or_else(|| ServiceError::InexistentUser(username.to_string()))?;

        if !TeamRepo::new(self.conn).is_member(team.id, user.id)? {
            return Err(ServiceError::UnregisteredMemberRole {
                user: user.username,
                role: role.as_str(),
                team: team.name.clone(),
            });
        }
        Ok(user)
    }
}

fn editable_by(project: &Project, user_id: i64) -> bool {
    project.is_supervisor(user_id) && !project.is_finished()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TurnInTime;
    use crate::services::workflow::{TransitionError, UnauthorizedReason};
    use crate::services::{TeamManager, UserManager};

    struct Fixture {
        state: AppState,
        team_id: i64,
    }

    /// ann manages a team with bob as member; cat is an outsider.
    /// ann is signed in.
    fn fixture() -> Fixture {
        let state = AppState::in_memory().unwrap();
        let team_id = {
            let users = UserManager::new(&state);
            for name in ["ann", "bob", "cat"] {
                users.sign_up(name, "secret1").unwrap();
            }
            users.sign_in("ann", "secret1").unwrap();
            let teams = TeamManager::new(&state);
            let team = teams.create_team("Design").unwrap();
            teams.add_member(team.id, "bob").unwrap();
            team.id
        };
        Fixture { state, team_id }
    }

    fn sign_in_as(fx: &Fixture, name: &str) {
        UserManager::new(&fx.state).sign_in(name, "secret1").unwrap();
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn new_project(fx: &Fixture, title: &str, assignee: &str, deadline: NaiveDate) -> NewProject {
        NewProject {
            title: title.to_string(),
            team_id: fx.team_id,
            assignee: assignee.to_string(),
            deadline,
            description: None,
        }
    }

    fn update_of(project: &Project, title: &str, supervisor: &str, assignee: &str) -> ProjectUpdate {
        ProjectUpdate {
            title: title.to_string(),
            assignee: assignee.to_string(),
            supervisor: supervisor.to_string(),
            deadline: project.deadline,
            description: Some("revised".to_string()),
        }
    }

    #[test]
    fn test_create_project() {
        let fx = fixture();
        let projects = ProjectManager::new(&fx.state);

        let project = projects.create_project(new_project(&fx, "Logo", "bob", date(5, 1))).unwrap();
        assert_eq!(project.status, ProjectStatus::ToDo);
        assert!(project.id > 0);
        assert_eq!(projects.project(project.id).unwrap().title, "Logo");

        assert!(matches!(
            projects.create_project(new_project(&fx, "Logo", "bob", date(6, 1))),
            Err(ServiceError::DuplicateProjectName { .. })
        ));
        assert!(matches!(
            projects.create_project(new_project(&fx, "Poster", "cat", date(6, 1))),
            Err(ServiceError::UnregisteredMemberRole { role: "assignee", .. })
        ));
        assert!(matches!(
            projects.create_project(new_project(&fx, "Poster", "zed", date(6, 1))),
            Err(ServiceError::InexistentUser(_))
        ));
    }

    #[test]
    fn test_titles_may_repeat_across_teams() {
        let fx = fixture();
        let projects = ProjectManager::new(&fx.state);
        projects.create_project(new_project(&fx, "Logo", "bob", date(5, 1))).unwrap();

        let other = TeamManager::new(&fx.state).create_team("Print").unwrap();
        let mut request = new_project(&fx, "Logo", "ann", date(5, 1));
        request.team_id = other.id;
        assert_eq!(projects.create_project(request).unwrap().team_id, other.id);
    }

    #[test]
    fn test_outsider_cannot_read_project() {
        let fx = fixture();
        let projects = ProjectManager::new(&fx.state);
        let project = projects.create_project(new_project(&fx, "Logo", "bob", date(5, 1))).unwrap();

        sign_in_as(&fx, "cat");
        assert!(matches!(projects.project(project.id), Err(ServiceError::UnregisteredMember { .. })));
        assert!(matches!(projects.can_edit(project.id), Err(ServiceError::UnregisteredMember { .. })));
        assert!(matches!(projects.project(999), Err(ServiceError::InexistentProject(999))));
    }

    #[test]
    fn test_outsider_cannot_create() {
        let fx = fixture();
        sign_in_as(&fx, "cat");
        let projects = ProjectManager::new(&fx.state);
        assert!(matches!(
            projects.create_project(new_project(&fx, "Logo", "bob", date(5, 1))),
            Err(ServiceError::UnregisteredMember { .. })
        ));
    }

    #[test]
    fn test_update_project() {
        let fx = fixture();
        let projects = ProjectManager::new(&fx.state);
        let project = projects.create_project(new_project(&fx, "Logo", "bob", date(5, 1))).unwrap();
        projects.create_project(new_project(&fx, "Poster", "bob", date(5, 2))).unwrap();

        assert!(matches!(
            projects.update_project(project.id, update_of(&project, "Poster", "ann", "bob")),
            Err(ServiceError::DuplicateProjectName { .. })
        ));

        // Keeping its own title is fine
        let updated = projects.update_project(project.id, update_of(&project, "Logo", "ann", "ann")).unwrap();
        assert_eq!(updated.assignee_id, updated.supervisor_id);
        assert_eq!(updated.description.as_deref(), Some("revised"));
        assert_eq!(projects.project(project.id).unwrap().version, updated.version);
    }

    #[test]
    fn test_only_supervisor_edits_unfinished_project() {
        let fx = fixture();
        let projects = ProjectManager::new(&fx.state);
        let project = projects.create_project(new_project(&fx, "Logo", "bob", date(5, 1))).unwrap();
        assert!(projects.can_edit(project.id).unwrap());

        sign_in_as(&fx, "bob");
        assert!(!projects.can_edit(project.id).unwrap());
        assert!(matches!(
            projects.update_project(project.id, update_of(&project, "Brand", "bob", "bob")),
            Err(ServiceError::Unauthorised(_))
        ));
        projects.change_status(project.id, ProjectStatus::TurnedIn).unwrap();

        sign_in_as(&fx, "ann");
        projects.change_status(project.id, ProjectStatus::Finished).unwrap();
        assert!(!projects.can_edit(project.id).unwrap());
    }

    #[test]
    fn test_status_changes_through_workflow() {
        let fx = fixture();
        let projects = ProjectManager::new(&fx.state);
        let project = projects.create_project(new_project(&fx, "Logo", "bob", date(5, 1))).unwrap();

        match projects.change_status(project.id, ProjectStatus::InProgress) {
            Err(ServiceError::Transition(TransitionError::Unauthorized(UnauthorizedReason::AssigneeOnly { .. }))) => {}
            other => panic!("expected AssigneeOnly, got {:?}", other),
        }
        assert!(!projects.available_actions(project.id).unwrap().any());

        sign_in_as(&fx, "bob");
        let actions = projects.available_actions(project.id).unwrap();
        assert!(actions.in_progress && actions.turned_in);
        assert!(!actions.finished);

        let mut events = fx.state.events.subscribe();
        let change = projects.change_status(project.id, ProjectStatus::InProgress).unwrap();
        assert_eq!(change.from, ProjectStatus::ToDo);
        assert!(matches!(events.try_recv().unwrap(), AppEvent::ProjectStatusChanged { .. }));
        assert_eq!(projects.project(project.id).unwrap().status, ProjectStatus::InProgress);
    }

    #[test]
    fn test_projects_of_team_filters() {
        let fx = fixture();
        let projects = ProjectManager::new(&fx.state);
        let today = date(3, 1);
        let overdue = projects.create_project(new_project(&fx, "Old", "bob", date(2, 20))).unwrap();
        let week = projects.create_project(new_project(&fx, "Soon", "ann", date(3, 4))).unwrap();
        let later = projects.create_project(new_project(&fx, "Far", "bob", date(6, 1))).unwrap();

        let ids = |filter: &ProjectFilter| -> Vec<i64> {
            projects
                .projects_of_team(fx.team_id, filter, today)
                .unwrap()
                .into_iter()
                .map(|p| p.id)
                .collect()
        };

        assert_eq!(ids(&ProjectFilter::default()), vec![overdue.id, week.id, later.id]);

        let overdue_only = ProjectFilter { turn_in_time: TurnInTime::Overdue, ..Default::default() };
        assert_eq!(ids(&overdue_only), vec![overdue.id]);

        let this_week = ProjectFilter { turn_in_time: TurnInTime::DueThisWeek, ..Default::default() };
        assert_eq!(ids(&this_week), vec![week.id]);

        let assigned = ProjectFilter { assigned_to_me: true, ..Default::default() };
        assert_eq!(ids(&assigned), vec![week.id]);

        let both = ProjectFilter { assigned_to_me: true, supervised_by_me: true, ..Default::default() };
        assert_eq!(ids(&both).len(), 3);

        let in_progress = ProjectFilter { status: Some(ProjectStatus::InProgress), ..Default::default() };
        assert!(ids(&in_progress).is_empty());
    }

    #[test]
    fn test_listing_requires_membership() {
        let fx = fixture();
        sign_in_as(&fx, "cat");
        let projects = ProjectManager::new(&fx.state);
        assert!(matches!(
            projects.projects_of_team(fx.team_id, &ProjectFilter::default(), date(1, 1)),
            Err(ServiceError::UnregisteredMember { .. })
        ));
    }
}
