//! Project repository for team projects and their workflow status

use rusqlite::{params, Connection, OptionalExtension};
use chrono::Utc;

use crate::models::{Project, ProjectStatus};
use crate::services::workflow::{ProjectState, ProjectStore};
use super::db::{date_column, format_date, parse_timestamp, status_column};
use super::DatabaseError;

const PROJECT_COLUMNS: &str =
    "id, title, team_id, description, deadline, status, supervisor_id, assignee_id, version, created_at, updated_at";

/// Repository for projects
#[derive(Clone, Copy)]
pub struct ProjectRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ProjectRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new project and return its id
    pub fn create(&self, project: &Project) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO projects (title, team_id, description, deadline, status, supervisor_id,
                                   assignee_id, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                project.title,
                project.team_id,
                project.description,
                format_date(project.deadline),
                project.status.as_str(),
                project.supervisor_id,
                project.assignee_id,
                project.version,
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a project by ID
    pub fn get(&self, id: i64) -> Result<Option<Project>, DatabaseError> {
        let project = self.conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS),
                [id],
                |row| self.row_to_project(row),
            )
            .optional()?;
        Ok(project)
    }

    /// Get a project of a team by its title
    pub fn get_by_title(&self, team_id: i64, title: &str) -> Result<Option<Project>, DatabaseError> {
        let project = self.conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE team_id = ? AND title = ?", PROJECT_COLUMNS),
                params![team_id, title],
                |row| self.row_to_project(row),
            )
            .optional()?;
        Ok(project)
    }

    /// Update the editable fields of a project.
    ///
    /// The write only applies if the stored version still equals
    /// `project.version`; returns `false` otherwise.
    pub fn update(&self, project: &Project) -> Result<bool, DatabaseError> {
        let count = self.conn.execute(
            "UPDATE projects
             SET title = ?, description = ?, deadline = ?, supervisor_id = ?, assignee_id = ?,
                 version = version + 1, updated_at = ?
             WHERE id = ? AND version = ?",
            params![
                project.title,
                project.description,
                format_date(project.deadline),
                project.supervisor_id,
                project.assignee_id,
                Utc::now().to_rfc3339(),
                project.id,
                project.version,
            ],
        )?;
        Ok(count > 0)
    }

    /// Set the status if the stored version still equals `expected_version`
    pub fn update_status(
        &self,
        id: i64,
        expected_version: i64,
        status: ProjectStatus,
    ) -> Result<bool, DatabaseError> {
        let count = self.conn.execute(
            "UPDATE projects SET status = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ?",
            params![status.as_str(), Utc::now().to_rfc3339(), id, expected_version],
        )?;
        Ok(count > 0)
    }

    /// List the projects of a team, optionally narrowed by status and role.
    /// Ordered by deadline, then title.
    pub fn list_for_team(
        &self,
        team_id: i64,
        status: Option<ProjectStatus>,
        assignee_id: Option<i64>,
        supervisor_id: Option<i64>,
    ) -> Result<Vec<Project>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM projects
             WHERE team_id = ?1
               AND (?2 IS NULL OR status = ?2)
               AND (?3 IS NULL OR assignee_id = ?3)
               AND (?4 IS NULL OR supervisor_id = ?4)
             ORDER BY deadline, title",
            PROJECT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![team_id, status.map(|s| s.as_str()), assignee_id, supervisor_id],
            |row| self.row_to_project(row),
        )?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    fn row_to_project(&self, row: &rusqlite::Row) -> rusqlite::Result<Project> {
        let created_at_str: String = row.get(9)?;
        let updated_at_str: String = row.get(10)?;

        Ok(Project {
            id: row.get(0)?,
            title: row.get(1)?,
            team_id: row.get(2)?,
            description: row.get(3)?,
            deadline: date_column(row, 4)?,
            status: status_column(row, 5)?,
            supervisor_id: row.get(6)?,
            assignee_id: row.get(7)?,
            version: row.get(8)?,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }
}

impl ProjectStore for ProjectRepo<'_> {
    fn load_project_state(&self, project_id: i64) -> Result<ProjectState, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, status, supervisor_id, assignee_id, version FROM projects WHERE id = ?",
                [project_id],
                |row| {
                    Ok(ProjectState {
                        id: row.get(0)?,
                        status: status_column(row, 1)?,
                        supervisor_id: row.get(2)?,
                        assignee_id: row.get(3)?,
                        version: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or(DatabaseError::NotFound { entity: "project", id: project_id })
    }

    fn save_project_status(
        &self,
        project_id: i64,
        expected_version: i64,
        status: ProjectStatus,
    ) -> Result<bool, DatabaseError> {
        self.update_status(project_id, expected_version, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::storage::{open_in_memory, Database, TeamRepo, UserRepo};

    struct Fixture {
        db: Database,
        team_id: i64,
        ann: i64,
        bob: i64,
    }

    fn fixture() -> Fixture {
        let db = open_in_memory().unwrap();
        let (team_id, ann, bob) = {
            let users = UserRepo::new(&db.conn);
            let ann = users.create("ann", "x").unwrap().id;
            let bob = users.create("bob", "x").unwrap().id;
            let team = TeamRepo::new(&db.conn).create("Design", ann, "123456").unwrap();
            (team.id, ann, bob)
        };
        Fixture { db, team_id, ann, bob }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn insert(fx: &Fixture, title: &str, deadline: NaiveDate, assignee: i64) -> i64 {
        let project = Project::new(title.to_string(), fx.team_id, deadline, fx.ann, assignee)
            .with_description(Some("notes".to_string()));
        ProjectRepo::new(&fx.db.conn).create(&project).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let fx = fixture();
        let id = insert(&fx, "Logo", date(5, 1), fx.bob);
        let repo = ProjectRepo::new(&fx.db.conn);

        let project = repo.get(id).unwrap().unwrap();
        assert_eq!(project.title, "Logo");
        assert_eq!(project.deadline, date(5, 1));
        assert_eq!(project.status, ProjectStatus::ToDo);
        assert_eq!(project.description.as_deref(), Some("notes"));
        assert_eq!(project.version, 0);

        assert_eq!(repo.get_by_title(fx.team_id, "Logo").unwrap().unwrap().id, id);
        assert!(repo.get(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_title_unique_per_team() {
        let fx = fixture();
        insert(&fx, "Logo", date(5, 1), fx.bob);
        let duplicate = Project::new("Logo".to_string(), fx.team_id, date(6, 1), fx.ann, fx.bob);
        assert!(ProjectRepo::new(&fx.db.conn).create(&duplicate).is_err());
    }

    #[test]
    fn test_update_status_compares_version() {
        let fx = fixture();
        let id = insert(&fx, "Logo", date(5, 1), fx.bob);
        let repo = ProjectRepo::new(&fx.db.conn);

        assert!(repo.update_status(id, 0, ProjectStatus::InProgress).unwrap());
        assert!(!repo.update_status(id, 0, ProjectStatus::TurnedIn).unwrap());

        let project = repo.get(id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.version, 1);
    }

    #[test]
    fn test_update_fields_bumps_version() {
        let fx = fixture();
        let id = insert(&fx, "Logo", date(5, 1), fx.bob);
        let repo = ProjectRepo::new(&fx.db.conn);

        let mut project = repo.get(id).unwrap().unwrap();
        project.title = "Brand".to_string();
        project.assignee_id = fx.ann;
        assert!(repo.update(&project).unwrap());
        // Same stale copy a second time
        assert!(!repo.update(&project).unwrap());

        let stored = repo.get(id).unwrap().unwrap();
        assert_eq!(stored.title, "Brand");
        assert_eq!(stored.assignee_id, fx.ann);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn test_list_for_team_filters() {
        let fx = fixture();
        let late = insert(&fx, "Late", date(3, 1), fx.bob);
        let soon = insert(&fx, "Soon", date(2, 1), fx.ann);
        let repo = ProjectRepo::new(&fx.db.conn);
        repo.update_status(late, 0, ProjectStatus::InProgress).unwrap();

        let all = repo.list_for_team(fx.team_id, None, None, None).unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![soon, late]);

        let in_progress = repo.list_for_team(fx.team_id, Some(ProjectStatus::InProgress), None, None).unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, late);

        let bobs = repo.list_for_team(fx.team_id, None, Some(fx.bob), None).unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, late);

        let supervised = repo.list_for_team(fx.team_id, None, None, Some(fx.ann)).unwrap();
        assert_eq!(supervised.len(), 2);
    }

    #[test]
    fn test_store_reports_missing_project() {
        let fx = fixture();
        let repo = ProjectRepo::new(&fx.db.conn);
        match repo.load_project_state(42) {
            Err(DatabaseError::NotFound { entity, id }) => {
                assert_eq!(entity, "project");
                assert_eq!(id, 42);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_projects_removed_with_team() {
        let fx = fixture();
        let id = insert(&fx, "Logo", date(5, 1), fx.bob);
        TeamRepo::new(&fx.db.conn).delete(fx.team_id).unwrap();
        assert!(ProjectRepo::new(&fx.db.conn).get(id).unwrap().is_none());
    }
}
