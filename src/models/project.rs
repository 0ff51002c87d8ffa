use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Workflow status of a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    ToDo,
    InProgress,
    TurnedIn,
    Finished,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::ToDo
    }
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::ToDo,
        ProjectStatus::InProgress,
        ProjectStatus::TurnedIn,
        ProjectStatus::Finished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::ToDo => "TO_DO",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::TurnedIn => "TURNED_IN",
            ProjectStatus::Finished => "FINISHED",
        }
    }

    /// Parse a status name. Case, dashes and spaces are ignored, so
    /// `"in-progress"` and `"In Progress"` both parse.
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "TO_DO" | "TODO" => Some(ProjectStatus::ToDo),
            "IN_PROGRESS" => Some(ProjectStatus::InProgress),
            "TURNED_IN" => Some(ProjectStatus::TurnedIn),
            "FINISHED" => Some(ProjectStatus::Finished),
            _ => None,
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::ToDo => "To Do",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::TurnedIn => "Turned In",
            ProjectStatus::Finished => "Finished",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Finished)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub team_id: i64,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub status: ProjectStatus,
    pub supervisor_id: i64,
    pub assignee_id: i64,
    /// Bumped on every write, compared on status updates
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// A project that has not been saved yet. The id is assigned by storage.
    pub fn new(
        title: String,
        team_id: i64,
        deadline: NaiveDate,
        supervisor_id: i64,
        assignee_id: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title,
            team_id,
            description: None,
            deadline,
            status: ProjectStatus::ToDo,
            supervisor_id,
            assignee_id,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn is_supervisor(&self, user_id: i64) -> bool {
        self.supervisor_id == user_id
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Input for creating a project. People are referenced by username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub team_id: i64,
    pub assignee: String,
    pub deadline: NaiveDate,
    pub description: Option<String>,
}

/// Replacement values for the editable project fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub title: String,
    pub assignee: String,
    pub supervisor: String,
    pub deadline: NaiveDate,
    pub description: Option<String>,
}

/// Deadline buckets used when filtering a team's projects
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnInTime {
    #[default]
    All,
    /// Deadline passed and the project is not finished
    Overdue,
    DueThisWeek,
    DueThisMonth,
    Later,
}

impl TurnInTime {
    pub const ALL: [TurnInTime; 5] = [
        TurnInTime::All,
        TurnInTime::Overdue,
        TurnInTime::DueThisWeek,
        TurnInTime::DueThisMonth,
        TurnInTime::Later,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnInTime::All => "all",
            TurnInTime::Overdue => "overdue",
            TurnInTime::DueThisWeek => "due_this_week",
            TurnInTime::DueThisMonth => "due_this_month",
            TurnInTime::Later => "later",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        TurnInTime::ALL.into_iter().find(|t| t.as_str() == normalized)
    }

    pub fn matches(&self, project: &Project, today: NaiveDate) -> bool {
        let days_left = (project.deadline - today).num_days();
        match self {
            TurnInTime::All => true,
            TurnInTime::Overdue => days_left < 0 && !project.is_finished(),
            TurnInTime::DueThisWeek => (0..7).contains(&days_left),
            TurnInTime::DueThisMonth => (0..30).contains(&days_left),
            TurnInTime::Later => days_left >= 30,
        }
    }
}

/// Filter applied when listing the projects of a team.
///
/// Selecting both `assigned_to_me` and `supervised_by_me` is the same as
/// selecting neither: no restriction on the caller's role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub assigned_to_me: bool,
    pub supervised_by_me: bool,
    pub turn_in_time: TurnInTime,
}

impl ProjectFilter {
    pub fn restricts_privilege(&self) -> bool {
        self.assigned_to_me != self.supervised_by_me
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_due(deadline: NaiveDate, status: ProjectStatus) -> Project {
        let mut project = Project::new("Report".to_string(), 1, deadline, 1, 2);
        project.status = status;
        project
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_parsing_is_lenient() {
        assert_eq!(ProjectStatus::from_str("TO_DO"), Some(ProjectStatus::ToDo));
        assert_eq!(ProjectStatus::from_str("todo"), Some(ProjectStatus::ToDo));
        assert_eq!(ProjectStatus::from_str("in-progress"), Some(ProjectStatus::InProgress));
        assert_eq!(ProjectStatus::from_str("Turned In"), Some(ProjectStatus::TurnedIn));
        assert_eq!(ProjectStatus::from_str("done"), None);
    }

    #[test]
    fn test_status_serializes_as_upper_snake_case() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert_eq!(ProjectStatus::TurnedIn.to_string(), "TURNED_IN");
    }

    #[test]
    fn test_turn_in_time_buckets() {
        let today = date(2024, 3, 10);

        let overdue = project_due(date(2024, 3, 1), ProjectStatus::InProgress);
        assert!(TurnInTime::Overdue.matches(&overdue, today));
        assert!(!TurnInTime::DueThisWeek.matches(&overdue, today));

        let finished_late = project_due(date(2024, 3, 1), ProjectStatus::Finished);
        assert!(!TurnInTime::Overdue.matches(&finished_late, today));

        let due_today = project_due(today, ProjectStatus::ToDo);
        assert!(TurnInTime::DueThisWeek.matches(&due_today, today));
        assert!(TurnInTime::DueThisMonth.matches(&due_today, today));

        let later = project_due(date(2024, 5, 1), ProjectStatus::ToDo);
        assert!(TurnInTime::Later.matches(&later, today));
        assert!(!TurnInTime::DueThisMonth.matches(&later, today));
        assert!(TurnInTime::All.matches(&later, today));
    }

    #[test]
    fn test_privilege_filter_both_or_neither_is_unrestricted() {
        let mut filter = ProjectFilter::default();
        assert!(!filter.restricts_privilege());
        filter.assigned_to_me = true;
        assert!(filter.restricts_privilege());
        filter.supervised_by_me = true;
        assert!(!filter.restricts_privilege());
    }
}
