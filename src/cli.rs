//! `teamboard` command line

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, warn};

use crate::commands::{project_details, projects, settings, teams, users};
use crate::models::{
    AppSettings, NewProject, Project, ProjectFilter, ProjectStatus, ProjectUpdate, Team, TurnInTime, User,
};
use crate::services::UserManager;
use crate::storage::open_database;
use crate::utils::logging;
use crate::AppState;

/// Team project tracker.
/// Data lives in the platform data directory unless --data-dir is given.
#[derive(Parser)]
#[command(name = "teamboard", version, about = "Track team projects and their status")]
pub struct Cli {
    /// Directory holding the database, settings and logs.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an account.
    Signup {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in; the session is kept until signout.
    Signin {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session.
    Signout,
    /// Show the signed-in user.
    Whoami,
    /// Look up a user by name.
    Whois { username: String },
    /// Change the username or password of the signed-in user.
    Account {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Team management.
    #[command(subcommand)]
    Team(TeamCommand),
    /// Project management.
    #[command(subcommand)]
    Project(ProjectCommand),
}

#[derive(Subcommand)]
pub enum TeamCommand {
    /// Create a team managed by you.
    Create { name: String },
    /// List your teams.
    List,
    /// Join a team with its 6-digit code.
    Join { code: String },
    /// Leave a team.
    Leave { team_id: i64 },
    /// List the members of a team.
    Members { team_id: i64 },
    /// Add a member (manager only).
    AddMember { team_id: i64, username: String },
    /// Remove a member (manager only).
    RemoveMember { team_id: i64, username: String },
    /// Generate a new join code (manager only).
    NewCode { team_id: i64 },
    /// Make another member the manager (manager only).
    PassManager { team_id: i64, username: String },
    /// Delete a team and its projects (manager only).
    Delete { team_id: i64 },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a project supervised by you.
    Create {
        team_id: i64,
        title: String,
        /// Username of the assignee.
        #[arg(long)]
        assignee: String,
        /// Deadline as YYYY-MM-DD.
        #[arg(long)]
        deadline: NaiveDate,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the projects of a team.
    List {
        team_id: i64,
        /// Status: to-do | in-progress | turned-in | finished.
        #[arg(long, value_parser = parse_status)]
        status: Option<ProjectStatus>,
        /// Only projects assigned to you.
        #[arg(long)]
        assigned: bool,
        /// Only projects you supervise.
        #[arg(long)]
        supervised: bool,
        /// Turn-in time: all | overdue | due-this-week | due-this-month | later.
        #[arg(long, value_parser = parse_turn_in_time, default_value = "all")]
        due: TurnInTime,
    },
    /// Show one project.
    Show { project_id: i64 },
    /// Edit a project (supervisor only). Omitted fields keep their value.
    Edit {
        project_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        supervisor: Option<String>,
        #[arg(long)]
        deadline: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change the status of a project.
    Status {
        project_id: i64,
        #[arg(value_parser = parse_status)]
        status: ProjectStatus,
    },
    /// Show which status changes you may make.
    Actions { project_id: i64 },
}

fn parse_status(value: &str) -> Result<ProjectStatus, String> {
    ProjectStatus::from_str(value).ok_or_else(|| format!("unknown status: {}", value))
}

fn parse_turn_in_time(value: &str) -> Result<TurnInTime, String> {
    TurnInTime::from_str(value).ok_or_else(|| format!("unknown turn-in time: {}", value))
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<(), String> {
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => settings::default_data_dir()?,
    };
    let mut app_settings = settings::load_settings(&data_dir)?;

    // Keep the guard alive until the command finishes so buffered lines get flushed
    let _log_guard = match logging::init(
        &settings::log_dir(&data_dir, &app_settings),
        app_settings.log_level.as_deref(),
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    let db = open_database(&settings::database_path(&data_dir, &app_settings))
        .map_err(|e| format!("Could not open the database: {}", e))?;
    let state = AppState::new(db);
    restore_session(&state, &data_dir, &mut app_settings);

    let out = Output { json: cli.json };
    let result = dispatch(&state, cli.command, &out, &data_dir, &mut app_settings);
    if let Err(message) = &result {
        error!("Command failed: {}", message);
    }
    result
}

fn restore_session(state: &AppState, data_dir: &Path, app_settings: &mut AppSettings) {
    let Some(user_id) = app_settings.signed_in_user_id else {
        return;
    };
    if let Err(e) = UserManager::new(state).restore_session(user_id) {
        warn!("Dropping remembered session: {}", e);
        app_settings.signed_in_user_id = None;
        if let Err(e) = settings::save_settings(data_dir, app_settings) {
            warn!("{}", e);
        }
    }
}

fn remember_user(data_dir: &Path, app_settings: &mut AppSettings, user_id: Option<i64>) -> Result<(), String> {
    app_settings.signed_in_user_id = user_id;
    settings::save_settings(data_dir, app_settings)
}

fn dispatch(
    state: &AppState,
    command: Command,
    out: &Output,
    data_dir: &Path,
    app_settings: &mut AppSettings,
) -> Result<(), String> {
    match command {
        Command::Signup { username, password } => {
            let user = users::sign_up(state, &username, &password)?;
            out.user(&user, "Account created:");
        }
        Command::Signin { username, password } => {
            let user = users::sign_in(state, &username, &password)?;
            remember_user(data_dir, app_settings, Some(user.id))?;
            out.user(&user, "Signed in as");
        }
        Command::Signout => {
            let user = users::sign_out(state)?;
            remember_user(data_dir, app_settings, None)?;
            out.user(&user, "Signed out");
        }
        Command::Whoami => {
            let user = users::current_user(state)?;
            out.user(&user, "Signed in as");
        }
        Command::Whois { username } => {
            let user = users::find_user(state, &username)?;
            out.user(&user, "User");
        }
        Command::Account { username, password } => {
            let user = users::update_account(state, username.as_deref(), password.as_deref())?;
            out.user(&user, "Account updated:");
        }
        Command::Team(command) => team_command(state, command, out)?,
        Command::Project(command) => project_command(state, command, out)?,
    }
    Ok(())
}

fn team_command(state: &AppState, command: TeamCommand, out: &Output) -> Result<(), String> {
    match command {
        TeamCommand::Create { name } => {
            let team = teams::create_team(state, &name)?;
            out.team(&team);
        }
        TeamCommand::List => {
            let list = teams::my_teams(state)?;
            if out.json {
                out.print_json(&list);
            } else if list.is_empty() {
                println!("You are not a member of any team.");
            } else {
                list.iter().for_each(|team| out.team(team));
            }
        }
        TeamCommand::Join { code } => {
            let team = teams::join_team(state, &code)?;
            out.team(&team);
        }
        TeamCommand::Leave { team_id } => {
            teams::leave_team(state, team_id)?;
            out.message(&format!("Left team {}", team_id));
        }
        TeamCommand::Members { team_id } => {
            let team = teams::team(state, team_id)?;
            let members = teams::team_members(state, team_id)?;
            if out.json {
                out.print_json(&members);
            } else {
                for member in &members {
                    let marker = if team.is_manager(member.id) { " (manager)" } else { "" };
                    println!("{:>4}  {}{}", member.id, member.username, marker);
                }
            }
        }
        TeamCommand::AddMember { team_id, username } => {
            let user = teams::add_member(state, team_id, &username)?;
            out.user(&user, "Added");
        }
        TeamCommand::RemoveMember { team_id, username } => {
            let user = teams::remove_member(state, team_id, &username)?;
            out.user(&user, "Removed");
        }
        TeamCommand::NewCode { team_id } => {
            let code = teams::regenerate_code(state, team_id)?;
            out.message(&format!("New join code: {}", code));
        }
        TeamCommand::PassManager { team_id, username } => {
            let team = teams::pass_manager_position(state, team_id, &username)?;
            out.team(&team);
        }
        TeamCommand::Delete { team_id } => {
            teams::delete_team(state, team_id)?;
            out.message(&format!("Deleted team {}", team_id));
        }
    }
    Ok(())
}

fn project_command(state: &AppState, command: ProjectCommand, out: &Output) -> Result<(), String> {
    match command {
        ProjectCommand::Create { team_id, title, assignee, deadline, description } => {
            let project = projects::create_project(
                state,
                NewProject { title, team_id, assignee, deadline, description },
            )?;
            out.project(&project);
        }
        ProjectCommand::List { team_id, status, assigned, supervised, due } => {
            let filter = ProjectFilter {
                status,
                assigned_to_me: assigned,
                supervised_by_me: supervised,
                turn_in_time: due,
            };
            let list = projects::list_projects(state, team_id, &filter, Local::now().date_naive())?;
            if out.json {
                out.print_json(&list);
            } else if list.is_empty() {
                println!("No projects match.");
            } else {
                list.iter().for_each(|project| out.project(project));
            }
        }
        ProjectCommand::Show { project_id } => {
            let details = project_details::project_details(state, project_id)?;
            if out.json {
                out.print_json(&details);
            } else {
                let name = |user: &Option<User>| {
                    user.as_ref().map(|u| u.username.clone()).unwrap_or_else(|| "?".to_string())
                };
                let project = &details.project;
                println!("{} (#{})", project.title, project.id);
                println!("  status:     {}", project.status.label());
                println!("  deadline:   {}", project.deadline);
                println!("  supervisor: {}", name(&details.supervisor));
                println!("  assignee:   {}", name(&details.assignee));
                if let Some(description) = &project.description {
                    println!("  {}", description);
                }
                if details.editable {
                    println!("  (you can edit this project)");
                }
            }
        }
        ProjectCommand::Edit { project_id, title, assignee, supervisor, deadline, description } => {
            let details = project_details::project_details(state, project_id)?;
            let current = details.project;
            let username = |user: Option<User>| user.map(|u| u.username).unwrap_or_default();

            let update = ProjectUpdate {
                title: title.unwrap_or(current.title),
                assignee: assignee.unwrap_or_else(|| username(details.assignee)),
                supervisor: supervisor.unwrap_or_else(|| username(details.supervisor)),
                deadline: deadline.unwrap_or(current.deadline),
                description: description.or(current.description),
            };
            let project = project_details::save_project(state, project_id, update)?;
            out.message("The project was updated successfully!");
            out.project(&project);
        }
        ProjectCommand::Status { project_id, status } => {
            let change = project_details::set_project_status(state, project_id, status)?;
            if out.json {
                out.print_json(&change);
            } else {
                println!("Project {}: {} -> {}", change.project_id, change.from, change.to);
            }
        }
        ProjectCommand::Actions { project_id } => {
            let buttons = project_details::status_buttons(state, project_id)?;
            if out.json {
                out.print_json(&buttons);
            } else {
                println!("Current status: {}", buttons.selected);
                let enabled: Vec<&str> = [
                    (buttons.to_do, ProjectStatus::ToDo),
                    (buttons.in_progress, ProjectStatus::InProgress),
                    (buttons.turned_in, ProjectStatus::TurnedIn),
                    (buttons.finished, ProjectStatus::Finished),
                ]
                .iter()
                .filter(|(on, _)| *on)
                .map(|(_, status)| status.as_str())
                .collect();
                if enabled.is_empty() {
                    println!("You cannot change the status of this project.");
                } else {
                    println!("You can set it to: {}", enabled.join(", "));
                }
            }
        }
    }
    Ok(())
}

/// Prints command results as text or JSON
struct Output {
    json: bool,
}

impl Output {
    fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    fn message(&self, text: &str) {
        if self.json {
            self.print_json(&serde_json::json!({ "message": text }));
        } else {
            println!("{}", text);
        }
    }

    fn user(&self, user: &User, prefix: &str) {
        if self.json {
            self.print_json(user);
        } else {
            println!("{} {} (#{})", prefix, user.username, user.id);
        }
    }

    fn team(&self, team: &Team) {
        if self.json {
            self.print_json(team);
        } else {
            println!("{:>4}  {}  code {}", team.id, team.name, team.code);
        }
    }

    fn project(&self, project: &Project) {
        if self.json {
            self.print_json(project);
        } else {
            println!(
                "{:>4}  {:<24} {:<12} due {}",
                project.id,
                project.title,
                project.status.as_str(),
                project.deadline
            );
        }
    }
}
