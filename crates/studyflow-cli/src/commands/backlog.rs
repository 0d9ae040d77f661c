//! Backlog task management commands for CLI.
//!
//! In production the backlog is written by the learning-plan service; these
//! commands exist for local use and for seeding test data.

use chrono::Utc;
use clap::Subcommand;
use studyflow_core::backlog::{BacklogTask, CandidateStatus};
use studyflow_core::clock;
use studyflow_core::storage::{Config, PlanDb};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum BacklogAction {
    /// Add a backlog task
    Add {
        /// Task title
        title: String,
        /// Tenant id (falls back to defaults.tenant_id in config)
        #[arg(long)]
        tenant: Option<String>,
        /// User id (falls back to defaults.user_id in config)
        #[arg(long)]
        user: Option<String>,
        /// Owning long-term plan id
        #[arg(long)]
        plan: Option<String>,
        /// Task type (reading, practice, ...)
        #[arg(long)]
        task_type: Option<String>,
        /// Estimated minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Due date as YYYY-MM-DD in the planning timezone
        #[arg(long)]
        due: Option<String>,
        /// Status: pending or in_progress
        #[arg(long, default_value = "pending")]
        status: String,
    },
    /// List backlog tasks
    List {
        #[arg(long)]
        tenant: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Remove a backlog task
    Remove {
        /// Task ID
        id: String,
    },
}

fn resolve(arg: Option<String>, fallback: &Option<String>, flag: &str) -> Result<String, String> {
    arg.or_else(|| fallback.clone())
        .ok_or_else(|| format!("missing --{flag} (set defaults.{flag}_id in config to omit it)"))
}

pub fn run(action: BacklogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = PlanDb::open()?;

    match action {
        BacklogAction::Add {
            title,
            tenant,
            user,
            plan,
            task_type,
            minutes,
            due,
            status,
        } => {
            let status = CandidateStatus::parse(&status)
                .ok_or_else(|| format!("unknown status '{status}' (pending or in_progress)"))?;
            let due_date = match due {
                Some(input) => {
                    let date = clock::parse_plan_date(&input)?;
                    Some(clock::day_window(date).start)
                }
                None => None,
            };
            let task = BacklogTask {
                id: Uuid::new_v4().to_string(),
                tenant_id: resolve(tenant, &config.defaults.tenant_id, "tenant")?,
                user_id: resolve(user, &config.defaults.user_id, "user")?,
                plan_id: plan,
                title,
                task_type,
                estimated_minutes: minutes,
                due_date,
                status,
                created_at: Utc::now(),
            };
            db.insert_backlog_task(&task)?;
            println!("Backlog task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        BacklogAction::List { tenant, user } => {
            let tenant_id = resolve(tenant, &config.defaults.tenant_id, "tenant")?;
            let user_id = resolve(user, &config.defaults.user_id, "user")?;
            let tasks = db.list_backlog_tasks(&tenant_id, &user_id)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        BacklogAction::Remove { id } => {
            db.delete_backlog_task(&id)?;
            println!("Backlog task removed: {id}");
        }
    }

    Ok(())
}
