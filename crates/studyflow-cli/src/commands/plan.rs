//! Daily plan commands for CLI.

use clap::Subcommand;
use studyflow_core::clock;
use studyflow_core::generator::{generate_daily_plan, GenerationRequest};
use studyflow_core::storage::{Config, PlanDb};
use studyflow_core::views::{GeneratedPlanView, PlanView, TaskView};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Generate (or retrieve) the daily plan for a date
    Generate {
        /// Tenant id (falls back to defaults.tenant_id in config)
        #[arg(long)]
        tenant: Option<String>,
        /// User id (falls back to defaults.user_id in config)
        #[arg(long)]
        user: Option<String>,
        /// Restrict the backlog to one long-term plan
        #[arg(long)]
        plan: Option<String>,
        /// Target date as YYYY-MM-DD (default: today in the planning timezone)
        #[arg(long)]
        date: Option<String>,
        /// Daily budget in minutes (default: generation.default_daily_minutes)
        #[arg(long)]
        minutes: Option<i64>,
    },
    /// Show the persisted plan for a date
    Show {
        /// User id (falls back to defaults.user_id in config)
        #[arg(long)]
        user: Option<String>,
        /// Target date as YYYY-MM-DD (default: today in the planning timezone)
        #[arg(long)]
        date: Option<String>,
    },
}

fn resolve(arg: Option<String>, fallback: &Option<String>, flag: &str) -> Result<String, String> {
    arg.or_else(|| fallback.clone())
        .ok_or_else(|| format!("missing --{flag} (set defaults.{flag}_id in config to omit it)"))
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = PlanDb::open()?;

    match action {
        PlanAction::Generate {
            tenant,
            user,
            plan,
            date,
            minutes,
        } => {
            let request = GenerationRequest {
                tenant_id: resolve(tenant, &config.defaults.tenant_id, "tenant")?,
                user_id: resolve(user, &config.defaults.user_id, "user")?,
                plan_id: plan,
                date: date.unwrap_or_else(|| clock::today().format("%Y-%m-%d").to_string()),
                daily_minutes: minutes
                    .or(Some(config.generation.default_daily_minutes as i64)),
            };
            let generated = generate_daily_plan(&db, &request)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&GeneratedPlanView::from(&generated))?
            );
        }
        PlanAction::Show { user, date } => {
            let user_id = resolve(user, &config.defaults.user_id, "user")?;
            let date_str = date.unwrap_or_else(|| clock::today().format("%Y-%m-%d").to_string());
            let date = clock::parse_plan_date(&date_str)?;

            match db.find_plan_for_day(&user_id, date)? {
                Some(plan) => {
                    let tasks = db.tasks_for_plan(&plan.id)?;
                    let payload = serde_json::json!({
                        "plan": PlanView::from(&plan),
                        "tasks": tasks.iter().map(TaskView::from).collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                None => println!("No plan for {date_str}"),
            }
        }
    }

    Ok(())
}
