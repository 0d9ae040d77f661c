//! Transactional daily plan generation.
//!
//! The gate guarantees at most one plan per (user, day): an existence check
//! and the insert run inside one `BEGIN IMMEDIATE` transaction, backed by a
//! unique index on (user_id, plan_date). A caller that loses the insert race
//! gets the winner's plan back instead of an error. Everything downstream of
//! the insert (backlog fetch, allocation, task rows) commits atomically or
//! not at all.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{carry_over_window, day_window, parse_plan_date};
use crate::error::{CoreError, DatabaseError, GenerationError, Result, ValidationError};
use crate::plan::{DailyPlan, DailyTask, PlanStatus, TaskStatus};
use crate::planner::{self, merge_candidates};
use crate::storage::plan_db::PlanDb;

/// Parameters for one generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub tenant_id: String,
    pub user_id: String,
    /// Restrict the backlog to one long-term plan, if set
    pub plan_id: Option<String>,
    /// Calendar date as `YYYY-MM-DD` in the planning timezone
    pub date: String,
    /// Requested budget in minutes; missing or non-positive falls back to
    /// the minimum block size
    pub daily_minutes: Option<i64>,
}

/// A persisted plan together with its ordered schedule.
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub plan: DailyPlan,
    pub tasks: Vec<DailyTask>,
}

/// Generate (or retrieve) the daily plan for one (user, date) pair.
///
/// Idempotent: if a plan already exists for the day it is returned unchanged
/// with its tasks, even when `daily_minutes` differs from the stored target.
///
/// # Errors
/// Validation failures (blank identifiers, malformed date) surface before
/// any transaction opens. Any failure after that rolls the whole generation
/// back; no partial plan is ever persisted.
pub fn generate_daily_plan(db: &PlanDb, request: &GenerationRequest) -> Result<GeneratedPlan> {
    if request.tenant_id.trim().is_empty() {
        return Err(ValidationError::MissingIdentifier("tenant_id").into());
    }
    if request.user_id.trim().is_empty() {
        return Err(ValidationError::MissingIdentifier("user_id").into());
    }
    let date = parse_plan_date(&request.date)?;
    let budget = planner::clamp_daily_minutes(request.daily_minutes);

    db.begin_immediate()?;
    let result = (|| -> Result<GeneratedPlan> {
        if let Some(existing) = db.find_plan_for_day(&request.user_id, date)? {
            debug!(plan = %existing.id, %date, "daily plan already exists, returning as-is");
            let tasks = db.tasks_for_plan(&existing.id)?;
            return Ok(GeneratedPlan { plan: existing, tasks });
        }

        let now = Utc::now();
        let plan = DailyPlan {
            id: Uuid::new_v4().to_string(),
            tenant_id: request.tenant_id.clone(),
            user_id: request.user_id.clone(),
            plan_id: request.plan_id.clone(),
            plan_date: date,
            target_minutes: budget,
            actual_minutes: 0,
            status: PlanStatus::Draft,
            created_at: now,
        };
        db.insert_plan(&plan)?;

        let carry = carry_over_window(date);
        let day = day_window(date);
        let carry_over = db
            .fetch_carry_over(&request.tenant_id, &request.user_id, request.plan_id.as_deref(), carry)
            .map_err(GenerationError::BacklogQueryFailed)?;
        let upcoming = db
            .fetch_upcoming(&request.tenant_id, &request.user_id, request.plan_id.as_deref(), day.start)
            .map_err(GenerationError::BacklogQueryFailed)?;

        let candidates = merge_candidates(carry_over, upcoming);
        let (blocks, total) = planner::plan_day(&candidates, budget);
        debug!(
            candidates = candidates.len(),
            blocks = blocks.len(),
            total_minutes = total,
            "allocated daily schedule"
        );

        let tasks: Vec<DailyTask> = blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| DailyTask {
                id: Uuid::new_v4().to_string(),
                daily_plan_id: plan.id.clone(),
                topic: block.topic,
                estimated_minutes: block.minutes,
                actual_minutes: 0,
                status: TaskStatus::Pending,
                order_num: (index + 1) as u32,
                created_at: now,
            })
            .collect();
        db.insert_tasks(&tasks)?;

        Ok(GeneratedPlan { plan, tasks })
    })();

    match result {
        Ok(generated) => {
            db.commit()?;
            info!(
                plan = %generated.plan.id,
                user = %generated.plan.user_id,
                %date,
                tasks = generated.tasks.len(),
                "daily plan ready"
            );
            Ok(generated)
        }
        Err(CoreError::Database(DatabaseError::Conflict)) => {
            // Lost the (user, date) insert race: the winner's plan is the
            // plan. Re-read it outside the aborted transaction.
            db.rollback();
            warn!(user = %request.user_id, %date, "concurrent plan insert detected, reusing winner");
            let plan = db.find_plan_for_day(&request.user_id, date)?.ok_or_else(|| {
                GenerationError::Aborted("conflicting plan disappeared during recovery".to_string())
            })?;
            let tasks = db.tasks_for_plan(&plan.id)?;
            Ok(GeneratedPlan { plan, tasks })
        }
        Err(err) => {
            db.rollback();
            Err(err)
        }
    }
}
