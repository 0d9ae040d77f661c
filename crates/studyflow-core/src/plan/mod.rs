//! Daily plan and schedule line-item types.
//!
//! A [`DailyPlan`] is the single schedule for one (user, calendar day) pair;
//! its [`DailyTask`] rows are the time-boxed blocks, owned exclusively by the
//! plan and destroyed with it. Generation creates both in `draft`/`pending`
//! state; `actual_minutes` and later status transitions belong to the
//! task-execution flows, not to this crate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a daily plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Freshly generated, not yet started
    Draft,
    /// At least one task started
    Active,
    /// All tasks finished
    Completed,
}

impl Default for PlanStatus {
    fn default() -> Self {
        PlanStatus::Draft
    }
}

/// Lifecycle status of a schedule line item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not yet worked on
    Pending,
    /// Finished
    Done,
    /// Explicitly skipped by the user
    Skipped,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// One persisted daily study plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlan {
    /// Unique identifier
    pub id: String,
    /// Owning workspace
    pub tenant_id: String,
    /// Owning user
    pub user_id: String,
    /// Long-term plan this day was generated for, if any
    pub plan_id: Option<String>,
    /// Calendar date, evaluated in the fixed planning timezone
    pub plan_date: NaiveDate,
    /// Requested (clamped) budget for the day in minutes
    pub target_minutes: u32,
    /// Minutes actually completed; 0 at generation time
    pub actual_minutes: u32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
}

/// One time-boxed block inside a daily plan.
///
/// There is no foreign key back to the backlog task that inspired the block;
/// the topic string is the only link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTask {
    /// Unique identifier
    pub id: String,
    /// Owning plan
    pub daily_plan_id: String,
    /// Display topic, copied from the backlog title or a synthetic label
    pub topic: String,
    /// Time-boxed allocation decided at generation time
    pub estimated_minutes: u32,
    /// Minutes actually spent; 0 at generation time
    pub actual_minutes: u32,
    pub status: TaskStatus,
    /// 1-based position in the schedule, dense within a plan
    pub order_num: u32,
    pub created_at: DateTime<Utc>,
}
