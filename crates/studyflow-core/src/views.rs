//! Normalized API-boundary views.
//!
//! Presentation layers consume camelCase field names regardless of storage
//! column naming; these views are the one place that mapping happens.

use serde::Serialize;

use crate::generator::GeneratedPlan;
use crate::plan::{DailyPlan, DailyTask, PlanStatus, TaskStatus};

/// Plan payload as exposed to presentation layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: String,
    pub date: String,
    pub target_minutes: u32,
    pub actual_minutes: u32,
    pub status: PlanStatus,
}

/// Schedule line item as exposed to presentation layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub topic: String,
    pub estimated_minutes: u32,
    pub actual_minutes: u32,
    pub status: TaskStatus,
    pub order_num: u32,
}

/// The full generation response payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlanView {
    pub plan: PlanView,
    pub tasks: Vec<TaskView>,
}

impl From<&DailyPlan> for PlanView {
    fn from(plan: &DailyPlan) -> Self {
        Self {
            id: plan.id.clone(),
            date: plan.plan_date.format("%Y-%m-%d").to_string(),
            target_minutes: plan.target_minutes,
            actual_minutes: plan.actual_minutes,
            status: plan.status,
        }
    }
}

impl From<&DailyTask> for TaskView {
    fn from(task: &DailyTask) -> Self {
        Self {
            id: task.id.clone(),
            topic: task.topic.clone(),
            estimated_minutes: task.estimated_minutes,
            actual_minutes: task.actual_minutes,
            status: task.status,
            order_num: task.order_num,
        }
    }
}

impl From<&GeneratedPlan> for GeneratedPlanView {
    fn from(generated: &GeneratedPlan) -> Self {
        Self {
            plan: PlanView::from(&generated.plan),
            tasks: generated.tasks.iter().map(TaskView::from).collect(),
        }
    }
}
