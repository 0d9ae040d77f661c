//! SQLite-based storage for daily plans, schedule tasks, and the backlog.
//!
//! The backlog table is written by the upstream learning-plan subsystem (and
//! by the CLI for local use); plan generation only reads it. Daily plans and
//! their tasks are owned here.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use super::migrations;
use crate::backlog::{BacklogCandidate, BacklogTask, CandidateStatus};
use crate::clock::DayWindow;
use crate::error::DatabaseError;
use crate::plan::{DailyPlan, DailyTask, PlanStatus, TaskStatus};

/// Cap on the upcoming-pool query, bounding per-request query cost.
pub const UPCOMING_FETCH_LIMIT: u32 = 75;

// === Helper Functions ===

/// Parse plan status from database string
fn parse_plan_status(status_str: &str) -> PlanStatus {
    match status_str {
        "active" => PlanStatus::Active,
        "completed" => PlanStatus::Completed,
        _ => PlanStatus::Draft,
    }
}

/// Format plan status for database storage
fn format_plan_status(status: PlanStatus) -> &'static str {
    match status {
        PlanStatus::Draft => "draft",
        PlanStatus::Active => "active",
        PlanStatus::Completed => "completed",
    }
}

/// Parse task status from database string
fn parse_task_status(status_str: &str) -> TaskStatus {
    match status_str {
        "done" => TaskStatus::Done,
        "skipped" => TaskStatus::Skipped,
        _ => TaskStatus::Pending,
    }
}

/// Format task status for database storage
fn format_task_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Done => "done",
        TaskStatus::Skipped => "skipped",
    }
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse an optional RFC3339 column
fn parse_datetime_opt(dt_str: Option<String>) -> Option<DateTime<Utc>> {
    dt_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a stored `YYYY-MM-DD` plan date.
fn parse_plan_date_column(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap_or_default()
}

/// Build a BacklogCandidate from a backlog row. Statuses are normalized
/// here, at the read boundary; unknown statuses fall back to pending.
fn row_to_candidate(row: &rusqlite::Row) -> Result<BacklogCandidate, rusqlite::Error> {
    let status_str: String = row.get(5)?;
    let estimated: Option<i64> = row.get(3)?;
    Ok(BacklogCandidate {
        id: row.get(0)?,
        title: row.get(1)?,
        task_type: row.get(2)?,
        estimated_minutes: estimated.and_then(|m| u32::try_from(m).ok()),
        due_date: parse_datetime_opt(row.get(4)?),
        status: CandidateStatus::parse(&status_str).unwrap_or(CandidateStatus::Pending),
        created_at: parse_datetime_fallback(&row.get::<_, String>(6)?),
    })
}

/// Build a DailyPlan from a daily_plans row
fn row_to_plan(row: &rusqlite::Row) -> Result<DailyPlan, rusqlite::Error> {
    let status_str: String = row.get(7)?;
    Ok(DailyPlan {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        user_id: row.get(2)?,
        plan_id: row.get(3)?,
        plan_date: parse_plan_date_column(&row.get::<_, String>(4)?),
        target_minutes: row.get::<_, i64>(5)? as u32,
        actual_minutes: row.get::<_, i64>(6)? as u32,
        status: parse_plan_status(&status_str),
        created_at: parse_datetime_fallback(&row.get::<_, String>(8)?),
    })
}

/// Build a DailyTask from a daily_tasks row
fn row_to_task(row: &rusqlite::Row) -> Result<DailyTask, rusqlite::Error> {
    let status_str: String = row.get(5)?;
    Ok(DailyTask {
        id: row.get(0)?,
        daily_plan_id: row.get(1)?,
        topic: row.get(2)?,
        estimated_minutes: row.get::<_, i64>(3)? as u32,
        actual_minutes: row.get::<_, i64>(4)? as u32,
        status: parse_task_status(&status_str),
        order_num: row.get::<_, i64>(6)? as u32,
        created_at: parse_datetime_fallback(&row.get::<_, String>(7)?),
    })
}

const CANDIDATE_COLUMNS: &str =
    "id, title, task_type, estimated_minutes, due_date, status, created_at";

/// SQLite database for plan generation storage.
pub struct PlanDb {
    conn: Connection,
}

impl PlanDb {
    /// Open the plan database at `~/.config/studyflow/studyflow.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("studyflow.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the plan database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        // Base tables (v1 schema) first
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS backlog_tasks (
                id                TEXT PRIMARY KEY,
                tenant_id         TEXT NOT NULL,
                user_id           TEXT NOT NULL,
                plan_id           TEXT,
                title             TEXT NOT NULL,
                task_type         TEXT,
                estimated_minutes INTEGER,
                due_date          TEXT,
                status            TEXT NOT NULL DEFAULT 'pending',
                created_at        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_plans (
                id             TEXT PRIMARY KEY,
                tenant_id      TEXT NOT NULL,
                user_id        TEXT NOT NULL,
                plan_id        TEXT,
                plan_date      TEXT NOT NULL,
                target_minutes INTEGER NOT NULL,
                actual_minutes INTEGER NOT NULL DEFAULT 0,
                status         TEXT NOT NULL DEFAULT 'draft',
                created_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_tasks (
                id                TEXT PRIMARY KEY,
                daily_plan_id     TEXT NOT NULL REFERENCES daily_plans(id) ON DELETE CASCADE,
                topic             TEXT NOT NULL,
                estimated_minutes INTEGER NOT NULL,
                actual_minutes    INTEGER NOT NULL DEFAULT 0,
                status            TEXT NOT NULL DEFAULT 'pending',
                order_num         INTEGER NOT NULL,
                created_at        TEXT NOT NULL
            );",
        )?;

        // Incremental migrations (v1 -> v2, etc.)
        migrations::migrate(&self.conn)?;

        Ok(())
    }

    // === Transaction control ===

    /// Begin an immediate transaction, taking the write lock up front so the
    /// existence check and insert are serialized across connections.
    pub fn begin_immediate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE TRANSACTION;")
            .map_err(DatabaseError::from)
    }

    /// Commit the open transaction.
    pub fn commit(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch("COMMIT;")
            .map_err(DatabaseError::from)
    }

    /// Roll back the open transaction, ignoring errors (the transaction may
    /// already have been aborted by SQLite).
    pub fn rollback(&self) {
        let _ = self.conn.execute_batch("ROLLBACK;");
    }

    // === Backlog (read path + CLI authoring) ===

    /// Insert a backlog task.
    pub fn insert_backlog_task(&self, task: &BacklogTask) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO backlog_tasks (
                id, tenant_id, user_id, plan_id, title, task_type,
                estimated_minutes, due_date, status, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.id,
                task.tenant_id,
                task.user_id,
                task.plan_id,
                task.title,
                task.task_type,
                task.estimated_minutes.map(|m| m as i64),
                task.due_date.map(|dt| dt.to_rfc3339()),
                task.status.as_str(),
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List backlog tasks for one user, newest last.
    pub fn list_backlog_tasks(
        &self,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Vec<BacklogTask>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tenant_id, user_id, plan_id, title, task_type,
                    estimated_minutes, due_date, status, created_at
             FROM backlog_tasks
             WHERE tenant_id = ?1 AND user_id = ?2
             ORDER BY created_at ASC",
        )?;
        let tasks = stmt.query_map(params![tenant_id, user_id], |row| {
            let status_str: String = row.get(8)?;
            let estimated: Option<i64> = row.get(6)?;
            Ok(BacklogTask {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                user_id: row.get(2)?,
                plan_id: row.get(3)?,
                title: row.get(4)?,
                task_type: row.get(5)?,
                estimated_minutes: estimated.and_then(|m| u32::try_from(m).ok()),
                due_date: parse_datetime_opt(row.get(7)?),
                status: CandidateStatus::parse(&status_str).unwrap_or(CandidateStatus::Pending),
                created_at: parse_datetime_fallback(&row.get::<_, String>(9)?),
            })
        })?;
        Ok(tasks.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a backlog task.
    pub fn delete_backlog_task(&self, id: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM backlog_tasks WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Fetch the carry-over pool: unfinished tasks due inside `window`
    /// (the day before the target day), highest-status first, then by due
    /// date and creation order.
    pub fn fetch_carry_over(
        &self,
        tenant_id: &str,
        user_id: &str,
        plan_id: Option<&str>,
        window: DayWindow,
    ) -> Result<Vec<BacklogCandidate>, DatabaseError> {
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS}
             FROM backlog_tasks
             WHERE tenant_id = ?1 AND user_id = ?2
               AND status IN ('pending', 'in_progress')
               AND due_date >= ?3 AND due_date < ?4
               AND (?5 IS NULL OR plan_id = ?5)
             ORDER BY status DESC, due_date ASC, created_at ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                tenant_id,
                user_id,
                window.start.to_rfc3339(),
                window.end.to_rfc3339(),
                plan_id,
            ],
            |row| row_to_candidate(row),
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Fetch the upcoming pool: unfinished tasks due on/after `day_start` or
    /// with no due date, dated tasks first, capped at
    /// [`UPCOMING_FETCH_LIMIT`].
    pub fn fetch_upcoming(
        &self,
        tenant_id: &str,
        user_id: &str,
        plan_id: Option<&str>,
        day_start: DateTime<Utc>,
    ) -> Result<Vec<BacklogCandidate>, DatabaseError> {
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS}
             FROM backlog_tasks
             WHERE tenant_id = ?1 AND user_id = ?2
               AND status IN ('pending', 'in_progress')
               AND (due_date IS NULL OR due_date >= ?3)
               AND (?4 IS NULL OR plan_id = ?4)
             ORDER BY due_date IS NULL, due_date ASC, created_at ASC
             LIMIT ?5"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                tenant_id,
                user_id,
                day_start.to_rfc3339(),
                plan_id,
                UPCOMING_FETCH_LIMIT as i64,
            ],
            |row| row_to_candidate(row),
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // === Daily plans ===

    /// Insert a daily plan row.
    ///
    /// # Errors
    /// Returns [`DatabaseError::Conflict`] if a plan already exists for the
    /// same (user, date); callers recover by re-reading the winner.
    pub fn insert_plan(&self, plan: &DailyPlan) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO daily_plans (
                id, tenant_id, user_id, plan_id, plan_date,
                target_minutes, actual_minutes, status, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                plan.id,
                plan.tenant_id,
                plan.user_id,
                plan.plan_id,
                plan.plan_date.format("%Y-%m-%d").to_string(),
                plan.target_minutes as i64,
                plan.actual_minutes as i64,
                format_plan_status(plan.status),
                plan.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find the plan for one (user, date), if any.
    pub fn find_plan_for_day(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPlan>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tenant_id, user_id, plan_id, plan_date,
                    target_minutes, actual_minutes, status, created_at
             FROM daily_plans
             WHERE user_id = ?1 AND plan_date = ?2",
        )?;
        let plan = stmt
            .query_row(
                params![user_id, date.format("%Y-%m-%d").to_string()],
                |row| row_to_plan(row),
            )
            .optional()?;
        Ok(plan)
    }

    /// Bulk-insert schedule tasks for a plan.
    pub fn insert_tasks(&self, tasks: &[DailyTask]) -> Result<(), DatabaseError> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO daily_tasks (
                id, daily_plan_id, topic, estimated_minutes,
                actual_minutes, status, order_num, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for task in tasks {
            stmt.execute(params![
                task.id,
                task.daily_plan_id,
                task.topic,
                task.estimated_minutes as i64,
                task.actual_minutes as i64,
                format_task_status(task.status),
                task.order_num as i64,
                task.created_at.to_rfc3339(),
            ])?;
        }
        Ok(())
    }

    /// Load a plan's tasks in schedule order.
    pub fn tasks_for_plan(&self, plan_id: &str) -> Result<Vec<DailyTask>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, daily_plan_id, topic, estimated_minutes,
                    actual_minutes, status, order_num, created_at
             FROM daily_tasks
             WHERE daily_plan_id = ?1
             ORDER BY order_num ASC",
        )?;
        let tasks = stmt.query_map(params![plan_id], |row| row_to_task(row))?;
        Ok(tasks.collect::<Result<Vec<_>, _>>()?)
    }
}
