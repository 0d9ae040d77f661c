//! Backlog task model consumed by the allocation pipeline.
//!
//! The backlog store is owned by the upstream learning-plan subsystem; this
//! engine only reads it. Upstream exports are loose about status spelling
//! (snake_case, camelCase and uppercase all occur in the wild), so status
//! strings are normalized exactly once at the read boundary and the rest of
//! the pipeline consumes the canonical [`CandidateStatus`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a backlog task still eligible for scheduling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// Not yet started
    Pending,
    /// Started but unfinished
    InProgress,
}

impl CandidateStatus {
    /// Normalize a storage status string.
    ///
    /// Accepts `pending`/`in_progress` plus the camelCase, kebab-case and
    /// uppercase spellings found in upstream exports. Returns `None` for
    /// statuses outside the schedulable set (done, cancelled, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Some(CandidateStatus::Pending),
            "in_progress" | "inprogress" => Some(CandidateStatus::InProgress),
            _ => None,
        }
    }

    /// Canonical storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::InProgress => "in_progress",
        }
    }
}

/// A backlog task in the canonical shape consumed by the planner.
///
/// This is a read-only projection: generation copies the title into the
/// schedule and never mutates the underlying task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogCandidate {
    /// Unique identifier
    pub id: String,
    /// Display title, copied verbatim into the schedule line
    pub title: String,
    /// Free-form task type from the long-term plan (reading, exercise, ...)
    pub task_type: Option<String>,
    /// Authored duration estimate in minutes
    pub estimated_minutes: Option<u32>,
    /// Due instant in UTC; `None` means undated
    pub due_date: Option<DateTime<Utc>>,
    /// Normalized status
    pub status: CandidateStatus,
    /// Creation instant, used as the ordering tiebreaker
    pub created_at: DateTime<Utc>,
}

/// A full backlog row, including ownership columns.
///
/// Used by the CLI to author tasks into the local store; the generation
/// pipeline itself only ever sees [`BacklogCandidate`] projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogTask {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    /// Owning long-term plan, if any
    pub plan_id: Option<String>,
    pub title: String,
    pub task_type: Option<String>,
    pub estimated_minutes: Option<u32>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_statuses() {
        assert_eq!(CandidateStatus::parse("pending"), Some(CandidateStatus::Pending));
        assert_eq!(
            CandidateStatus::parse("in_progress"),
            Some(CandidateStatus::InProgress)
        );
    }

    #[test]
    fn normalizes_loose_spellings() {
        assert_eq!(CandidateStatus::parse("PENDING"), Some(CandidateStatus::Pending));
        assert_eq!(
            CandidateStatus::parse("inProgress"),
            Some(CandidateStatus::InProgress)
        );
        assert_eq!(
            CandidateStatus::parse("IN_PROGRESS"),
            Some(CandidateStatus::InProgress)
        );
        assert_eq!(
            CandidateStatus::parse(" in-progress "),
            Some(CandidateStatus::InProgress)
        );
    }

    #[test]
    fn rejects_non_schedulable_statuses() {
        assert_eq!(CandidateStatus::parse("done"), None);
        assert_eq!(CandidateStatus::parse("cancelled"), None);
        assert_eq!(CandidateStatus::parse(""), None);
    }
}
