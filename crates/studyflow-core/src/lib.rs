//! # Studyflow Core Library
//!
//! This library provides the core business logic for Studyflow's daily study
//! plan generation. It implements a CLI-first philosophy where all operations
//! are available via a standalone CLI binary, with any web or desktop surface
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Planner**: A pure, deterministic allocation pipeline that merges the
//!   carry-over and upcoming backlog pools, time-boxes tasks into a tolerance
//!   band around the daily budget, and falls back to synthetic blocks when
//!   the backlog runs dry
//! - **Generator**: The transactional persistence gate guaranteeing at most
//!   one plan per (user, day), with conflict recovery for concurrent callers
//! - **Storage**: SQLite-based plan/backlog storage and TOML-based
//!   configuration
//! - **Clock**: Day-boundary math in the product's fixed planning timezone
//!
//! ## Key Components
//!
//! - [`generate_daily_plan`]: The sole public generation entry point
//! - [`PlanDb`]: Plan, task, and backlog persistence
//! - [`Config`]: Application configuration management
//! - [`GeneratedPlanView`]: Normalized camelCase payload for presentation

pub mod backlog;
pub mod clock;
pub mod error;
pub mod generator;
pub mod plan;
pub mod planner;
pub mod storage;
pub mod views;

pub use backlog::{BacklogCandidate, BacklogTask, CandidateStatus};
pub use error::{ConfigError, CoreError, DatabaseError, GenerationError, ValidationError};
pub use generator::{generate_daily_plan, GeneratedPlan, GenerationRequest};
pub use plan::{DailyPlan, DailyTask, PlanStatus, TaskStatus};
pub use planner::{PlannedBlock, TargetRange, MAX_BLOCK_MINUTES, MIN_BLOCK_MINUTES};
pub use storage::{Config, PlanDb};
pub use views::{GeneratedPlanView, PlanView, TaskView};
