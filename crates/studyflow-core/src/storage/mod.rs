mod config;
pub mod migrations;
pub mod plan_db;

pub use config::{Config, DefaultsConfig, GenerationConfig};
pub use plan_db::PlanDb;

use std::path::PathBuf;

/// Returns `~/.config/studyflow[-dev]/` based on STUDYFLOW_ENV.
///
/// Set STUDYFLOW_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studyflow-dev")
    } else {
        base_dir.join("studyflow")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
