//! Configuration management commands for CLI.

use clap::Subcommand;
use studyflow_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value by dot-separated key
    Get {
        /// Key, e.g. generation.default_daily_minutes
        key: String,
    },
    /// Set a config value by dot-separated key
    Set {
        key: String,
        value: String,
    },
    /// Print the whole configuration
    List,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => println!("(unset)"),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
