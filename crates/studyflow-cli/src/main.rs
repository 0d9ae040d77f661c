use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studyflow", version, about = "Studyflow CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily plan generation and inspection
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Backlog task management
    Backlog {
        #[command(subcommand)]
        action: commands::backlog::BacklogAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan { action } => commands::plan::run(action),
        Commands::Backlog { action } => commands::backlog::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
