//! Fluoride Control - CLI access to the fluoridation dataset
//!
//! Runs the same selection and feedback logic as the daemon, locally.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fluoride_common::config::DOTENV_PATH;
use fluoride_common::Config;
use std::path::Path;
use tracing::warn;

#[derive(Parser)]
#[command(name = "fluoridectl")]
#[command(about = "Community water fluoridation data with AI summaries", long_about = None)]
#[command(version)]
struct Cli {
    /// Dataset path or URL (overrides config)
    #[arg(long, global = true)]
    data: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List years present in the dataset
    Years,

    /// List states present in the dataset
    States,

    /// Show every row for a state
    Table {
        /// Postal abbreviation, e.g. OH
        #[arg(long)]
        state: String,
    },

    /// Print the feedback prompt without calling the API
    Prompt {
        #[arg(long)]
        state: String,

        #[arg(long)]
        year: i32,
    },

    /// Full selection: map values, table and AI feedback
    Feedback {
        #[arg(long)]
        state: String,

        #[arg(long)]
        year: i32,

        /// Print the selection as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = Config::load_env_file(Path::new(DOTENV_PATH)) {
        warn!("{}", e);
    }

    let cli = Cli::parse();
    let data = cli.data.as_deref();

    match cli.command {
        Commands::Years => commands::years(data),
        Commands::States => commands::states(data),
        Commands::Table { state } => commands::table(data, &state),
        Commands::Prompt { state, year } => commands::prompt(data, &state, year),
        Commands::Feedback { state, year, json } => commands::feedback(data, &state, year, json),
    }
}
