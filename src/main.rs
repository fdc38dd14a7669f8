// src/main.rs
use anyhow::Result;
use clap::{Parser, Subcommand};

mod board;
mod config;
mod points;
mod scripts;
mod table;
mod trello;

use config::LabelLookup;
use table::OutputFormat;

#[derive(Parser)]
#[command(name = "sprint-points")]
#[command(about = "Sprint Points - story point totals per label from a Trello board")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sum story points per label for one sprint (prompts if no sprint is given)
    Report {
        /// Text that sprint list names contain, e.g. "3" or "Sprint 3"
        sprint: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Override how label names are looked up
        #[arg(long, value_enum)]
        label_lookup: Option<LabelLookup>,
    },
    /// Write a configuration file with Trello credentials
    Init {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        api_token: Option<String>,
        #[arg(long)]
        board_id: Option<String>,
        /// Write the global config instead of ./sprint-points.json
        #[arg(long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration and check Trello connectivity
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        None => {
            scripts::report::run(None, OutputFormat::Table, None).await?;
        }
        Some(Commands::Report { sprint, format, label_lookup }) => {
            scripts::report::run(sprint, format, label_lookup).await?;
        }
        Some(Commands::Init { api_key, api_token, board_id, global, force }) => {
            scripts::init::run(api_key, api_token, board_id, global, force)?;
        }
        Some(Commands::Status) => {
            scripts::status::run().await?;
        }
    }

    Ok(())
}
