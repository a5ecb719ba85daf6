use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
mod application;
mod domain;
mod infrastructure;
mod utils;
use crate::application::commands::{Command, run_command};
use crate::infrastructure::bootstrap::build_context;
use crate::infrastructure::config::AppConfig;
use tracing::error;

/// Plan events, recurring series and their communities
#[derive(Parser, Debug)]
#[command(name = "rally", version, about)]
struct Cli {
    /// SQLite file to use instead of DATABASE_PATH (":memory:" for a throwaway db)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.database {
        config.database_path = path;
    }
    utils::setup_logging(config.log_level);

    let ctx = build_context(config).await?;
    match run_command(&ctx, cli.command).await {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
