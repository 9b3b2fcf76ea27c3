//! moredice_cli - run one dice command against a database
//!
//! Useful for operators and scripting: a chat command is executed for the
//! given user id and the reply is printed to stdout. `reset` is only
//! available here, never from chat.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use moredice::commands::{Command, CommandRunner};
use moredice::config::Config;
use moredice::db::Database;
use moredice::service::Services;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// More-dice command line
#[derive(Parser, Debug)]
#[command(name = "moredice_cli", version, about = "Run a more-dice command")]
struct Args {
    /// SQLite database file (overrides db_path from the config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Chat user id the command runs as (required for chat commands)
    #[arg(short, long)]
    user: Option<i64>,

    /// Config file (default: moredice.toml)
    #[arg(short, long, env = "MOREDICE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    #[command(flatten)]
    Chat(Command),
    /// Drop and recreate all dice data
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moredice=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let db_path = match (&args.database, &config.db_path) {
        (Some(path), _) => path.to_string_lossy().into_owned(),
        (None, Some(path)) => path.clone(),
        (None, None) => bail!("no database given: pass --database or set db_path"),
    };

    let db = Database::new(Some(&db_path)).await?;

    match args.command {
        CliCommand::Reset => {
            warn!("Resetting all dice data in {}", db_path);
            db.reset().await.context("failed to reset database")?;
            println!("All dice data has been reset.");
        }
        CliCommand::Chat(command) => {
            let Some(user_id) = args.user else {
                bail!("chat commands need --user");
            };
            let services = Services::new(db.pool().clone(), &config)?;
            let runner = CommandRunner::new(services);
            println!("{}", runner.run(command, user_id).await);
        }
    }
    Ok(())
}
