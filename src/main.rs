use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tinypaste::config::Config;
use tinypaste::{commands, App};

#[derive(Debug, Parser)]
#[command(version, about = "A small paste storage service")]
struct Cli {
    /// Path to the config file. Defaults to config.toml in the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve pastes over HTTP.
    Serve,
    /// Delete every expired paste and exit.
    PurgeExpired,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(Config::default_path)
        .context("could not determine the config file location")?;
    let config = Config::load(&config_path)?;

    let app = App::new(config).await.context("failed to set up the app")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve::run(app).await,
        Command::PurgeExpired => commands::purge_expired::run(app).await,
    }
}
