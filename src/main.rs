use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ingresso_finder::cli::{commands, Cli};
use ingresso_finder::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Before the logger so RUST_LOG from .env applies
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // The terminal belongs to the TUI, so logs go to a file (truncated on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&cli.log_file)
        .with_context(|| format!("Failed to open log file {:?}", cli.log_file))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Starting ingresso-finder {}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load()?;
    cli.apply(&mut config);

    commands::tui_command(config).await
}
