mod api;
mod cli;
mod dashboard;
mod db;
mod export;
mod ingest;
mod record_store;
mod router;
mod startup;
mod state;

use clap::Parser;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before the subscriber so RUST_LOG can come from .env.
    emogo_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = emogo_core::Config::from_env();
    config.log_summary();

    cli::dispatch(&config, cli.command.unwrap_or(Command::Serve)).await
}
