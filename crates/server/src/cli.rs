//! CLI argument parsing and subcommand dispatch.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use emogo_core::config::StoreBackend;
use emogo_core::{Config, RecordFilter};

use crate::export::{self, ExportFormat};
use crate::record_store::RecordStore;
use crate::{db, startup};

/// EmoGo backend: collects vlog, sentiment and GPS records and exports them.
#[derive(Parser, Debug)]
#[command(name = "emogo-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Dump records to a file or stdout without starting the server.
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Output path; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Only records with this mood.
        #[arg(long)]
        mood: Option<String>,
    },
    /// Delete every record without a vlog reference.
    Cleanup,
    /// Apply database migrations and exit.
    Migrate,
}

pub async fn dispatch(config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve => startup::serve(config).await,
        Command::Export { format, output, mood } => run_export(config, format, output, mood).await,
        Command::Cleanup => {
            let store = startup::open_record_store(config).await?;
            let deleted = store.delete_without_vlog().await?;
            info!(deleted, "Cleanup finished");
            Ok(())
        }
        Command::Migrate => {
            if config.store.backend == StoreBackend::Memory {
                anyhow::bail!("STORE_BACKEND=memory has no migrations to apply");
            }
            // connect() applies pending migrations before returning.
            db::connect(&config.store).await?;
            Ok(())
        }
    }
}

async fn run_export(
    config: &Config,
    format: ExportFormat,
    output: Option<PathBuf>,
    mood: Option<String>,
) -> anyhow::Result<()> {
    let store = startup::open_record_store(config).await?;
    let filter = match mood {
        Some(mood) => RecordFilter::all().with_mood(mood),
        None => RecordFilter::all(),
    };
    let listing = export::listing(store.as_ref(), &filter).await?;
    let body = export::render(format, &listing.records, Utc::now())?;

    match output {
        Some(path) => {
            std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
            info!(count = listing.records.len(), path = %path.display(), "Exported records");
        }
        None => print!("{body}"),
    }
    Ok(())
}
