//! `robint` — robotics industry market-intelligence tracker.
//!
//! Reads `robint.toml` (or the path specified with `--config`, or
//! `ROBINT_`-prefixed environment variables), opens the SQLite store, and
//! dispatches to one of the subcommands: seeding, ingestion, the review
//! workflow, change detection, and exports.

mod commands;
mod export;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use robint_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::Command;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
  name = "robint",
  about = "Robotics industry market-intelligence tracker"
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "robint.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Application settings, merged from file and `ROBINT_` environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_database_path")]
  pub database_path:    String,
  #[serde(default = "default_export_dir")]
  pub export_dir:       String,
  /// Validated data older than this many years is swept to `outdated`.
  #[serde(default = "default_staleness_years")]
  pub staleness_years:  i32,
  /// Absolute-percent threshold above which a change is significant.
  #[serde(default = "default_significance_pct")]
  pub significance_pct: f64,
}

fn default_database_path() -> String { "data/robotics.db".into() }
fn default_export_dir() -> String { "data/exports".into() }
fn default_staleness_years() -> i32 { 5 }
fn default_significance_pct() -> f64 { 10.0 }

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ROBINT"))
    .build()
    .context("failed to read configuration")?;
  let app_config: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  if let Some(parent) = std::path::Path::new(&app_config.database_path).parent()
  {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;
    }
  }

  let store = SqliteStore::open(&app_config.database_path)
    .await
    .with_context(|| format!("opening store at {}", app_config.database_path))?;

  commands::run(cli.command, &store, &app_config).await
}
