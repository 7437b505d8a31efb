//! Subcommand definitions and dispatch.

use std::path::PathBuf;

use anyhow::{bail, Context as _};
use chrono::{Datelike, Utc};
use clap::{Subcommand, ValueEnum};
use robint_core::{
  detect::{ChangeDetector, Thresholds},
  ingest::{Finding, Ingestor},
  period::Period,
  point::DataPoint,
  report::ReportBuilder,
  rules::ValidationEngine,
  store::{DataPointQuery, IntelStore},
  workflow::{AutoOutcome, ValidationWorkflow},
};
use robint_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{export, AppConfig};

// ─── Command tree ────────────────────────────────────────────────────────────

#[derive(Subcommand)]
pub enum Command {
  /// Create the database and seed the reference taxonomy.
  Init,
  /// Print configuration and store statistics.
  Check,
  /// Batch-ingest research findings from a JSON file.
  Ingest {
    /// Path to a JSON array of findings.
    file: PathBuf,
  },
  /// Drive the validation workflow.
  Review {
    #[command(subcommand)]
    action: ReviewAction,
  },
  /// Period-over-period change detection.
  Changes {
    #[command(subcommand)]
    window: ChangeWindow,
  },
  /// Write reports to the export directory.
  Export {
    #[command(subcommand)]
    target: ExportTarget,
    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
  },
}

#[derive(Subcommand)]
pub enum ReviewAction {
  /// Show the pending and in-review queues, oldest first.
  List,
  /// Take a pending data point into review.
  Claim {
    id:      Uuid,
    #[arg(long, default_value = "analyst")]
    analyst: String,
  },
  /// Validate an in-review data point.
  Validate {
    id:      Uuid,
    #[arg(long, default_value = "analyst")]
    analyst: String,
  },
  /// Reject an in-review data point; a reason is mandatory.
  Reject {
    id:      Uuid,
    #[arg(long)]
    reason:  String,
    #[arg(long, default_value = "analyst")]
    analyst: String,
  },
  /// Retire validated data older than the staleness window.
  Sweep {
    #[arg(long, default_value = "analyst")]
    analyst: String,
  },
  /// Claim and validate high-confidence pending points; the rest stay
  /// pending for manual review.
  Auto {
    #[arg(long, default_value = "analyst")]
    analyst: String,
  },
}

#[derive(Subcommand)]
pub enum ChangeWindow {
  /// Month-over-month movement into the given month (default: current).
  Month {
    #[arg(long)]
    year:  Option<i32>,
    #[arg(long)]
    month: Option<u8>,
  },
  /// Year-over-year movement for the given year (default: current).
  Year {
    #[arg(long)]
    year: Option<i32>,
  },
}

#[derive(Subcommand)]
pub enum ExportTarget {
  /// Everything: taxonomy, sources, data points, recent audit entries.
  Full,
  /// One sector and its subcategories.
  Sector { name: String },
  /// One dimension across all subjects.
  Dimension {
    name: String,
    #[arg(long)]
    year: Option<i32>,
  },
  /// Pipeline health: status breakdown and queue depths.
  Validation,
  /// All data points grouped by dimension.
  List,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
  Json,
  Csv,
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

pub async fn run(
  command: Command,
  store: &SqliteStore,
  config: &AppConfig,
) -> anyhow::Result<()> {
  match command {
    Command::Init => init(store).await,
    Command::Check => check(store, config).await,
    Command::Ingest { file } => ingest(store, &file).await,
    Command::Review { action } => review(store, config, action).await,
    Command::Changes { window } => changes(store, config, window).await,
    Command::Export { target, format } => {
      export_cmd(store, config, target, format).await
    }
  }
}

fn engine(config: &AppConfig) -> ValidationEngine {
  ValidationEngine::default().with_recency_years(config.staleness_years)
}

async fn init(store: &SqliteStore) -> anyhow::Result<()> {
  let summary = store.seed_defaults().await?;
  println!(
    "seeded {} sectors, {} subcategories, {} dimensions, {} technologies",
    summary.sectors,
    summary.subcategories,
    summary.dimensions,
    summary.technologies
  );
  Ok(())
}

async fn check(store: &SqliteStore, config: &AppConfig) -> anyhow::Result<()> {
  println!("database: {}", config.database_path);
  println!("export dir: {}", config.export_dir);
  println!("staleness window: {} years", config.staleness_years);
  println!("significance threshold: {}%", config.significance_pct);

  let summary = ReportBuilder::new(store).validation_summary().await?;
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

async fn ingest(store: &SqliteStore, file: &PathBuf) -> anyhow::Result<()> {
  let raw = std::fs::read_to_string(file)
    .with_context(|| format!("reading {}", file.display()))?;
  let findings: Vec<Finding> =
    serde_json::from_str(&raw).context("parsing findings")?;
  let total = findings.len();

  let report = Ingestor::new(store).ingest_batch(findings).await?;
  println!("ingested {} of {total} findings", report.created.len());
  for (index, error) in &report.failed {
    eprintln!("  finding #{index}: {error}");
  }
  Ok(())
}

fn print_queue(title: &str, points: &[DataPoint]) {
  println!("{title} ({}):", points.len());
  for p in points {
    println!(
      "  {}  {}  {}  {}  [{}]",
      p.point_id,
      p.dimension,
      p.subject.label(),
      p.period,
      p.confidence
    );
  }
}

async fn review(
  store: &SqliteStore,
  config: &AppConfig,
  action: ReviewAction,
) -> anyhow::Result<()> {
  let wf = ValidationWorkflow::with_engine(store, engine(config));
  match action {
    ReviewAction::List => {
      print_queue("pending", &wf.pending_queue().await?);
      print_queue("in review", &wf.review_queue().await?);
    }
    ReviewAction::Claim { id, analyst } => {
      wf.claim_for_review(id, &analyst).await?;
      println!("{id} claimed for review by {analyst}");
    }
    ReviewAction::Validate { id, analyst } => {
      wf.validate_item(id, &analyst).await?;
      println!("{id} validated by {analyst}");
    }
    ReviewAction::Reject { id, reason, analyst } => {
      wf.reject_item(id, &analyst, &reason).await?;
      println!("{id} rejected by {analyst}: {reason}");
    }
    ReviewAction::Sweep { analyst } => {
      let report = wf.sweep_stale(&analyst).await?;
      println!(
        "examined {} validated points, retired {}",
        report.examined,
        report.outdated.len()
      );
      for id in &report.outdated {
        println!("  {id} -> outdated");
      }
    }
    ReviewAction::Auto { analyst } => {
      let report = wf.auto_validate(&analyst).await?;
      println!(
        "validated {}, held back {}",
        report.validated(),
        report.failed()
      );
      for (id, outcome) in &report.outcomes {
        if let AutoOutcome::Failed(failures) = outcome {
          println!("  {id} held in review:");
          for f in failures {
            println!("    {}: {}", f.rule, f.reason);
          }
        }
      }
    }
  }
  Ok(())
}

async fn changes(
  store: &SqliteStore,
  config: &AppConfig,
  window: ChangeWindow,
) -> anyhow::Result<()> {
  let detector = ChangeDetector::with_thresholds(
    store,
    Thresholds::with_default(config.significance_pct),
  );
  let now = Utc::now();

  let records = match window {
    ChangeWindow::Month { year, month } => {
      let year = year.unwrap_or_else(|| now.year());
      let month = month.unwrap_or(now.month() as u8);
      detector.month_over_month(year, month).await?
    }
    ChangeWindow::Year { year } => {
      let year = year.unwrap_or_else(|| now.year());
      detector.year_over_year(Period::annual(year)).await?
    }
  };

  println!("{}", serde_json::to_string_pretty(&records)?);
  Ok(())
}

async fn export_cmd(
  store: &SqliteStore,
  config: &AppConfig,
  target: ExportTarget,
  format: Format,
) -> anyhow::Result<()> {
  let builder = ReportBuilder::new(store);

  let path = match (target, format) {
    (ExportTarget::Full, Format::Json) => {
      let report = builder.full_export(Some(500)).await?;
      export::write_json(&config.export_dir, "full", &report)?
    }
    (ExportTarget::Validation, Format::Json) => {
      let report = builder.validation_summary().await?;
      export::write_json(&config.export_dir, "validation", &report)?
    }
    (ExportTarget::Full | ExportTarget::Validation, Format::Csv) => {
      bail!("this report is only available as JSON")
    }
    (ExportTarget::Sector { name }, format) => {
      let report = builder.sector_report(&name).await?;
      let stem = format!("sector_{}", slug(&name));
      match format {
        Format::Json => export::write_json(&config.export_dir, &stem, &report)?,
        Format::Csv => {
          export::write_groups_csv(&config.export_dir, &stem, &report.data)?
        }
      }
    }
    (ExportTarget::Dimension { name, year }, format) => {
      let query = DataPointQuery {
        dimension: Some(name.clone()),
        year,
        ..Default::default()
      };
      let groups = builder.dimension_groups(&query).await?;
      let stem = format!("dimension_{}", slug(&name));
      match format {
        Format::Json => export::write_json(&config.export_dir, &stem, &groups)?,
        Format::Csv => {
          export::write_groups_csv(&config.export_dir, &stem, &groups)?
        }
      }
    }
    (ExportTarget::List, format) => {
      let groups = builder.dimension_groups(&DataPointQuery::default()).await?;
      match format {
        Format::Json => {
          export::write_json(&config.export_dir, "data_points", &groups)?
        }
        Format::Csv => {
          export::write_groups_csv(&config.export_dir, "data_points", &groups)?
        }
      }
    }
  };

  println!("wrote {}", path.display());
  Ok(())
}

fn slug(name: &str) -> String {
  name
    .to_lowercase()
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
    .collect()
}
