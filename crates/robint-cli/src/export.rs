//! File writers for the export directory.
//!
//! Filenames carry a UTC timestamp so repeated exports never clobber each
//! other.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use robint_core::report::DimensionGroups;
use serde::Serialize;

fn export_path(dir: &str, stem: &str, extension: &str) -> anyhow::Result<PathBuf> {
  std::fs::create_dir_all(dir)
    .with_context(|| format!("creating export dir {dir}"))?;
  let stamp = Utc::now().format("%Y%m%d_%H%M%S");
  Ok(Path::new(dir).join(format!("{stem}_{stamp}.{extension}")))
}

/// Serialise `value` as pretty JSON into the export directory.
pub fn write_json<T: Serialize>(
  dir: &str,
  stem: &str,
  value: &T,
) -> anyhow::Result<PathBuf> {
  let path = export_path(dir, stem, "json")?;
  let json = serde_json::to_string_pretty(value)?;
  std::fs::write(&path, json)
    .with_context(|| format!("writing {}", path.display()))?;
  Ok(path)
}

/// Flatten dimension-grouped data points into one CSV table.
pub fn write_groups_csv(
  dir: &str,
  stem: &str,
  groups: &DimensionGroups,
) -> anyhow::Result<PathBuf> {
  let path = export_path(dir, stem, "csv")?;
  let mut writer = csv::Writer::from_path(&path)
    .with_context(|| format!("writing {}", path.display()))?;

  writer.write_record([
    "dimension",
    "subject",
    "value",
    "year",
    "quarter",
    "month",
    "source",
    "confidence",
    "validation_status",
    "updated_at",
  ])?;

  for (dimension, entries) in groups {
    for entry in entries {
      writer.write_record([
        dimension.clone(),
        entry.subject.clone(),
        entry.value.to_string(),
        entry.year.to_string(),
        entry.quarter.map(|q| q.to_string()).unwrap_or_default(),
        entry.month.map(|m| m.to_string()).unwrap_or_default(),
        entry.source.clone().unwrap_or_default(),
        entry.confidence.clone(),
        entry.validation_status.clone(),
        entry.updated_at.to_rfc3339(),
      ])?;
    }
  }

  writer.flush()?;
  Ok(path)
}
