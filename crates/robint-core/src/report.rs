//! Reporting: read-only projections of the store for export and review.
//!
//! Reports are plain serialisable structures; rendering (JSON files, CSV,
//! terminal tables) belongs to the consumer.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  point::DataPoint,
  source::Source,
  status::ChangeLogEntry,
  store::{ChangeLogFilter, DataPointQuery, IntelStore, StoreStatistics},
  taxonomy::{Company, Dimension, Sector, Technology},
  Error, Result,
};

// ─── Report types ────────────────────────────────────────────────────────────

/// One data point flattened for export. `value` is the untagged JSON
/// representation; `source` is the resolved source name.
#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
  pub subject:           String,
  pub value:             serde_json::Value,
  pub year:              i32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quarter:           Option<u8>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub month:             Option<u8>,
  pub source:            Option<String>,
  pub confidence:        String,
  pub validation_status: String,
  pub updated_at:        DateTime<Utc>,
}

/// Data points grouped by dimension name, latest-first within each group.
pub type DimensionGroups = BTreeMap<String, Vec<ExportEntry>>;

#[derive(Debug, Clone, Serialize)]
pub struct SectorReport {
  pub sector:       Sector,
  pub generated_at: DateTime<Utc>,
  pub data:         DimensionGroups,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
  pub generated_at: DateTime<Utc>,
  pub statistics:   StoreStatistics,
  pub pending:      usize,
  pub in_review:    usize,
}

/// Everything: taxonomy, sources, grouped data points, and the recent slice
/// of the audit ledger.
#[derive(Debug, Clone, Serialize)]
pub struct FullExport {
  pub generated_at: DateTime<Utc>,
  pub sectors:      Vec<Sector>,
  pub dimensions:   Vec<Dimension>,
  pub companies:    Vec<Company>,
  pub technologies: Vec<Technology>,
  pub sources:      Vec<Source>,
  pub data:         DimensionGroups,
  pub changes:      Vec<ChangeLogEntry>,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Assembles reports from an [`IntelStore`]. Read-only.
pub struct ReportBuilder<'a, S> {
  store: &'a S,
}

impl<'a, S: IntelStore> ReportBuilder<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  async fn source_names(&self) -> Result<HashMap<Uuid, String>> {
    Ok(
      self
        .store
        .sources()
        .await?
        .into_iter()
        .map(|s| (s.source_id, s.name))
        .collect(),
    )
  }

  fn group(
    points: Vec<DataPoint>,
    sources: &HashMap<Uuid, String>,
  ) -> DimensionGroups {
    let mut groups: DimensionGroups = BTreeMap::new();
    for point in points {
      let entry = ExportEntry {
        subject:           point.subject.label(),
        value:             point.value.to_json(),
        year:              point.period.year(),
        quarter:           point.period.quarter(),
        month:             point.period.month(),
        source:            point
          .source_id
          .and_then(|id| sources.get(&id).cloned()),
        confidence:        point.confidence.as_str().to_string(),
        validation_status: point.status.as_str().to_string(),
        updated_at:        point.updated_at,
      };
      groups.entry(point.dimension).or_default().push(entry);
    }
    groups
  }

  /// All data points matching `query`, grouped by dimension. The store's
  /// latest-first ordering is preserved within each group.
  pub async fn dimension_groups(
    &self,
    query: &DataPointQuery,
  ) -> Result<DimensionGroups> {
    let sources = self.source_names().await?;
    let points = self.store.data_points(query).await?;
    Ok(Self::group(points, &sources))
  }

  /// Everything known about one sector, its subcategories included.
  pub async fn sector_report(&self, name: &str) -> Result<SectorReport> {
    let sector = self
      .store
      .sector(name)
      .await?
      .ok_or_else(|| Error::UnknownSector(name.to_string()))?;

    let query = DataPointQuery {
      sector: Some(sector.name.clone()),
      ..Default::default()
    };
    let data = self.dimension_groups(&query).await?;

    Ok(SectorReport { sector, generated_at: Utc::now(), data })
  }

  /// Pipeline health: row counts, status breakdown, queue depths.
  pub async fn validation_summary(&self) -> Result<ValidationSummary> {
    let statistics = self.store.statistics().await?;
    let pending = statistics
      .by_status
      .get("pending")
      .copied()
      .unwrap_or(0) as usize;
    let in_review = statistics
      .by_status
      .get("in_review")
      .copied()
      .unwrap_or(0) as usize;

    Ok(ValidationSummary {
      generated_at: Utc::now(),
      statistics,
      pending,
      in_review,
    })
  }

  /// A complete dump of the store, audit ledger capped at `change_limit`.
  pub async fn full_export(
    &self,
    change_limit: Option<usize>,
  ) -> Result<FullExport> {
    let sources = self.store.sources().await?;
    let names: HashMap<Uuid, String> = sources
      .iter()
      .map(|s| (s.source_id, s.name.clone()))
      .collect();

    let points = self
      .store
      .data_points(&DataPointQuery::default())
      .await?;
    let changes = self
      .store
      .changes(&ChangeLogFilter { limit: change_limit, ..Default::default() })
      .await?;

    Ok(FullExport {
      generated_at: Utc::now(),
      sectors: self.store.sectors().await?,
      dimensions: self.store.dimensions().await?,
      companies: self.store.companies().await?,
      technologies: self.store.technologies().await?,
      sources,
      data: Self::group(points, &names),
      changes,
    })
  }
}
