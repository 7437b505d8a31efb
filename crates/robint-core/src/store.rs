//! The `IntelStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `robint-store-sqlite`).
//! Higher layers (workflow, change detector, reporting, CLI) depend on this
//! abstraction, not on any concrete backend, so tests can supply isolated,
//! disposable instances per test case.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  period::Period,
  point::{Confidence, DataPoint, DataPointPatch, NewDataPoint},
  source::{NewSource, Source},
  status::{ChangeLogEntry, ValidationStatus},
  subject::Subject,
  taxonomy::{
    Company, Dimension, NewCompany, NewDimension, NewTechnology, Sector,
    Technology,
  },
  Result,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Filters for [`IntelStore::data_points`]. All filters are conjunctive.
///
/// Results come back latest-first: `year DESC, quarter DESC, month DESC`,
/// then insertion order — annual rows sort after finer-grained rows within
/// the same year. Set `oldest_first` for FIFO review queues, which order by
/// insertion time instead.
#[derive(Debug, Clone, Default)]
pub struct DataPointQuery {
  pub dimension:    Option<String>,
  pub subject:      Option<Subject>,
  /// Matches sector subjects and subcategories within the sector.
  pub sector:       Option<String>,
  pub year:         Option<i32>,
  /// Exact period match (year, quarter, month all equal).
  pub period:       Option<Period>,
  pub status:       Option<ValidationStatus>,
  pub confidence:   Option<Confidence>,
  pub limit:        Option<usize>,
  pub oldest_first: bool,
}

impl DataPointQuery {
  pub fn by_status(status: ValidationStatus) -> Self {
    Self { status: Some(status), ..Self::default() }
  }

  pub fn by_key(dimension: &str, subject: &Subject, period: Period) -> Self {
    Self {
      dimension: Some(dimension.to_string()),
      subject: Some(subject.clone()),
      period: Some(period),
      ..Self::default()
    }
  }
}

/// Filters for [`IntelStore::changes`], the audit ledger reads.
#[derive(Debug, Clone, Default)]
pub struct ChangeLogFilter {
  pub data_point_id: Option<Uuid>,
  pub since:         Option<DateTime<Utc>>,
  pub limit:         Option<usize>,
}

// ─── Summaries ───────────────────────────────────────────────────────────────

/// How many reference rows a [`IntelStore::seed_defaults`] call created.
/// All zeroes on a re-run: seeding is idempotent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
  pub sectors:       usize,
  pub subcategories: usize,
  pub dimensions:    usize,
  pub technologies:  usize,
}

/// Row counts and breakdowns used by the `check` command and the validation
/// report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStatistics {
  pub sectors:       i64,
  pub subcategories: i64,
  pub dimensions:    i64,
  pub companies:     i64,
  pub technologies:  i64,
  pub sources:       i64,
  pub data_points:   i64,
  pub changes:       i64,
  pub by_status:     std::collections::BTreeMap<String, i64>,
  pub by_sector:     std::collections::BTreeMap<String, i64>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an intelligence store backend.
///
/// The store is the sole gateway to persisted state. It enforces referential
/// integrity (unknown dimension/subject/source), the value-kind contract, and
/// writes one audit-ledger row per mutation — all inside a single
/// transaction per call. Status legality is the workflow's job; the store's
/// status write is a dumb audited update.
///
/// All methods return `Send` futures so the trait works on multi-threaded
/// runtimes.
pub trait IntelStore: Send + Sync {
  // ── Seeding & reference data ──────────────────────────────────────────

  /// Idempotently insert the built-in taxonomy. Re-runs are no-ops.
  fn seed_defaults(
    &self,
  ) -> impl Future<Output = Result<SeedSummary>> + Send + '_;

  fn sectors(&self) -> impl Future<Output = Result<Vec<Sector>>> + Send + '_;

  fn sector<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Sector>>> + Send + 'a;

  fn dimensions(
    &self,
  ) -> impl Future<Output = Result<Vec<Dimension>>> + Send + '_;

  fn dimension<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Dimension>>> + Send + 'a;

  /// Register a new metric. Fails if the name is taken.
  fn add_dimension(
    &self,
    input: NewDimension,
  ) -> impl Future<Output = Result<Dimension>> + Send + '_;

  fn companies(
    &self,
  ) -> impl Future<Output = Result<Vec<Company>>> + Send + '_;

  fn add_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<Company>> + Send + '_;

  fn technologies(
    &self,
  ) -> impl Future<Output = Result<Vec<Technology>>> + Send + '_;

  fn add_technology(
    &self,
    input: NewTechnology,
  ) -> impl Future<Output = Result<Technology>> + Send + '_;

  // ── Sources ───────────────────────────────────────────────────────────

  fn add_source(
    &self,
    input: NewSource,
  ) -> impl Future<Output = Result<Source>> + Send + '_;

  /// Reuse an existing source when the URL is already known; otherwise
  /// create one.
  fn get_or_create_source(
    &self,
    input: NewSource,
  ) -> impl Future<Output = Result<Source>> + Send + '_;

  fn source(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Source>>> + Send + '_;

  fn sources(&self) -> impl Future<Output = Result<Vec<Source>>> + Send + '_;

  // ── Data points ───────────────────────────────────────────────────────

  /// Insert a candidate point in `pending` status. Verifies that the
  /// dimension, subject, and source exist and that the value kind matches
  /// the dimension's declared kind; writes an `insert` audit row.
  fn create_data_point(
    &self,
    input: NewDataPoint,
  ) -> impl Future<Output = Result<DataPoint>> + Send + '_;

  /// Apply a partial correction; writes one `update` audit row with
  /// before/after snapshots and bumps `updated_at`.
  fn update_data_point<'a>(
    &'a self,
    id: Uuid,
    patch: DataPointPatch,
    actor: &'a str,
    reason: &'a str,
  ) -> impl Future<Output = Result<DataPoint>> + Send + 'a;

  /// Write a status change plus its `status_change` audit row. When the
  /// target status is `validated`, records the actor and timestamp on the
  /// point itself.
  fn set_status<'a>(
    &'a self,
    id: Uuid,
    to: ValidationStatus,
    actor: &'a str,
    reason: Option<String>,
  ) -> impl Future<Output = Result<DataPoint>> + Send + 'a;

  fn data_point(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DataPoint>>> + Send + '_;

  fn data_points<'a>(
    &'a self,
    query: &'a DataPointQuery,
  ) -> impl Future<Output = Result<Vec<DataPoint>>> + Send + 'a;

  // ── Audit & statistics ────────────────────────────────────────────────

  fn changes<'a>(
    &'a self,
    filter: &'a ChangeLogFilter,
  ) -> impl Future<Output = Result<Vec<ChangeLogEntry>>> + Send + 'a;

  fn statistics(
    &self,
  ) -> impl Future<Output = Result<StoreStatistics>> + Send + '_;
}
