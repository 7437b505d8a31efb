//! The change detector: read-only period-over-period comparison.
//!
//! For two adjacent periods it selects the latest validated data point per
//! (dimension, subject) key in each, computes deltas and percentage
//! movement, and classifies significance. Unvetted data never produces
//! trend signals: only validated points participate, with one documented
//! exception — when a key has no validated point in a period, its latest
//! `outdated` point stands in, so a trend line is not erased the moment a
//! record ages out.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::{
  period::Period,
  point::{DataPoint, Value},
  status::ValidationStatus,
  store::{DataPointQuery, IntelStore},
  subject::Subject,
  Result,
};

/// Default significance threshold, in absolute percent.
pub const DEFAULT_SIGNIFICANT_PCT: f64 = 10.0;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Per-dimension significance thresholds with a global default.
#[derive(Debug, Clone)]
pub struct Thresholds {
  default_pct:  f64,
  by_dimension: HashMap<String, f64>,
}

impl Default for Thresholds {
  fn default() -> Self {
    Self {
      default_pct:  DEFAULT_SIGNIFICANT_PCT,
      by_dimension: HashMap::new(),
    }
  }
}

impl Thresholds {
  pub fn with_default(pct: f64) -> Self {
    Self { default_pct: pct, by_dimension: HashMap::new() }
  }

  pub fn set(&mut self, dimension: impl Into<String>, pct: f64) {
    self.by_dimension.insert(dimension.into(), pct);
  }

  pub fn for_dimension(&self, dimension: &str) -> f64 {
    self
      .by_dimension
      .get(dimension)
      .copied()
      .unwrap_or(self.default_pct)
  }
}

// ─── Change records ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
  /// Present in both periods.
  Delta,
  /// Present only in the newer period.
  NewKey,
  /// Present only in the older period.
  RemovedKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
  Significant,
  Minor,
}

/// One (dimension, subject) key's movement between two periods.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
  pub dimension:     String,
  pub subject:       Subject,
  pub period_old:    Period,
  pub period_new:    Period,
  pub old_value:     Option<Value>,
  pub new_value:     Option<Value>,
  /// Absolute numeric delta; `None` for key events or non-numeric values.
  pub delta:         Option<f64>,
  /// `None` for key events, non-numeric values, or an old value of zero.
  pub percent_delta: Option<f64>,
  pub kind:          ChangeKind,
  pub significance:  Significance,
}

// ─── Pure computation ────────────────────────────────────────────────────────

/// Percentage movement from `old` to `new`. Zero is never a divisor: an old
/// value of exactly zero yields `None`.
pub fn percent_change(old: f64, new: f64) -> Option<f64> {
  if old == 0.0 {
    None
  } else {
    Some((new - old) / old.abs() * 100.0)
  }
}

/// The latest point per (dimension, subject) key. Ties break on confidence
/// rank, then on the most recent `updated_at`.
pub fn select_latest(
  points: Vec<DataPoint>,
) -> HashMap<(String, Subject), DataPoint> {
  let mut best: HashMap<(String, Subject), DataPoint> = HashMap::new();
  for point in points {
    let key = (point.dimension.clone(), point.subject.clone());
    match best.get(&key) {
      Some(held)
        if (held.confidence.rank(), held.updated_at)
          >= (point.confidence.rank(), point.updated_at) => {}
      _ => {
        best.insert(key, point);
      }
    }
  }
  best
}

fn classify(
  kind: ChangeKind,
  percent_delta: Option<f64>,
  threshold: f64,
) -> Significance {
  match kind {
    ChangeKind::NewKey | ChangeKind::RemovedKey => Significance::Significant,
    ChangeKind::Delta => match percent_delta {
      Some(pct) if pct.abs() > threshold => Significance::Significant,
      _ => Significance::Minor,
    },
  }
}

// ─── Detector ────────────────────────────────────────────────────────────────

/// Read-only analytics over an [`IntelStore`]. Never writes.
pub struct ChangeDetector<'a, S> {
  store:      &'a S,
  thresholds: Thresholds,
}

impl<'a, S: IntelStore> ChangeDetector<'a, S> {
  pub fn new(store: &'a S) -> Self {
    Self { store, thresholds: Thresholds::default() }
  }

  pub fn with_thresholds(store: &'a S, thresholds: Thresholds) -> Self {
    Self { store, thresholds }
  }

  /// Month-over-month movement into the given month.
  pub async fn month_over_month(
    &self,
    year: i32,
    month: u8,
  ) -> Result<Vec<ChangeRecord>> {
    let new = Period::monthly(year, month)?;
    let old = new.prev();
    self.compare(old, new).await
  }

  /// Year-over-year movement: the same calendar unit one year earlier.
  pub async fn year_over_year(
    &self,
    period: Period,
  ) -> Result<Vec<ChangeRecord>> {
    let old = match period {
      Period::Annual { year } => Period::Annual { year: year - 1 },
      Period::Quarterly { year, quarter } => {
        Period::Quarterly { year: year - 1, quarter }
      }
      Period::Monthly { year, month } => {
        Period::Monthly { year: year - 1, month }
      }
    };
    self.compare(old, period).await
  }

  /// Compare two periods and return change records ordered by descending
  /// absolute percentage movement, dimension name breaking ties.
  pub async fn compare(
    &self,
    period_old: Period,
    period_new: Period,
  ) -> Result<Vec<ChangeRecord>> {
    let old = self.period_snapshot(period_old).await?;
    let new = self.period_snapshot(period_new).await?;
    debug!(
      %period_old, %period_new,
      old_keys = old.len(),
      new_keys = new.len(),
      "comparing periods"
    );

    let mut records = Vec::new();

    for (key, new_point) in &new {
      let (dimension, subject) = key;
      let threshold = self.thresholds.for_dimension(dimension);

      let record = match old.get(key) {
        Some(old_point) => {
          let (delta, percent_delta) = match (
            old_point.value.as_number(),
            new_point.value.as_number(),
          ) {
            (Some(o), Some(n)) => (Some(n - o), percent_change(o, n)),
            _ => (None, None),
          };
          ChangeRecord {
            dimension: dimension.clone(),
            subject: subject.clone(),
            period_old,
            period_new,
            old_value: Some(old_point.value.clone()),
            new_value: Some(new_point.value.clone()),
            delta,
            percent_delta,
            kind: ChangeKind::Delta,
            significance: classify(ChangeKind::Delta, percent_delta, threshold),
          }
        }
        None => ChangeRecord {
          dimension: dimension.clone(),
          subject: subject.clone(),
          period_old,
          period_new,
          old_value: None,
          new_value: Some(new_point.value.clone()),
          delta: None,
          percent_delta: None,
          kind: ChangeKind::NewKey,
          significance: Significance::Significant,
        },
      };
      records.push(record);
    }

    for (key, old_point) in &old {
      if new.contains_key(key) {
        continue;
      }
      let (dimension, subject) = key;
      records.push(ChangeRecord {
        dimension:     dimension.clone(),
        subject:       subject.clone(),
        period_old,
        period_new,
        old_value:     Some(old_point.value.clone()),
        new_value:     None,
        delta:         None,
        percent_delta: None,
        kind:          ChangeKind::RemovedKey,
        significance:  Significance::Significant,
      });
    }

    records.sort_by(|a, b| {
      let pa = a.percent_delta.map(f64::abs).unwrap_or(f64::NEG_INFINITY);
      let pb = b.percent_delta.map(f64::abs).unwrap_or(f64::NEG_INFINITY);
      pb.partial_cmp(&pa)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.dimension.cmp(&b.dimension))
        .then_with(|| a.subject.cmp(&b.subject))
    });

    Ok(records)
  }

  /// The latest trusted point per key for one period.
  ///
  /// Validated points win outright. A key with no validated point in the
  /// period falls back to its latest `outdated` point, so a record that just
  /// aged out does not silently erase the trend line.
  async fn period_snapshot(
    &self,
    period: Period,
  ) -> Result<HashMap<(String, Subject), DataPoint>> {
    let mut query = DataPointQuery {
      period: Some(period),
      status: Some(ValidationStatus::Validated),
      ..Default::default()
    };
    let mut snapshot = select_latest(self.store.data_points(&query).await?);

    query.status = Some(ValidationStatus::Outdated);
    let retired = select_latest(self.store.data_points(&query).await?);
    for (key, point) in retired {
      snapshot.entry(key).or_insert(point);
    }

    Ok(snapshot)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::point::Confidence;

  fn point(
    dimension: &str,
    subject: Subject,
    confidence: Confidence,
    age_hours: i64,
  ) -> DataPoint {
    let at = Utc::now() - Duration::hours(age_hours);
    DataPoint {
      point_id: Uuid::new_v4(),
      dimension: dimension.into(),
      subject,
      value: Value::Number(1.0),
      period: Period::annual(2025),
      confidence,
      status: ValidationStatus::Validated,
      source_id: Some(Uuid::new_v4()),
      validated_by: None,
      validated_at: None,
      notes: None,
      created_at: at,
      updated_at: at,
    }
  }

  #[test]
  fn percent_change_basics() {
    assert!((percent_change(40.0, 45.2).unwrap() - 13.0).abs() < 1e-9);
    assert_eq!(percent_change(-10.0, -5.0), Some(50.0));
    assert_eq!(percent_change(0.0, 5.0), None, "zero old value never divides");
  }

  #[test]
  fn latest_selection_prefers_confidence_then_recency() {
    let subject = Subject::sector("Mobile Robotics");
    let low_recent = point("market_size", subject.clone(), Confidence::Low, 1);
    let high_old = point("market_size", subject.clone(), Confidence::High, 100);
    let winner = high_old.point_id;

    let best = select_latest(vec![low_recent, high_old]);
    assert_eq!(best.len(), 1);
    assert_eq!(
      best[&("market_size".to_string(), subject.clone())].point_id,
      winner
    );

    // Equal confidence: most recent update wins.
    let older = point("adoption_rate", subject.clone(), Confidence::Medium, 50);
    let newer = point("adoption_rate", subject.clone(), Confidence::Medium, 2);
    let winner = newer.point_id;
    let best = select_latest(vec![older, newer]);
    assert_eq!(
      best[&("adoption_rate".to_string(), subject)].point_id,
      winner
    );
  }

  #[test]
  fn key_events_are_always_significant() {
    assert_eq!(
      classify(ChangeKind::NewKey, None, 10.0),
      Significance::Significant
    );
    assert_eq!(
      classify(ChangeKind::RemovedKey, None, 10.0),
      Significance::Significant
    );
  }

  #[test]
  fn threshold_is_strict() {
    assert_eq!(
      classify(ChangeKind::Delta, Some(10.0), 10.0),
      Significance::Minor,
      "exactly at threshold is minor"
    );
    assert_eq!(
      classify(ChangeKind::Delta, Some(-10.1), 10.0),
      Significance::Significant
    );
    assert_eq!(
      classify(ChangeKind::Delta, None, 10.0),
      Significance::Minor,
      "undefined percent movement is never significant on its own"
    );
  }

  #[test]
  fn per_dimension_thresholds_override_default() {
    let mut thresholds = Thresholds::default();
    thresholds.set("market_size", 2.5);
    assert_eq!(thresholds.for_dimension("market_size"), 2.5);
    assert_eq!(
      thresholds.for_dimension("adoption_rate"),
      DEFAULT_SIGNIFICANT_PCT
    );
  }
}
