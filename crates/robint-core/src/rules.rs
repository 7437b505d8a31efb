//! The validation engine: stateless rule evaluation against a single data
//! point.
//!
//! The engine never touches storage and never mutates anything. Every rule
//! runs even after the first failure, so callers always see the complete
//! defect list. Numeric bounds come from an injectable per-dimension table;
//! a dimension absent from the table is exempt from the bounds rule.

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  point::{Confidence, DataPoint, Value},
  taxonomy::Dimension,
};

/// The earliest year any data point may claim.
pub const MIN_YEAR: i32 = 1990;

/// Default advisory recency window, in years.
pub const DEFAULT_RECENCY_YEARS: i32 = 5;

// ─── Bounds ──────────────────────────────────────────────────────────────────

/// Inclusive numeric bounds for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
  pub min: f64,
  pub max: f64,
}

impl Bounds {
  pub fn new(min: f64, max: f64) -> Self { Self { min, max } }

  pub fn contains(&self, v: f64) -> bool { self.min <= v && v <= self.max }
}

/// Per-dimension numeric bounds, keyed by dimension name. Domain
/// configuration, not algorithm: callers may supply their own table.
#[derive(Debug, Clone, Default)]
pub struct BoundsTable {
  by_dimension: HashMap<String, Bounds>,
}

impl BoundsTable {
  pub fn empty() -> Self { Self::default() }

  /// The built-in table: a generous industry ceiling for market size and a
  /// wide but finite band for growth rates.
  pub fn builtin() -> Self {
    let mut table = Self::default();
    table.set("market_size", Bounds::new(0.0, 1000.0));
    table.set("market_growth_rate", Bounds::new(-100.0, 1000.0));
    table.set("adoption_rate", Bounds::new(0.0, 100.0));
    table
  }

  pub fn set(&mut self, dimension: impl Into<String>, bounds: Bounds) {
    self.by_dimension.insert(dimension.into(), bounds);
  }

  pub fn get(&self, dimension: &str) -> Option<Bounds> {
    self.by_dimension.get(dimension).copied()
  }
}

// ─── Rule outcomes ───────────────────────────────────────────────────────────

/// One failed rule, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
  pub rule:   &'static str,
  pub reason: String,
}

/// The result of running a single rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome {
  pub rule:   &'static str,
  pub passed: bool,
  /// Advisory outcomes never fail the verdict; they are staleness signals.
  pub advisory: bool,
  pub reason: String,
}

/// Aggregated result of running every rule against a data point.
#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
  pub outcomes: Vec<RuleOutcome>,
}

impl EngineReport {
  /// True when no non-advisory rule failed.
  pub fn passed(&self) -> bool {
    self.outcomes.iter().all(|o| o.passed || o.advisory)
  }

  pub fn failures(&self) -> Vec<RuleFailure> {
    self
      .outcomes
      .iter()
      .filter(|o| !o.passed && !o.advisory)
      .map(|o| RuleFailure { rule: o.rule, reason: o.reason.clone() })
      .collect()
  }

  /// Advisory flags that did not hold (currently only the recency signal).
  pub fn advisories(&self) -> Vec<&RuleOutcome> {
    self
      .outcomes
      .iter()
      .filter(|o| !o.passed && o.advisory)
      .collect()
  }

  /// Whether the recency advisory fired: the point is outdated-eligible.
  pub fn stale_eligible(&self) -> bool {
    self
      .outcomes
      .iter()
      .any(|o| o.rule == "recent_year" && !o.passed)
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Pure rule evaluation. Construct once, reuse freely.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
  bounds:        BoundsTable,
  recency_years: i32,
}

impl Default for ValidationEngine {
  fn default() -> Self { Self::new(BoundsTable::builtin()) }
}

impl ValidationEngine {
  pub fn new(bounds: BoundsTable) -> Self {
    Self { bounds, recency_years: DEFAULT_RECENCY_YEARS }
  }

  pub fn with_recency_years(mut self, years: i32) -> Self {
    self.recency_years = years;
    self
  }

  /// Evaluate every rule against `point`, relative to the current year.
  pub fn evaluate(
    &self,
    point: &DataPoint,
    dimension: &Dimension,
  ) -> EngineReport {
    self.evaluate_at(point, dimension, Utc::now().year())
  }

  /// Evaluate with an explicit "current year" — the seam the tests use.
  pub fn evaluate_at(
    &self,
    point: &DataPoint,
    dimension: &Dimension,
    current_year: i32,
  ) -> EngineReport {
    let outcomes = vec![
      self.has_source(point),
      self.has_year(point, current_year),
      self.value_present(point),
      self.within_bounds(point, dimension),
      self.recent_year(point, current_year),
      self.confidence(point),
    ];
    EngineReport { outcomes }
  }

  /// Rule 1: a source reference is required unless the point is explicitly
  /// unverified.
  fn has_source(&self, point: &DataPoint) -> RuleOutcome {
    let passed =
      point.source_id.is_some() || point.confidence == Confidence::Unverified;
    RuleOutcome {
      rule:     "has_source",
      passed,
      advisory: false,
      reason:   if passed {
        "source reference present or point is marked unverified".into()
      } else {
        format!(
          "no source reference and confidence is {}",
          point.confidence
        )
      },
    }
  }

  /// Rule 2: the year must fall within `[1990, current_year + 1]`.
  fn has_year(&self, point: &DataPoint, current_year: i32) -> RuleOutcome {
    let year = point.period.year();
    let passed = (MIN_YEAR..=current_year + 1).contains(&year);
    RuleOutcome {
      rule:     "has_year",
      passed,
      advisory: false,
      reason:   if passed {
        format!("year {year} is plausible")
      } else {
        format!(
          "year {year} outside [{MIN_YEAR}, {}]",
          current_year + 1
        )
      },
    }
  }

  /// Rule 3: the value must actually carry information; numeric values must
  /// be finite.
  fn value_present(&self, point: &DataPoint) -> RuleOutcome {
    let (passed, reason) = match &point.value {
      Value::Number(n) if n.is_finite() => (true, "finite number".into()),
      Value::Number(n) => (false, format!("non-finite number: {n}")),
      Value::Text(s) if !s.trim().is_empty() => (true, "non-empty text".into()),
      Value::Text(_) => (false, "empty text value".into()),
      Value::Structured(v) if !v.is_null() => (true, "structured value".into()),
      Value::Structured(_) => (false, "null structured value".into()),
    };
    RuleOutcome { rule: "value_present", passed, advisory: false, reason }
  }

  /// Rule 4: per-dimension numeric bounds. Dimensions without a table entry
  /// are exempt; non-numeric values are out of the rule's jurisdiction.
  fn within_bounds(
    &self,
    point: &DataPoint,
    dimension: &Dimension,
  ) -> RuleOutcome {
    let (passed, reason) = match (
      self.bounds.get(&dimension.name),
      point.value.as_number(),
    ) {
      (None, _) => (true, "no bounds configured for dimension".into()),
      (Some(_), None) => (true, "non-numeric value, bounds not applicable".into()),
      // Non-finite numbers are value_present's defect, not a bounds one.
      (Some(_), Some(v)) if !v.is_finite() => {
        (true, "non-finite value, bounds not applicable".into())
      }
      (Some(b), Some(v)) if b.contains(v) => {
        (true, format!("{v} within [{}, {}]", b.min, b.max))
      }
      (Some(b), Some(v)) => {
        (false, format!("{v} outside [{}, {}]", b.min, b.max))
      }
    };
    RuleOutcome { rule: "within_bounds", passed, advisory: false, reason }
  }

  /// Rule 5 (advisory): data older than the recency window is flagged as
  /// outdated-eligible but never rejected.
  fn recent_year(&self, point: &DataPoint, current_year: i32) -> RuleOutcome {
    let year = point.period.year();
    let passed = year >= current_year - self.recency_years;
    RuleOutcome {
      rule:     "recent_year",
      passed,
      advisory: true,
      reason:   if passed {
        format!("year {year} within the last {} years", self.recency_years)
      } else {
        format!(
          "year {year} older than {} years, eligible for staleness sweep",
          self.recency_years
        )
      },
    }
  }

  /// Rule 6: confidence is a closed enumeration; validity is enforced by the
  /// type system and free text is rejected at the serde boundary. Recorded
  /// here so reports list the full rule set.
  fn confidence(&self, point: &DataPoint) -> RuleOutcome {
    RuleOutcome {
      rule:     "confidence",
      passed:   true,
      advisory: false,
      reason:   format!("{} (closed enumeration)", point.confidence),
    }
  }
}
