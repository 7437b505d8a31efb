//! Data point types — the atomic fact of the intelligence store.
//!
//! A data point couples a typed value with a dimension, a subject, a
//! temporal anchor, and provenance. Points are created `pending` by the
//! ingestion boundary and only ever mutated through the audited store
//! operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  period::Period, status::ValidationStatus, subject::Subject, Result,
};

// ─── Value ───────────────────────────────────────────────────────────────────

/// The declared value kind of a dimension. Every data point's value must
/// match its dimension's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
  Numeric,
  Text,
  Structured,
}

impl ValueKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Numeric => "numeric",
      Self::Text => "text",
      Self::Structured => "structured",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "numeric" => Some(Self::Numeric),
      "text" => Some(Self::Text),
      "structured" => Some(Self::Structured),
      _ => None,
    }
  }
}

impl std::fmt::Display for ValueKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The typed payload of a data point. Exactly one representation exists per
/// point by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
  Number(f64),
  Text(String),
  Structured(serde_json::Value),
}

impl Value {
  pub fn kind(&self) -> ValueKind {
    match self {
      Self::Number(_) => ValueKind::Numeric,
      Self::Text(_) => ValueKind::Text,
      Self::Structured(_) => ValueKind::Structured,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      _ => None,
    }
  }

  /// Classify a loose JSON value the way the ingestion boundary receives
  /// them: numbers stay numeric, strings stay text, anything structured
  /// (object/array/bool) is kept as JSON.
  pub fn from_json(v: serde_json::Value) -> Self {
    match v {
      serde_json::Value::Number(ref n) => match n.as_f64() {
        Some(f) => Self::Number(f),
        None => Self::Structured(v),
      },
      serde_json::Value::String(s) => Self::Text(s),
      other => Self::Structured(other),
    }
  }

  /// The untagged JSON representation used by exports.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      Self::Number(n) => serde_json::json!(n),
      Self::Text(s) => serde_json::json!(s),
      Self::Structured(v) => v.clone(),
    }
  }
}

// ─── Confidence ──────────────────────────────────────────────────────────────

/// Analyst-assigned reliability tag.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
  /// Multiple corroborating sources.
  High,
  /// Single reliable source.
  #[default]
  Medium,
  /// Uncorroborated or older source.
  Low,
  /// No source verification at all.
  Unverified,
}

impl Confidence {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::High => "high",
      Self::Medium => "medium",
      Self::Low => "low",
      Self::Unverified => "unverified",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "high" => Some(Self::High),
      "medium" => Some(Self::Medium),
      "low" => Some(Self::Low),
      "unverified" => Some(Self::Unverified),
      _ => None,
    }
  }

  /// Ordering rank for tie-breaks; higher is more trusted.
  pub fn rank(&self) -> u8 {
    match self {
      Self::High => 3,
      Self::Medium => 2,
      Self::Low => 1,
      Self::Unverified => 0,
    }
  }
}

impl std::fmt::Display for Confidence {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── DataPoint ───────────────────────────────────────────────────────────────

/// The atomic fact. Never physically deleted; obsolescence is a status
/// transition so history survives for change detection and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
  pub point_id:     Uuid,
  pub dimension:    String,
  pub subject:      Subject,
  pub value:        Value,
  pub period:       Period,
  pub confidence:   Confidence,
  pub status:       ValidationStatus,
  /// Nullable only for manual/unverified points; the validation engine
  /// flags the absence otherwise.
  pub source_id:    Option<Uuid>,
  pub validated_by: Option<String>,
  pub validated_at: Option<DateTime<Utc>>,
  pub notes:        Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl DataPoint {
  /// The supersession key: two validated points may not share it.
  pub fn key(&self) -> (&str, &Subject, Period) {
    (&self.dimension, &self.subject, self.period)
  }

  /// Full JSON snapshot for the audit ledger.
  pub fn snapshot(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }
}

// ─── NewDataPoint ────────────────────────────────────────────────────────────

/// Input to [`crate::store::IntelStore::create_data_point`]. Identifier,
/// status (`pending`) and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDataPoint {
  pub dimension:  String,
  pub subject:    Subject,
  pub value:      Value,
  pub period:     Period,
  pub confidence: Confidence,
  pub source_id:  Option<Uuid>,
  pub notes:      Option<String>,
}

impl NewDataPoint {
  pub fn new(
    dimension: impl Into<String>,
    subject: Subject,
    value: Value,
    period: Period,
  ) -> Self {
    Self {
      dimension: dimension.into(),
      subject,
      value,
      period,
      confidence: Confidence::default(),
      source_id: None,
      notes: None,
    }
  }

  pub fn with_confidence(mut self, confidence: Confidence) -> Self {
    self.confidence = confidence;
    self
  }

  pub fn with_source(mut self, source_id: Uuid) -> Self {
    self.source_id = Some(source_id);
    self
  }

  pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
    self.notes = Some(notes.into());
    self
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial correction applied through
/// [`crate::store::IntelStore::update_data_point`]. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct DataPointPatch {
  pub value:      Option<Value>,
  pub period:     Option<Period>,
  pub confidence: Option<Confidence>,
  pub source_id:  Option<Uuid>,
  pub notes:      Option<String>,
}

impl DataPointPatch {
  pub fn is_empty(&self) -> bool {
    self.value.is_none()
      && self.period.is_none()
      && self.confidence.is_none()
      && self.source_id.is_none()
      && self.notes.is_none()
  }
}
