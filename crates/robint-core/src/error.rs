//! Error taxonomy for the intelligence core.
//!
//! Everything a caller can hit is a typed variant with enough context to act
//! on. Nothing is swallowed and nothing is retried: the core has no
//! transient-failure surface.

use thiserror::Error;
use uuid::Uuid;

use crate::{
  point::ValueKind, rules::RuleFailure, status::ValidationStatus,
};

#[derive(Debug, Error)]
pub enum Error {
  // ── Integrity: a referenced entity does not exist ─────────────────────
  #[error("unknown dimension: {0:?}")]
  UnknownDimension(String),

  #[error("unknown sector: {0:?}")]
  UnknownSector(String),

  #[error("unknown subcategory {name:?} in sector {sector:?}")]
  UnknownSubcategory { sector: String, name: String },

  #[error("unknown company: {0:?}")]
  UnknownCompany(String),

  #[error("unknown technology: {0:?}")]
  UnknownTechnology(String),

  #[error("unknown source: {0}")]
  UnknownSource(Uuid),

  #[error("data point not found: {0}")]
  NotFound(Uuid),

  // ── Schema violations ─────────────────────────────────────────────────
  #[error("dimension {dimension:?} expects a {expected} value, got {got}")]
  KindMismatch {
    dimension: String,
    expected:  ValueKind,
    got:       ValueKind,
  },

  #[error("inconsistent period: {0}")]
  InconsistentPeriod(String),

  // ── Workflow ──────────────────────────────────────────────────────────
  /// The validation engine rejected a transition to `validated`. Expected
  /// and recoverable: correct the point and resubmit.
  #[error("validation failed: {}", format_failures(.0))]
  ValidationFailed(Vec<RuleFailure>),

  #[error("invalid status transition: {from} -> {to}")]
  InvalidTransition {
    from: ValidationStatus,
    to:   ValidationStatus,
  },

  #[error("a rejection reason is required")]
  MissingReason,

  // ── Infrastructure ────────────────────────────────────────────────────
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A backend fault surfaced through the store trait.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn format_failures(failures: &[RuleFailure]) -> String {
  failures
    .iter()
    .map(|f| format!("{} ({})", f.rule, f.reason))
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
