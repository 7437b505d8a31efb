//! Validation status and the append-only audit ledger.
//!
//! Data points are never physically deleted. Their position in the
//! quality-assurance pipeline is a closed enum with an explicit transition
//! table; every status change and field update is recorded as a
//! [`ChangeLogEntry`], which is never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Validation status ───────────────────────────────────────────────────────

/// The data point's position in the validation state machine.
///
/// `Pending -> InReview -> Validated | Rejected`; a `Validated` point may
/// later become `Outdated` (supersession or staleness sweep). `Rejected` and
/// `Outdated` are terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
  #[default]
  Pending,
  InReview,
  Validated,
  Rejected,
  Outdated,
}

impl ValidationStatus {
  /// The string stored in the `status` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::InReview => "in_review",
      Self::Validated => "validated",
      Self::Rejected => "rejected",
      Self::Outdated => "outdated",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "pending" => Some(Self::Pending),
      "in_review" => Some(Self::InReview),
      "validated" => Some(Self::Validated),
      "rejected" => Some(Self::Rejected),
      "outdated" => Some(Self::Outdated),
      _ => None,
    }
  }

  /// Whether the state machine permits `self -> to`.
  pub fn can_transition(&self, to: ValidationStatus) -> bool {
    matches!(
      (self, to),
      (Self::Pending, Self::InReview)
        | (Self::InReview, Self::Validated)
        | (Self::InReview, Self::Rejected)
        | (Self::Validated, Self::Outdated)
    )
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Rejected | Self::Outdated)
  }
}

impl std::fmt::Display for ValidationStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Audit ledger ────────────────────────────────────────────────────────────

/// What kind of mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
  Insert,
  Update,
  StatusChange,
}

impl ChangeKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Insert => "insert",
      Self::Update => "update",
      Self::StatusChange => "status_change",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "insert" => Some(Self::Insert),
      "update" => Some(Self::Update),
      "status_change" => Some(Self::StatusChange),
      _ => None,
    }
  }
}

/// One row of the append-only audit ledger. `before` is `None` only for
/// inserts; both snapshots are full serialised data points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
  pub entry_id:      Uuid,
  pub data_point_id: Uuid,
  pub kind:          ChangeKind,
  pub before:        Option<serde_json::Value>,
  pub after:         Option<serde_json::Value>,
  pub actor:         String,
  pub reason:        Option<String>,
  pub recorded_at:   DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::ValidationStatus::*;

  const ALL: [super::ValidationStatus; 5] =
    [Pending, InReview, Validated, Rejected, Outdated];

  #[test]
  fn transition_table_is_closed() {
    for from in ALL {
      for to in ALL {
        let legal = matches!(
          (from, to),
          (Pending, InReview)
            | (InReview, Validated)
            | (InReview, Rejected)
            | (Validated, Outdated)
        );
        assert_eq!(from.can_transition(to), legal, "{from} -> {to}");
      }
    }
  }

  #[test]
  fn terminal_states_allow_nothing() {
    for to in ALL {
      assert!(!Rejected.can_transition(to));
      assert!(!Outdated.can_transition(to));
    }
  }

  #[test]
  fn status_roundtrip() {
    for s in ALL {
      assert_eq!(super::ValidationStatus::parse(s.as_str()), Some(s));
    }
    assert_eq!(super::ValidationStatus::parse("bogus"), None);
  }
}
