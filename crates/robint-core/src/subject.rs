//! Subject — the entity a data point is about.
//!
//! Modelled as a tagged union so that "exactly one subject reference" is
//! guaranteed by construction rather than checked against nullable columns.

use serde::{Deserialize, Serialize};

/// The primary subject of a data point.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
  Sector { name: String },
  /// A subcategory is only unique within its parent sector.
  Subcategory { sector: String, name: String },
  Company { name: String },
  Technology { name: String },
}

impl Subject {
  pub fn sector(name: impl Into<String>) -> Self {
    Self::Sector { name: name.into() }
  }

  pub fn company(name: impl Into<String>) -> Self {
    Self::Company { name: name.into() }
  }

  pub fn technology(name: impl Into<String>) -> Self {
    Self::Technology { name: name.into() }
  }

  pub fn subcategory(
    sector: impl Into<String>,
    name: impl Into<String>,
  ) -> Self {
    Self::Subcategory {
      sector: sector.into(),
      name:   name.into(),
    }
  }

  /// The discriminant string stored in the `subject_kind` column.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Sector { .. } => "sector",
      Self::Subcategory { .. } => "subcategory",
      Self::Company { .. } => "company",
      Self::Technology { .. } => "technology",
    }
  }

  /// The subject's own name (for subcategories, the child name).
  pub fn name(&self) -> &str {
    match self {
      Self::Sector { name }
      | Self::Subcategory { name, .. }
      | Self::Company { name }
      | Self::Technology { name } => name,
    }
  }

  /// The parent sector, if this subject has one.
  pub fn parent_sector(&self) -> Option<&str> {
    match self {
      Self::Subcategory { sector, .. } => Some(sector),
      _ => None,
    }
  }

  /// Human-readable label, e.g. `Mobile Robotics / Drones/UAVs`.
  pub fn label(&self) -> String {
    match self {
      Self::Subcategory { sector, name } => format!("{sector} / {name}"),
      other => other.name().to_string(),
    }
  }
}

impl std::fmt::Display for Subject {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {:?}", self.kind(), self.label())
  }
}
