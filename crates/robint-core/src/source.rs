//! Source — the provenance record a data point cites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a source sits on the reliability spectrum.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
  ResearchReport,
  #[default]
  News,
  Company,
  Interview,
  Government,
  /// Entered by hand with no machine-verifiable origin.
  Manual,
}

impl SourceType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::ResearchReport => "research_report",
      Self::News => "news",
      Self::Company => "company",
      Self::Interview => "interview",
      Self::Government => "government",
      Self::Manual => "manual",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "research_report" => Some(Self::ResearchReport),
      "news" => Some(Self::News),
      "company" => Some(Self::Company),
      "interview" => Some(Self::Interview),
      "government" => Some(Self::Government),
      "manual" => Some(Self::Manual),
      _ => None,
    }
  }
}

/// A provenance record. `reliability` is a 0.0–1.0 analyst estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
  pub source_id:    Uuid,
  pub name:         String,
  pub url:          Option<String>,
  pub source_type:  SourceType,
  pub reliability:  f64,
  /// When the source material was retrieved; store-assigned.
  pub retrieved_at: DateTime<Utc>,
}

/// Input to [`crate::store::IntelStore::add_source`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSource {
  pub name:        String,
  pub url:         Option<String>,
  pub source_type: SourceType,
  pub reliability: f64,
}

impl NewSource {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      url:         None,
      source_type: SourceType::default(),
      reliability: 0.5,
    }
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.url = Some(url.into());
    self
  }
}
