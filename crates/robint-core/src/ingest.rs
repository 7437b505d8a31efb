//! The ingestion producer boundary.
//!
//! Research collaborators (search tooling, extraction pipelines, humans with
//! a JSON file) hand over [`Finding`]s. The ingestor resolves or creates the
//! source, builds a candidate data point, and inserts it `pending`. Quality
//! judgement is not its job: only malformed reference data (unknown
//! dimension, kind mismatch, impossible period) is rejected at the door.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  period::Period,
  point::{Confidence, DataPoint, NewDataPoint, Value},
  source::{NewSource, SourceType},
  store::IntelStore,
  subject::Subject,
  Error, Result,
};

// ─── Payloads ────────────────────────────────────────────────────────────────

/// Provenance attached to a finding. Findings with the same URL share one
/// source row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingSource {
  pub name:        String,
  #[serde(default)]
  pub url:         Option<String>,
  #[serde(default)]
  pub source_type: SourceType,
  #[serde(default)]
  pub reliability: Option<f64>,
}

/// One raw research finding, as produced by external research tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
  pub dimension:  String,
  pub subject:    Subject,
  pub value:      serde_json::Value,
  pub year:       i32,
  #[serde(default)]
  pub quarter:    Option<u8>,
  #[serde(default)]
  pub month:      Option<u8>,
  #[serde(default)]
  pub confidence: Confidence,
  #[serde(default)]
  pub source:     Option<FindingSource>,
  #[serde(default)]
  pub notes:      Option<String>,
}

/// Outcome of a batch run: one bad finding never aborts the rest.
#[derive(Debug, Default)]
pub struct IngestReport {
  pub created: Vec<Uuid>,
  pub failed:  Vec<(usize, Error)>,
}

impl IngestReport {
  pub fn all_ok(&self) -> bool { self.failed.is_empty() }
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

pub struct Ingestor<'a, S> {
  store: &'a S,
}

impl<'a, S: IntelStore> Ingestor<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Insert one finding as a `pending` data point.
  pub async fn ingest(&self, finding: Finding) -> Result<DataPoint> {
    let period =
      Period::from_parts(finding.year, finding.quarter, finding.month)?;

    let source_id = match finding.source {
      Some(src) => {
        let mut input = NewSource::new(src.name);
        input.source_type = src.source_type;
        if let Some(url) = src.url {
          input = input.with_url(url);
        }
        if let Some(reliability) = src.reliability {
          input.reliability = reliability;
        }
        Some(self.store.get_or_create_source(input).await?.source_id)
      }
      None => None,
    };

    let mut input = NewDataPoint::new(
      finding.dimension,
      finding.subject,
      Value::from_json(finding.value),
      period,
    )
    .with_confidence(finding.confidence);
    if let Some(id) = source_id {
      input = input.with_source(id);
    }
    if let Some(notes) = finding.notes {
      input = input.with_notes(notes);
    }

    self.store.create_data_point(input).await
  }

  /// Ingest a batch, collecting per-item failures by input index.
  pub async fn ingest_batch(
    &self,
    findings: Vec<Finding>,
  ) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for (index, finding) in findings.into_iter().enumerate() {
      match self.ingest(finding).await {
        Ok(point) => report.created.push(point.point_id),
        Err(
          e @ (Error::Serialization(_) | Error::Storage(_)),
        ) => return Err(e),
        Err(e) => {
          warn!(index, error = %e, "finding rejected at ingest");
          report.failed.push((index, e));
        }
      }
    }
    info!(
      created = report.created.len(),
      failed = report.failed.len(),
      "ingest batch complete"
    );
    Ok(report)
  }
}
