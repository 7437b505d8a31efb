//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Values are stored as
//! tagged JSON. UUIDs are stored as hyphenated lowercase strings. Closed
//! enums are stored as their `as_str` form and decoded through `parse`, so a
//! hand-edited database surfaces a [`Error::Decode`] instead of a panic.

use chrono::{DateTime, Utc};
use robint_core::{
  period::Period,
  point::{Confidence, DataPoint, Value, ValueKind},
  source::{Source, SourceType},
  status::{ChangeKind, ChangeLogEntry, ValidationStatus},
  subject::Subject,
  taxonomy::{Company, Dimension, Maturity, Sector, Technology},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Closed enums ────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<ValidationStatus> {
  ValidationStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown status: {s:?}")))
}

pub fn decode_confidence(s: &str) -> Result<Confidence> {
  Confidence::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown confidence: {s:?}")))
}

pub fn decode_value_kind(s: &str) -> Result<ValueKind> {
  ValueKind::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown value kind: {s:?}")))
}

pub fn decode_maturity(s: &str) -> Result<Maturity> {
  Maturity::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown maturity: {s:?}")))
}

pub fn decode_source_type(s: &str) -> Result<SourceType> {
  SourceType::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown source type: {s:?}")))
}

pub fn decode_change_kind(s: &str) -> Result<ChangeKind> {
  ChangeKind::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown change kind: {s:?}")))
}

// ─── Subject ─────────────────────────────────────────────────────────────────

/// The three subject columns: `(subject_kind, subject_sector, subject_name)`.
pub fn encode_subject(subject: &Subject) -> (String, Option<String>, String) {
  (
    subject.kind().to_owned(),
    subject.parent_sector().map(str::to_owned),
    subject.name().to_owned(),
  )
}

pub fn decode_subject(
  kind: &str,
  sector: Option<String>,
  name: String,
) -> Result<Subject> {
  match (kind, sector) {
    ("sector", _) => Ok(Subject::Sector { name }),
    ("subcategory", Some(sector)) => Ok(Subject::Subcategory { sector, name }),
    ("subcategory", None) => {
      Err(Error::Decode(format!("subcategory {name:?} lacks a sector")))
    }
    ("company", _) => Ok(Subject::Company { name }),
    ("technology", _) => Ok(Subject::Technology { name }),
    (other, _) => Err(Error::Decode(format!("unknown subject kind: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `data_points` row.
pub struct RawDataPoint {
  pub point_id:       String,
  pub dimension:      String,
  pub subject_kind:   String,
  pub subject_sector: Option<String>,
  pub subject_name:   String,
  pub value_json:     String,
  pub year:           i32,
  pub quarter:        Option<i64>,
  pub month:          Option<i64>,
  pub confidence:     String,
  pub status:         String,
  pub source_id:      Option<String>,
  pub validated_by:   Option<String>,
  pub validated_at:   Option<String>,
  pub notes:          Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

/// Narrow a stored integer column to `u8`, surfacing out-of-range rows as
/// [`Error::Decode`] instead of truncating.
fn narrow_part(field: &str, v: Option<i64>) -> Result<Option<u8>> {
  v.map(|v| {
    u8::try_from(v)
      .map_err(|_| Error::Decode(format!("{field} out of range: {v}")))
  })
  .transpose()
}

/// The column list matching [`RawDataPoint`]'s field order.
pub const DATA_POINT_COLUMNS: &str = "point_id, dimension, subject_kind, \
   subject_sector, subject_name, value_json, year, quarter, month, \
   confidence, status, source_id, validated_by, validated_at, notes, \
   created_at, updated_at";

impl RawDataPoint {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      point_id:       row.get(0)?,
      dimension:      row.get(1)?,
      subject_kind:   row.get(2)?,
      subject_sector: row.get(3)?,
      subject_name:   row.get(4)?,
      value_json:     row.get(5)?,
      year:           row.get(6)?,
      quarter:        row.get(7)?,
      month:          row.get(8)?,
      confidence:     row.get(9)?,
      status:         row.get(10)?,
      source_id:      row.get(11)?,
      validated_by:   row.get(12)?,
      validated_at:   row.get(13)?,
      notes:          row.get(14)?,
      created_at:     row.get(15)?,
      updated_at:     row.get(16)?,
    })
  }

  pub fn into_point(self) -> Result<DataPoint> {
    let period = Period::from_parts(
      self.year,
      narrow_part("quarter", self.quarter)?,
      narrow_part("month", self.month)?,
    )
    .map_err(Error::Core)?;

    Ok(DataPoint {
      point_id: decode_uuid(&self.point_id)?,
      dimension: self.dimension,
      subject: decode_subject(
        &self.subject_kind,
        self.subject_sector,
        self.subject_name,
      )?,
      value: serde_json::from_str::<Value>(&self.value_json)?,
      period,
      confidence: decode_confidence(&self.confidence)?,
      status: decode_status(&self.status)?,
      source_id: self.source_id.as_deref().map(decode_uuid).transpose()?,
      validated_by: self.validated_by,
      validated_at: self.validated_at.as_deref().map(decode_dt).transpose()?,
      notes: self.notes,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `sources` row.
pub struct RawSource {
  pub source_id:    String,
  pub name:         String,
  pub url:          Option<String>,
  pub source_type:  String,
  pub reliability:  f64,
  pub retrieved_at: String,
}

impl RawSource {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source_id:    row.get(0)?,
      name:         row.get(1)?,
      url:          row.get(2)?,
      source_type:  row.get(3)?,
      reliability:  row.get(4)?,
      retrieved_at: row.get(5)?,
    })
  }

  pub fn into_source(self) -> Result<Source> {
    Ok(Source {
      source_id:    decode_uuid(&self.source_id)?,
      name:         self.name,
      url:          self.url,
      source_type:  decode_source_type(&self.source_type)?,
      reliability:  self.reliability,
      retrieved_at: decode_dt(&self.retrieved_at)?,
    })
  }
}

/// Raw strings read directly from a `changes_log` row.
pub struct RawChange {
  pub entry_id:      String,
  pub data_point_id: String,
  pub kind:          String,
  pub before_json:   Option<String>,
  pub after_json:    Option<String>,
  pub actor:         String,
  pub reason:        Option<String>,
  pub recorded_at:   String,
}

impl RawChange {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:      row.get(0)?,
      data_point_id: row.get(1)?,
      kind:          row.get(2)?,
      before_json:   row.get(3)?,
      after_json:    row.get(4)?,
      actor:         row.get(5)?,
      reason:        row.get(6)?,
      recorded_at:   row.get(7)?,
    })
  }

  pub fn into_entry(self) -> Result<ChangeLogEntry> {
    Ok(ChangeLogEntry {
      entry_id:      decode_uuid(&self.entry_id)?,
      data_point_id: decode_uuid(&self.data_point_id)?,
      kind:          decode_change_kind(&self.kind)?,
      before:        self
        .before_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      after:         self
        .after_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      actor:         self.actor,
      reason:        self.reason,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `dimensions` row.
pub struct RawDimension {
  pub name:        String,
  pub unit:        Option<String>,
  pub kind:        String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawDimension {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:        row.get(0)?,
      unit:        row.get(1)?,
      kind:        row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_dimension(self) -> Result<Dimension> {
    Ok(Dimension {
      name:        self.name,
      unit:        self.unit,
      kind:        decode_value_kind(&self.kind)?,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings from a `sectors` row; subcategories are joined in afterwards.
pub struct RawSector {
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawSector {
  pub fn into_sector(self, subcategories: Vec<String>) -> Result<Sector> {
    Ok(Sector {
      name: self.name,
      description: self.description,
      subcategories,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawCompany {
  pub name:        String,
  pub sector:      Option<String>,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawCompany {
  pub fn into_company(self) -> Result<Company> {
    Ok(Company {
      name:        self.name,
      sector:      self.sector,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawTechnology {
  pub name:        String,
  pub category:    String,
  pub maturity:    String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawTechnology {
  pub fn into_technology(self) -> Result<Technology> {
    Ok(Technology {
      name:        self.name,
      category:    self.category,
      maturity:    decode_maturity(&self.maturity)?,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
