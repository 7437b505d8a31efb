//! [`SqliteStore`] — the SQLite implementation of [`IntelStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::info;
use uuid::Uuid;

use robint_core::{
  point::{DataPoint, DataPointPatch, NewDataPoint, ValueKind},
  source::{NewSource, Source},
  status::{ChangeKind, ChangeLogEntry, ValidationStatus},
  store::{
    ChangeLogFilter, DataPointQuery, IntelStore, SeedSummary, StoreStatistics,
  },
  subject::Subject,
  taxonomy::{
    Company, Dimension, NewCompany, NewDimension, NewTechnology, Sector,
    Technology, DEFAULT_DIMENSIONS, DEFAULT_SECTORS, DEFAULT_TECHNOLOGIES,
  },
  Error as CoreError, Result as CoreResult,
};

use crate::{
  encode::{
    encode_dt, encode_subject, encode_uuid, RawChange, RawCompany,
    RawDataPoint, RawDimension, RawSector, RawSource, RawTechnology,
    DATA_POINT_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Actor recorded on audit rows the system writes on its own behalf.
const SYSTEM_ACTOR: &str = "system";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A robotics intelligence store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn call<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(
        &mut rusqlite::Connection,
      ) -> std::result::Result<T, tokio_rusqlite::Error>
      + Send
      + 'static,
  {
    Ok(self.conn.call(f).await?)
  }
}

/// Verify that the subject's reference row exists within `tx`.
fn subject_exists(
  tx: &rusqlite::Transaction<'_>,
  subject: &Subject,
) -> rusqlite::Result<bool> {
  let found = match subject {
    Subject::Sector { name } => tx
      .query_row(
        "SELECT 1 FROM sectors WHERE name = ?1",
        rusqlite::params![name],
        |_| Ok(true),
      )
      .optional()?,
    Subject::Subcategory { sector, name } => tx
      .query_row(
        "SELECT 1 FROM subcategories WHERE sector = ?1 AND name = ?2",
        rusqlite::params![sector, name],
        |_| Ok(true),
      )
      .optional()?,
    Subject::Company { name } => tx
      .query_row(
        "SELECT 1 FROM companies WHERE name = ?1",
        rusqlite::params![name],
        |_| Ok(true),
      )
      .optional()?,
    Subject::Technology { name } => tx
      .query_row(
        "SELECT 1 FROM technologies WHERE name = ?1",
        rusqlite::params![name],
        |_| Ok(true),
      )
      .optional()?,
  };
  Ok(found.unwrap_or(false))
}

/// The typed error for a missing subject reference.
fn missing_subject_error(subject: &Subject) -> CoreError {
  match subject {
    Subject::Sector { name } => CoreError::UnknownSector(name.clone()),
    Subject::Subcategory { sector, name } => CoreError::UnknownSubcategory {
      sector: sector.clone(),
      name:   name.clone(),
    },
    Subject::Company { name } => CoreError::UnknownCompany(name.clone()),
    Subject::Technology { name } => CoreError::UnknownTechnology(name.clone()),
  }
}

/// Append one audit-ledger row within `tx`.
fn insert_change(
  tx: &rusqlite::Transaction<'_>,
  data_point_id: &str,
  kind: ChangeKind,
  before: Option<&serde_json::Value>,
  after: Option<&serde_json::Value>,
  actor: &str,
  reason: Option<&str>,
) -> rusqlite::Result<()> {
  tx.execute(
    "INSERT INTO changes_log (
       entry_id, data_point_id, kind, before_json, after_json,
       actor, reason, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      data_point_id,
      kind.as_str(),
      before.map(serde_json::Value::to_string),
      after.map(serde_json::Value::to_string),
      actor,
      reason,
      encode_dt(Utc::now()),
    ],
  )?;
  Ok(())
}

/// Fetch one `data_points` row by encoded id within `tx`.
fn select_point(
  tx: &rusqlite::Transaction<'_>,
  id_str: &str,
) -> rusqlite::Result<Option<RawDataPoint>> {
  tx.query_row(
    &format!("SELECT {DATA_POINT_COLUMNS} FROM data_points WHERE point_id = ?1"),
    rusqlite::params![id_str],
    RawDataPoint::from_row,
  )
  .optional()
}

// ─── IntelStore impl ─────────────────────────────────────────────────────────

impl IntelStore for SqliteStore {
  // ── Seeding & reference data ──────────────────────────────────────────────

  async fn seed_defaults(&self) -> CoreResult<SeedSummary> {
    let summary = self
      .call(|conn| {
        let tx = conn.transaction()?;
        let now = encode_dt(Utc::now());
        let mut summary = SeedSummary::default();

        for seed in DEFAULT_SECTORS {
          summary.sectors += tx.execute(
            "INSERT OR IGNORE INTO sectors (name, description, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![seed.name, seed.description, now],
          )?;
          for sub in seed.subcategories {
            summary.subcategories += tx.execute(
              "INSERT OR IGNORE INTO subcategories (sector, name, created_at)
               VALUES (?1, ?2, ?3)",
              rusqlite::params![seed.name, sub, now],
            )?;
          }
        }

        for seed in DEFAULT_DIMENSIONS {
          summary.dimensions += tx.execute(
            "INSERT OR IGNORE INTO dimensions
               (name, unit, kind, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              seed.name,
              seed.unit,
              seed.kind.as_str(),
              seed.description,
              now
            ],
          )?;
        }

        for seed in DEFAULT_TECHNOLOGIES {
          summary.technologies += tx.execute(
            "INSERT OR IGNORE INTO technologies
               (name, category, maturity, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              seed.name,
              seed.category,
              seed.maturity.as_str(),
              seed.description,
              now
            ],
          )?;
        }

        tx.commit()?;
        Ok(summary)
      })
      .await?;

    info!(
      sectors = summary.sectors,
      subcategories = summary.subcategories,
      dimensions = summary.dimensions,
      technologies = summary.technologies,
      "seeded reference data"
    );
    Ok(summary)
  }

  async fn sectors(&self) -> CoreResult<Vec<Sector>> {
    let rows: Vec<(RawSector, Vec<String>)> = self
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT name, description, created_at FROM sectors ORDER BY name")?;
        let sectors = stmt
          .query_map([], |row| {
            Ok(RawSector {
              name:        row.get(0)?,
              description: row.get(1)?,
              created_at:  row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn
          .prepare("SELECT sector, name FROM subcategories ORDER BY sector, name")?;
        let subs = stmt
          .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, String)>>>()?;

        let mut by_sector: HashMap<String, Vec<String>> = HashMap::new();
        for (sector, name) in subs {
          by_sector.entry(sector).or_default().push(name);
        }

        Ok(
          sectors
            .into_iter()
            .map(|s| {
              let subs = by_sector.remove(&s.name).unwrap_or_default();
              (s, subs)
            })
            .collect(),
        )
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(raw, subs)| raw.into_sector(subs))
        .collect::<Result<Vec<_>>>()?,
    )
  }

  async fn sector(&self, name: &str) -> CoreResult<Option<Sector>> {
    let name = name.to_owned();
    let row: Option<(RawSector, Vec<String>)> = self
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT name, description, created_at FROM sectors WHERE name = ?1",
            rusqlite::params![name],
            |row| {
              Ok(RawSector {
                name:        row.get(0)?,
                description: row.get(1)?,
                created_at:  row.get(2)?,
              })
            },
          )
          .optional()?;

        match raw {
          None => Ok(None),
          Some(raw) => {
            let mut stmt = conn.prepare(
              "SELECT name FROM subcategories WHERE sector = ?1 ORDER BY name",
            )?;
            let subs = stmt
              .query_map(rusqlite::params![raw.name], |row| row.get(0))?
              .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(Some((raw, subs)))
          }
        }
      })
      .await?;

    Ok(row.map(|(raw, subs)| raw.into_sector(subs)).transpose()?)
  }

  async fn dimensions(&self) -> CoreResult<Vec<Dimension>> {
    let raws: Vec<RawDimension> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name, unit, kind, description, created_at
           FROM dimensions ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], RawDimension::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawDimension::into_dimension)
        .collect::<Result<Vec<_>>>()?,
    )
  }

  async fn dimension(&self, name: &str) -> CoreResult<Option<Dimension>> {
    let name = name.to_owned();
    let raw: Option<RawDimension> = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT name, unit, kind, description, created_at
               FROM dimensions WHERE name = ?1",
              rusqlite::params![name],
              RawDimension::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawDimension::into_dimension).transpose()?)
  }

  async fn add_dimension(&self, input: NewDimension) -> CoreResult<Dimension> {
    let dimension = Dimension {
      name:        input.name,
      unit:        input.unit,
      kind:        input.kind,
      description: input.description,
      created_at:  Utc::now(),
    };

    let row = dimension.clone();
    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO dimensions (name, unit, kind, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            row.name,
            row.unit,
            row.kind.as_str(),
            row.description,
            encode_dt(row.created_at)
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(dimension)
  }

  async fn companies(&self) -> CoreResult<Vec<Company>> {
    let raws: Vec<RawCompany> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name, sector, description, created_at
           FROM companies ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCompany {
              name:        row.get(0)?,
              sector:      row.get(1)?,
              description: row.get(2)?,
              created_at:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawCompany::into_company)
        .collect::<Result<Vec<_>>>()?,
    )
  }

  async fn add_company(&self, input: NewCompany) -> CoreResult<Company> {
    let company = Company {
      name:        input.name,
      sector:      input.sector,
      description: input.description,
      created_at:  Utc::now(),
    };

    let row = company.clone();
    self
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Some(sector) = &row.sector {
          let exists: bool = tx
            .query_row(
              "SELECT 1 FROM sectors WHERE name = ?1",
              rusqlite::params![sector],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            return Ok(Err(CoreError::UnknownSector(sector.clone())));
          }
        }

        tx.execute(
          "INSERT INTO companies (name, sector, description, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            row.name,
            row.sector,
            row.description,
            encode_dt(row.created_at)
          ],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(company)
  }

  async fn technologies(&self) -> CoreResult<Vec<Technology>> {
    let raws: Vec<RawTechnology> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name, category, maturity, description, created_at
           FROM technologies ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTechnology {
              name:        row.get(0)?,
              category:    row.get(1)?,
              maturity:    row.get(2)?,
              description: row.get(3)?,
              created_at:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawTechnology::into_technology)
        .collect::<Result<Vec<_>>>()?,
    )
  }

  async fn add_technology(
    &self,
    input: NewTechnology,
  ) -> CoreResult<Technology> {
    let technology = Technology {
      name:        input.name,
      category:    input.category,
      maturity:    input.maturity,
      description: input.description,
      created_at:  Utc::now(),
    };

    let row = technology.clone();
    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO technologies
             (name, category, maturity, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            row.name,
            row.category,
            row.maturity.as_str(),
            row.description,
            encode_dt(row.created_at)
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(technology)
  }

  // ── Sources ───────────────────────────────────────────────────────────────

  async fn add_source(&self, input: NewSource) -> CoreResult<Source> {
    let source = Source {
      source_id:    Uuid::new_v4(),
      name:         input.name,
      url:          input.url,
      source_type:  input.source_type,
      reliability:  input.reliability,
      retrieved_at: Utc::now(),
    };

    let row = source.clone();
    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sources
             (source_id, name, url, source_type, reliability, retrieved_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.source_id),
            row.name,
            row.url,
            row.source_type.as_str(),
            row.reliability,
            encode_dt(row.retrieved_at)
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(source)
  }

  async fn get_or_create_source(&self, input: NewSource) -> CoreResult<Source> {
    if let Some(url) = input.url.clone() {
      let raw: Option<RawSource> = self
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT source_id, name, url, source_type, reliability,
                        retrieved_at
                 FROM sources WHERE url = ?1",
                rusqlite::params![url],
                RawSource::from_row,
              )
              .optional()?,
          )
        })
        .await?;

      if let Some(raw) = raw {
        return Ok(raw.into_source()?);
      }
    }
    self.add_source(input).await
  }

  async fn source(&self, id: Uuid) -> CoreResult<Option<Source>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawSource> = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT source_id, name, url, source_type, reliability,
                      retrieved_at
               FROM sources WHERE source_id = ?1",
              rusqlite::params![id_str],
              RawSource::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawSource::into_source).transpose()?)
  }

  async fn sources(&self) -> CoreResult<Vec<Source>> {
    let raws: Vec<RawSource> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT source_id, name, url, source_type, reliability, retrieved_at
           FROM sources ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], RawSource::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawSource::into_source)
        .collect::<Result<Vec<_>>>()?,
    )
  }

  // ── Data points ───────────────────────────────────────────────────────────

  async fn create_data_point(
    &self,
    input: NewDataPoint,
  ) -> CoreResult<DataPoint> {
    let now = Utc::now();
    let point = DataPoint {
      point_id: Uuid::new_v4(),
      dimension: input.dimension,
      subject: input.subject,
      value: input.value,
      period: input.period,
      confidence: input.confidence,
      status: ValidationStatus::Pending,
      source_id: input.source_id,
      validated_by: None,
      validated_at: None,
      notes: input.notes,
      created_at: now,
      updated_at: now,
    };

    let id_str = encode_uuid(point.point_id);
    let dimension = point.dimension.clone();
    let (subject_kind, subject_sector, subject_name) =
      encode_subject(&point.subject);
    let subject = point.subject.clone();
    let value_kind = point.value.kind();
    let value_json = serde_json::to_string(&point.value)?;
    let snapshot = point.snapshot()?;
    let source_id_str = point.source_id.map(encode_uuid);
    let confidence = point.confidence.as_str();
    let status = point.status.as_str();
    let notes = point.notes.clone();
    let now_str = encode_dt(now);
    let year = point.period.year();
    let quarter = point.period.quarter().map(i64::from);
    let month = point.period.month().map(i64::from);

    self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let declared_kind: Option<String> = tx
          .query_row(
            "SELECT kind FROM dimensions WHERE name = ?1",
            rusqlite::params![dimension],
            |row| row.get(0),
          )
          .optional()?;
        let declared_kind = match declared_kind {
          Some(k) => k,
          None => return Ok(Err(CoreError::UnknownDimension(dimension))),
        };

        if declared_kind != value_kind.as_str() {
          let expected = match ValueKind::parse(&declared_kind) {
            Some(k) => k,
            None => {
              return Ok(Err(
                Error::Decode(format!(
                  "unknown value kind: {declared_kind:?}"
                ))
                .into(),
              ))
            }
          };
          return Ok(Err(CoreError::KindMismatch {
            dimension,
            expected,
            got: value_kind,
          }));
        }

        if !subject_exists(&tx, &subject)? {
          return Ok(Err(missing_subject_error(&subject)));
        }

        if let Some(source_id) = &source_id_str {
          let exists: bool = tx
            .query_row(
              "SELECT 1 FROM sources WHERE source_id = ?1",
              rusqlite::params![source_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            match Uuid::parse_str(source_id) {
              Ok(id) => return Ok(Err(CoreError::UnknownSource(id))),
              Err(e) => return Ok(Err(Error::Uuid(e).into())),
            }
          }
        }

        tx.execute(
          "INSERT INTO data_points (
             point_id, dimension, subject_kind, subject_sector, subject_name,
             value_json, year, quarter, month, confidence, status, source_id,
             validated_by, validated_at, notes, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                     NULL, NULL, ?13, ?14, ?14)",
          rusqlite::params![
            id_str,
            dimension,
            subject_kind,
            subject_sector,
            subject_name,
            value_json,
            year,
            quarter,
            month,
            confidence,
            status,
            source_id_str,
            notes,
            now_str,
          ],
        )?;

        insert_change(
          &tx,
          &id_str,
          ChangeKind::Insert,
          None,
          Some(&snapshot),
          SYSTEM_ACTOR,
          None,
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(point)
  }

  async fn update_data_point(
    &self,
    id: Uuid,
    patch: DataPointPatch,
    actor: &str,
    reason: &str,
  ) -> CoreResult<DataPoint> {
    if patch.is_empty() {
      return self.data_point(id).await?.ok_or(CoreError::NotFound(id));
    }

    let id_str = encode_uuid(id);
    let actor = actor.to_owned();
    let reason = reason.to_owned();

    let point: DataPoint = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw = match select_point(&tx, &id_str)? {
          Some(raw) => raw,
          None => return Ok(Err(CoreError::NotFound(id))),
        };
        let mut point = match raw.into_point() {
          Ok(p) => p,
          Err(e) => return Ok(Err(e.into())),
        };
        let before = match point.snapshot() {
          Ok(s) => s,
          Err(e) => return Ok(Err(e)),
        };

        if let Some(value) = patch.value {
          let declared_kind: String = tx.query_row(
            "SELECT kind FROM dimensions WHERE name = ?1",
            rusqlite::params![point.dimension],
            |row| row.get(0),
          )?;
          if declared_kind != value.kind().as_str() {
            let expected = match ValueKind::parse(&declared_kind) {
              Some(k) => k,
              None => {
                return Ok(Err(
                  Error::Decode(format!(
                    "unknown value kind: {declared_kind:?}"
                  ))
                  .into(),
                ))
              }
            };
            return Ok(Err(CoreError::KindMismatch {
              dimension: point.dimension,
              expected,
              got: value.kind(),
            }));
          }
          point.value = value;
        }
        if let Some(period) = patch.period {
          point.period = period;
        }
        if let Some(confidence) = patch.confidence {
          point.confidence = confidence;
        }
        if let Some(source_id) = patch.source_id {
          let source_str = encode_uuid(source_id);
          let exists: bool = tx
            .query_row(
              "SELECT 1 FROM sources WHERE source_id = ?1",
              rusqlite::params![source_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            return Ok(Err(CoreError::UnknownSource(source_id)));
          }
          point.source_id = Some(source_id);
        }
        if let Some(notes) = patch.notes {
          point.notes = Some(notes);
        }
        point.updated_at = Utc::now();

        let value_json = match serde_json::to_string(&point.value) {
          Ok(s) => s,
          Err(e) => return Ok(Err(CoreError::Serialization(e))),
        };
        tx.execute(
          "UPDATE data_points SET
             value_json = ?2, year = ?3, quarter = ?4, month = ?5,
             confidence = ?6, source_id = ?7, notes = ?8, updated_at = ?9
           WHERE point_id = ?1",
          rusqlite::params![
            id_str,
            value_json,
            point.period.year(),
            point.period.quarter().map(i64::from),
            point.period.month().map(i64::from),
            point.confidence.as_str(),
            point.source_id.map(encode_uuid),
            point.notes,
            encode_dt(point.updated_at),
          ],
        )?;

        let after = match point.snapshot() {
          Ok(s) => s,
          Err(e) => return Ok(Err(e)),
        };
        insert_change(
          &tx,
          &id_str,
          ChangeKind::Update,
          Some(&before),
          Some(&after),
          &actor,
          Some(&reason),
        )?;

        tx.commit()?;
        Ok(Ok(point))
      })
      .await??;

    Ok(point)
  }

  async fn set_status(
    &self,
    id: Uuid,
    to: ValidationStatus,
    actor: &str,
    reason: Option<String>,
  ) -> CoreResult<DataPoint> {
    let id_str = encode_uuid(id);
    let actor = actor.to_owned();

    let point: DataPoint = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw = match select_point(&tx, &id_str)? {
          Some(raw) => raw,
          None => return Ok(Err(CoreError::NotFound(id))),
        };
        let mut point = match raw.into_point() {
          Ok(p) => p,
          Err(e) => return Ok(Err(e.into())),
        };
        let before = match point.snapshot() {
          Ok(s) => s,
          Err(e) => return Ok(Err(e)),
        };

        let now = Utc::now();
        point.status = to;
        point.updated_at = now;
        if to == ValidationStatus::Validated {
          point.validated_by = Some(actor.clone());
          point.validated_at = Some(now);
        }

        tx.execute(
          "UPDATE data_points SET
             status = ?2, validated_by = ?3, validated_at = ?4, updated_at = ?5
           WHERE point_id = ?1",
          rusqlite::params![
            id_str,
            point.status.as_str(),
            point.validated_by,
            point.validated_at.map(encode_dt),
            encode_dt(now),
          ],
        )?;

        let after = match point.snapshot() {
          Ok(s) => s,
          Err(e) => return Ok(Err(e)),
        };
        insert_change(
          &tx,
          &id_str,
          ChangeKind::StatusChange,
          Some(&before),
          Some(&after),
          &actor,
          reason.as_deref(),
        )?;

        tx.commit()?;
        Ok(Ok(point))
      })
      .await??;

    Ok(point)
  }

  async fn data_point(&self, id: Uuid) -> CoreResult<Option<DataPoint>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawDataPoint> = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DATA_POINT_COLUMNS} FROM data_points
                 WHERE point_id = ?1"
              ),
              rusqlite::params![id_str],
              RawDataPoint::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawDataPoint::into_point).transpose()?)
  }

  async fn data_points(
    &self,
    query: &DataPointQuery,
  ) -> CoreResult<Vec<DataPoint>> {
    let dimension = query.dimension.clone();
    let subject = query.subject.as_ref().map(encode_subject);
    let sector = query.sector.clone();
    let period = query.period;
    // An exact period owns the whole temporal filter, year included.
    let year = period.map(|p| p.year()).or(query.year);
    let status = query.status.map(|s| s.as_str().to_owned());
    let confidence = query.confidence.map(|c| c.as_str().to_owned());
    let limit = query.limit.map(|n| n as i64).unwrap_or(-1);
    // FIFO queues order by insertion time; everything else latest-first.
    // SQLite sorts NULLs last under DESC, so annual rows trail finer ones
    // within the same year.
    let order = if query.oldest_first {
      "created_at ASC, rowid ASC"
    } else {
      "year DESC, quarter DESC, month DESC, rowid ASC"
    };

    let raws: Vec<RawDataPoint> = self
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if dimension.is_some() {
          conds.push("dimension = ?1");
        }
        if subject.is_some() {
          conds.push(
            "subject_kind = ?2 AND subject_name = ?3 AND subject_sector IS ?4",
          );
        }
        if sector.is_some() {
          conds.push(
            "(subject_sector = ?5 \
              OR (subject_kind = 'sector' AND subject_name = ?5))",
          );
        }
        if period.is_some() {
          conds.push("year = ?6 AND quarter IS ?7 AND month IS ?8");
        } else if year.is_some() {
          conds.push("year = ?6");
        }
        if status.is_some() {
          conds.push("status = ?9");
        }
        if confidence.is_some() {
          conds.push("confidence = ?10");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };
        let sql = format!(
          "SELECT {DATA_POINT_COLUMNS} FROM data_points
           {where_clause}
           ORDER BY {order}
           LIMIT ?11"
        );

        let (subject_kind, subject_sector, subject_name) = match subject {
          Some((k, s, n)) => (Some(k), s, Some(n)),
          None => (None, None, None),
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              dimension,
              subject_kind,
              subject_name,
              subject_sector,
              sector,
              year,
              period.and_then(|p| p.quarter()).map(i64::from),
              period.and_then(|p| p.month()).map(i64::from),
              status,
              confidence,
              limit,
            ],
            RawDataPoint::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawDataPoint::into_point)
        .collect::<Result<Vec<_>>>()?,
    )
  }

  // ── Audit & statistics ────────────────────────────────────────────────────

  async fn changes(
    &self,
    filter: &ChangeLogFilter,
  ) -> CoreResult<Vec<ChangeLogEntry>> {
    let point_id = filter.data_point_id.map(encode_uuid);
    let since = filter.since.map(encode_dt);
    let limit = filter.limit.map(|n| n as i64).unwrap_or(-1);

    let raws: Vec<RawChange> = self
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if point_id.is_some() {
          conds.push("data_point_id = ?1");
        }
        if since.is_some() {
          conds.push("recorded_at >= ?2");
        }
        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT entry_id, data_point_id, kind, before_json, after_json,
                  actor, reason, recorded_at
           FROM changes_log
           {where_clause}
           ORDER BY recorded_at DESC, rowid DESC
           LIMIT ?3"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![point_id, since, limit],
            RawChange::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawChange::into_entry)
        .collect::<Result<Vec<_>>>()?,
    )
  }

  async fn statistics(&self) -> CoreResult<StoreStatistics> {
    let stats = self
      .call(|conn| {
        let count = |table: &str| -> rusqlite::Result<i64> {
          conn.query_row(
            &format!("SELECT COUNT(*) FROM {table}"),
            [],
            |row| row.get(0),
          )
        };

        let mut stats = StoreStatistics {
          sectors:       count("sectors")?,
          subcategories: count("subcategories")?,
          dimensions:    count("dimensions")?,
          companies:     count("companies")?,
          technologies:  count("technologies")?,
          sources:       count("sources")?,
          data_points:   count("data_points")?,
          changes:       count("changes_log")?,
          ..Default::default()
        };

        let mut stmt = conn
          .prepare("SELECT status, COUNT(*) FROM data_points GROUP BY status")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;
        stats.by_status = rows.into_iter().collect();

        let mut stmt = conn.prepare(
          "SELECT COALESCE(subject_sector, subject_name), COUNT(*)
           FROM data_points
           WHERE subject_kind IN ('sector', 'subcategory')
           GROUP BY 1",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;
        stats.by_sector = rows.into_iter().collect();

        Ok(stats)
      })
      .await?;

    Ok(stats)
  }
}
