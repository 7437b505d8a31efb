//! Error type for `robint-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] robint_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum string no longer matches any known variant.
  #[error("cannot decode stored value: {0}")]
  Decode(String),
}

/// Domain errors pass through untouched; backend faults surface as
/// [`robint_core::Error::Storage`].
impl From<Error> for robint_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => robint_core::Error::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
