//! Error type for `hirerank-store-sqlite`.

use hirerank_core::store::WriteConflict;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] hirerank_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {field} value: {value:?}")]
  UnknownValue { field: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl WriteConflict for Error {
  /// A busy/locked database or a uniqueness violation on the
  /// `(job_id, candidate_id)` key: another writer got there first.
  fn is_write_conflict(&self) -> bool {
    let Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) =
      self
    else {
      return false;
    };
    match e.code {
      ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => true,
      ErrorCode::ConstraintViolation => {
        e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
      }
      _ => false,
    }
  }
}
