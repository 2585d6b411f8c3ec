//! Error type for `journal-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Validation failures surface here, before any transaction opens.
  #[error("core error: {0}")]
  Core(#[from] journal_core::Error),

  /// Any failure inside a transaction. The transaction has been rolled back
  /// by the time this is returned.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
