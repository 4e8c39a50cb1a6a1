//! Error type for `vgsales-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("row count {0} does not fit in a usize")]
  Count(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
