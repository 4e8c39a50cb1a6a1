//! Error types for `vgsales-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid filter clause {clause:?}: {reason}")]
  InvalidFilter { clause: String, reason: String },

  #[error("unknown filter field: {0:?}")]
  UnknownFilterField(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
