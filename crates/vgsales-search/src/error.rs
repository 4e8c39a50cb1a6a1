//! Error type for `vgsales-search`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} → {status}: {body}")]
  Status {
    method: &'static str,
    path:   String,
    status: u16,
    body:   String,
  },

  /// The import endpoint answered 200 but rejected some documents.
  #[error("{failed} of {total} documents rejected; first error: {first}")]
  ImportRejected { failed: usize, total: usize, first: String },

  #[error("collection {0:?} does not exist")]
  MissingCollection(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("core error: {0}")]
  Core(#[from] vgsales_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
