//! Sync outcome attached to every write response.
//!
//! A raw-store write is followed by a pipeline sync. The warehouse half of
//! that sync either succeeds or the request fails; the index half may lag
//! behind, and the client is told so with `202 Accepted` instead of an error.

use axum::http::StatusCode;
use serde::Serialize;
use vgsales_etl::{Error, SyncReport};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
  Synced,
  IndexStale { committed: usize, error: String },
}

impl SyncStatus {
  /// Fold a pipeline result into a status. Only a stale index is tolerated;
  /// any other pipeline error fails the request.
  pub fn settle(result: Result<SyncReport, Error>) -> Result<Self, ApiError> {
    match result {
      Ok(_) => Ok(Self::Synced),
      Err(Error::IndexStale { committed, source }) => {
        Ok(Self::IndexStale { committed, error: source.to_string() })
      }
      Err(e) => Err(e.into()),
    }
  }

  /// Combine the outcomes of two syncs run for one request.
  pub fn and(self, other: Self) -> Self {
    match (self, other) {
      (Self::Synced, other) => other,
      (stale, Self::Synced) => stale,
      (
        Self::IndexStale { committed: a, error },
        Self::IndexStale { committed: b, .. },
      ) => Self::IndexStale { committed: a + b, error },
    }
  }

  /// `success` when the index caught up, `202 Accepted` otherwise.
  pub fn status_code(&self, success: StatusCode) -> StatusCode {
    match self {
      Self::Synced => success,
      Self::IndexStale { .. } => StatusCode::ACCEPTED,
    }
  }
}

/// Body of every sale write: the affected row and how far the sync got.
#[derive(Debug, Serialize)]
pub struct WriteResponse<T> {
  pub sale: T,
  pub sync: SyncStatus,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn stale(committed: usize) -> SyncStatus {
    SyncStatus::IndexStale { committed, error: "down".into() }
  }

  #[test]
  fn stale_wins_when_combined() {
    assert_eq!(SyncStatus::Synced.and(SyncStatus::Synced), SyncStatus::Synced);
    assert_eq!(SyncStatus::Synced.and(stale(1)), stale(1));
    assert_eq!(stale(1).and(SyncStatus::Synced), stale(1));
    assert_eq!(stale(1).and(stale(2)), stale(3));
  }

  #[test]
  fn stale_maps_to_accepted() {
    assert_eq!(SyncStatus::Synced.status_code(StatusCode::CREATED), StatusCode::CREATED);
    assert_eq!(stale(1).status_code(StatusCode::CREATED), StatusCode::ACCEPTED);
  }

  #[test]
  fn other_pipeline_errors_fail_the_request() {
    let err = SyncStatus::settle(Err(Error::SaleNotFound(uuid::Uuid::nil()))).unwrap_err();
    assert!(matches!(err, ApiError::Pipeline(Error::SaleNotFound(_))));
  }
}
