//! Error type for `vgsales-etl`.
//!
//! Store and index errors are boxed with their source intact; the pipeline
//! never retries and never masks partial completion.

use thiserror::Error;
use uuid::Uuid;
use vgsales_core::warehouse::{DimensionKind, FactKey};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("sale not found: {0}")]
  SaleNotFound(Uuid),

  /// A fact whose dimension rows cannot all be resolved. This is an invariant
  /// violation in the warehouse, never skipped.
  #[error("fact {key} references a missing {kind} dimension")]
  DanglingFact { key: FactKey, kind: DimensionKind },

  #[error("raw store error: {0}")]
  RawStore(#[source] BoxError),

  #[error("warehouse error: {0}")]
  Warehouse(#[source] BoxError),

  #[error("search index error: {0}")]
  Index(#[source] BoxError),

  /// The warehouse write committed; pushing to the search index did not.
  #[error("warehouse updated ({committed} facts) but search index not synced: {source}")]
  IndexStale {
    committed: usize,
    #[source]
    source:    BoxError,
  },
}

impl Error {
  pub(crate) fn raw(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::RawStore(Box::new(e))
  }

  pub(crate) fn warehouse(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Warehouse(Box::new(e))
  }

  pub(crate) fn index(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Index(Box::new(e))
  }

  /// `true` when the warehouse is ahead of the search index.
  pub fn is_index_stale(&self) -> bool { matches!(self, Self::IndexStale { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
