//! Search index backends.
//!
//! - [`TypesenseIndex`] talks to a Typesense server over HTTP.
//! - [`MemoryIndex`] keeps documents in process; it backs tests and
//!   offline runs (`search.backend = "memory"`).
//! - [`AnyIndex`] picks one of the two at startup from configuration.

pub mod error;
pub mod memory;
pub mod typesense;

use serde::Deserialize;
use vgsales_core::{
  document::{COLLECTION_NAME, CollectionSchema, SearchDocument, SearchHit, SearchQuery},
  store::SearchIndex,
};

pub use error::{Error, Result};
pub use memory::MemoryIndex;
pub use typesense::{TypesenseConfig, TypesenseIndex};

/// Which backend to build, deserialised from the `[search]` config table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum SearchConfig {
  Typesense(TypesenseConfig),
  Memory(MemoryConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
  #[serde(default = "default_collection")]
  pub collection: String,
}

impl Default for MemoryConfig {
  fn default() -> Self { Self { collection: default_collection() } }
}

fn default_collection() -> String { COLLECTION_NAME.to_owned() }

impl SearchConfig {
  /// The collection this backend should hold.
  pub fn schema(&self) -> CollectionSchema {
    match self {
      Self::Typesense(cfg) => CollectionSchema::games_sales(cfg.collection.clone()),
      Self::Memory(cfg) => CollectionSchema::games_sales(cfg.collection.clone()),
    }
  }
}

impl Default for SearchConfig {
  fn default() -> Self { Self::Memory(MemoryConfig::default()) }
}

/// A search index chosen at runtime.
#[derive(Clone)]
pub enum AnyIndex {
  Typesense(TypesenseIndex),
  Memory(MemoryIndex),
}

impl AnyIndex {
  pub fn from_config(config: &SearchConfig) -> Result<Self> {
    Ok(match config {
      SearchConfig::Typesense(cfg) => Self::Typesense(TypesenseIndex::new(cfg.clone())?),
      SearchConfig::Memory(cfg) => Self::Memory(MemoryIndex::with_collection(&cfg.collection)),
    })
  }
}

impl SearchIndex for AnyIndex {
  type Error = Error;

  async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<bool> {
    match self {
      Self::Typesense(i) => i.ensure_collection(schema).await,
      Self::Memory(i) => i.ensure_collection(schema).await,
    }
  }

  async fn upsert_documents(&self, documents: &[SearchDocument]) -> Result<()> {
    match self {
      Self::Typesense(i) => i.upsert_documents(documents).await,
      Self::Memory(i) => i.upsert_documents(documents).await,
    }
  }

  async fn delete_documents(&self, ids: &[String]) -> Result<()> {
    match self {
      Self::Typesense(i) => i.delete_documents(ids).await,
      Self::Memory(i) => i.delete_documents(ids).await,
    }
  }

  async fn document_ids(&self) -> Result<Vec<String>> {
    match self {
      Self::Typesense(i) => i.document_ids().await,
      Self::Memory(i) => i.document_ids().await,
    }
  }

  async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
    match self {
      Self::Typesense(i) => i.search(query).await,
      Self::Memory(i) => i.search(query).await,
    }
  }
}
