use std::sync::Arc;

use vgsales_core::{
  document::{CollectionSchema, SearchHit, SearchQuery},
  store::{RawStore, SearchIndex, WarehouseStore},
};

use crate::{Error, Result};

/// The three collaborators every pipeline operation needs.
///
/// Handles are supplied by the caller and shared through `Arc`; the pipeline
/// holds no global state. Operations run strictly in sequence: every store and
/// index call is awaited before the next one starts.
pub struct Pipeline<R, W, I> {
  raw:       Arc<R>,
  warehouse: Arc<W>,
  index:     Arc<I>,
}

impl<R, W, I> Clone for Pipeline<R, W, I> {
  fn clone(&self) -> Self {
    Self {
      raw:       Arc::clone(&self.raw),
      warehouse: Arc::clone(&self.warehouse),
      index:     Arc::clone(&self.index),
    }
  }
}

impl<R, W, I> Pipeline<R, W, I>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  pub fn new(raw: Arc<R>, warehouse: Arc<W>, index: Arc<I>) -> Self {
    Self { raw, warehouse, index }
  }

  pub fn raw(&self) -> &R { &self.raw }

  pub fn warehouse(&self) -> &W { &self.warehouse }

  pub fn index(&self) -> &I { &self.index }

  /// Create the search collection if it is missing. Returns `true` if created.
  pub async fn prepare_index(&self, schema: &CollectionSchema) -> Result<bool> {
    self
      .index
      .ensure_collection(schema)
      .await
      .map_err(Error::index)
  }

  pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
    self.index.search(query).await.map_err(Error::index)
  }
}
