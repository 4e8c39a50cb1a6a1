//! The storage abstractions the pipeline consumes.
//!
//! - [`RawStore`] owns flat [`RawSaleRecord`] rows.
//! - [`WarehouseStore`] owns the star schema (dimensions and facts).
//! - [`SearchIndex`] holds disposable [`SearchDocument`] copies.
//!
//! Backends live in other crates (`vgsales-store-sqlite`, `vgsales-search`).
//! The pipeline depends on these traits only and receives its handles
//! explicitly; there are no process-wide singletons.

use std::future::Future;

use uuid::Uuid;

use crate::{
  document::{CollectionSchema, SearchDocument, SearchHit, SearchQuery},
  sale::{GrainKey, NewSale, RawSaleRecord, SaleChanges},
  warehouse::{
    DimGame, DimPlatform, DimYear, FactKey, FactSales, GameKey, WarehouseCounts,
  },
};

// ─── Raw store ───────────────────────────────────────────────────────────────

/// The relational store of raw sale rows.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RawStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new row; the store assigns its id.
  fn insert(
    &self,
    sale: NewSale,
  ) -> impl Future<Output = Result<RawSaleRecord, Self::Error>> + Send + '_;

  /// Retrieve a row by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RawSaleRecord>, Self::Error>> + Send + '_;

  /// Every row, in insertion order.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<RawSaleRecord>, Self::Error>> + Send + '_;

  /// At most `limit` rows, in insertion order.
  fn list_sample(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RawSaleRecord>, Self::Error>> + Send + '_;

  /// Every physical row sharing `grain`. May be more than one.
  fn list_by_grain<'a>(
    &'a self,
    grain: &'a GrainKey,
  ) -> impl Future<Output = Result<Vec<RawSaleRecord>, Self::Error>> + Send + 'a;

  /// Apply `changes` in place and return the updated row, or `None` if the id
  /// does not exist.
  fn update(
    &self,
    id: Uuid,
    changes: SaleChanges,
  ) -> impl Future<Output = Result<Option<RawSaleRecord>, Self::Error>> + Send + '_;

  /// Remove a row. Returns `false` if it did not exist.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// The dimensional store.
///
/// Natural keys are unique per dimension table; a second insert of an
/// existing key is an error, not an upsert. Callers obtain dimension rows
/// through the resolver, which looks up before inserting.
pub trait WarehouseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Drop every warehouse table and recreate them empty.
  fn truncate_all(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Dimensions ────────────────────────────────────────────────────────

  fn find_game<'a>(
    &'a self,
    key: &'a GameKey,
  ) -> impl Future<Output = Result<Option<DimGame>, Self::Error>> + Send + 'a;

  fn insert_game<'a>(
    &'a self,
    game: &'a DimGame,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_game(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DimGame>, Self::Error>> + Send + '_;

  fn list_games(&self) -> impl Future<Output = Result<Vec<DimGame>, Self::Error>> + Send + '_;

  fn find_platform<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<DimPlatform>, Self::Error>> + Send + 'a;

  fn insert_platform<'a>(
    &'a self,
    platform: &'a DimPlatform,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_platform(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DimPlatform>, Self::Error>> + Send + '_;

  fn list_platforms(
    &self,
  ) -> impl Future<Output = Result<Vec<DimPlatform>, Self::Error>> + Send + '_;

  fn find_year(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<Option<DimYear>, Self::Error>> + Send + '_;

  fn insert_year<'a>(
    &'a self,
    year: &'a DimYear,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_year(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DimYear>, Self::Error>> + Send + '_;

  fn list_years(&self) -> impl Future<Output = Result<Vec<DimYear>, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Insert the fact, or replace the measures of the fact with the same key.
  fn put_fact<'a>(
    &'a self,
    fact: &'a FactSales,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_fact(
    &self,
    key: FactKey,
  ) -> impl Future<Output = Result<Option<FactSales>, Self::Error>> + Send + '_;

  fn list_facts(&self) -> impl Future<Output = Result<Vec<FactSales>, Self::Error>> + Send + '_;

  /// Facts whose game name, platform name and year match `grain`.
  fn facts_for_grain<'a>(
    &'a self,
    grain: &'a GrainKey,
  ) -> impl Future<Output = Result<Vec<FactSales>, Self::Error>> + Send + 'a;

  /// Remove a fact. Returns `false` if it did not exist.
  fn delete_fact(
    &self,
    key: FactKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn counts(&self) -> impl Future<Output = Result<WarehouseCounts, Self::Error>> + Send + '_;
}

// ─── Search index ────────────────────────────────────────────────────────────

/// The external full-text index.
pub trait SearchIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create the collection unless it exists. Returns `true` if it was created.
  fn ensure_collection<'a>(
    &'a self,
    schema: &'a CollectionSchema,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert-or-replace every document, matched by `id`. The batch either
  /// succeeds as a whole or the call fails.
  fn upsert_documents<'a>(
    &'a self,
    documents: &'a [SearchDocument],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove documents by id. Unknown ids are ignored.
  fn delete_documents<'a>(
    &'a self,
    ids: &'a [String],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Every document id currently held, in no particular order.
  fn document_ids(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  fn search<'a>(
    &'a self,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send + 'a;
}
