//! JSON REST API for the sales warehouse.
//!
//! Exposes an axum [`Router`] backed by a [`Pipeline`] over any raw store,
//! warehouse and search index. Every raw-store write is followed by a sync
//! before the response is sent. Auth and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vgsales_api::api_router(pipeline.clone()))
//! ```

pub mod error;
pub mod outcome;
pub mod sales;
pub mod search;
pub mod warehouse;

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use vgsales_core::store::{RawStore, SearchIndex, WarehouseStore};
use vgsales_etl::Pipeline;

pub use error::ApiError;
pub use outcome::{SyncStatus, WriteResponse};

/// Build a fully-materialised API router for `pipeline`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<R, W, I>(pipeline: Pipeline<R, W, I>) -> Router<()>
where
  R: RawStore + 'static,
  W: WarehouseStore + 'static,
  I: SearchIndex + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Raw sales
    .route("/sales", get(sales::list::<R, W, I>).post(sales::create::<R, W, I>))
    .route(
      "/sales/{id}",
      get(sales::get_one::<R, W, I>)
        .patch(sales::update::<R, W, I>)
        .delete(sales::remove::<R, W, I>),
    )
    // Warehouse
    .route("/warehouse/counts", get(warehouse::counts::<R, W, I>))
    .route("/warehouse/ingest", post(warehouse::ingest::<R, W, I>))
    .route("/warehouse/rebuild", post(warehouse::rebuild::<R, W, I>))
    // Search
    .route("/search", get(search::handler::<R, W, I>))
    .route("/search/sync", post(search::sync_all::<R, W, I>))
    .with_state(pipeline)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests;
