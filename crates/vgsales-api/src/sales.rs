//! Handlers for `/sales` endpoints.
//!
//! | Method   | Path          | Notes |
//! |----------|---------------|-------|
//! | `GET`    | `/sales`      | Optional `?limit=`, default 10 |
//! | `POST`   | `/sales`      | Body: [`NewSale`]; 201 synced, 202 index stale |
//! | `GET`    | `/sales/{id}` | 404 if not found |
//! | `PATCH`  | `/sales/{id}` | Body: [`SaleChanges`]; re-syncs the old grain if it moved |
//! | `DELETE` | `/sales/{id}` | Re-syncs the grain the row belonged to |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vgsales_core::{
  sale::{NewSale, RawSaleRecord, SaleChanges},
  store::{RawStore, SearchIndex, WarehouseStore},
};
use vgsales_etl::Pipeline;

use crate::{
  error::ApiError,
  outcome::{SyncStatus, WriteResponse},
};

const DEFAULT_LIMIT: usize = 10;

async fn fetch<R: RawStore>(raw: &R, id: Uuid) -> Result<RawSaleRecord, ApiError> {
  raw
    .get(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("sale {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /sales[?limit=<n>]`
pub async fn list<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<RawSaleRecord>>, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  let sales = pipeline
    .raw()
    .list_sample(params.limit.unwrap_or(DEFAULT_LIMIT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(sales))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /sales/{id}`
pub async fn get_one<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RawSaleRecord>, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  Ok(Json(fetch(pipeline.raw(), id).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /sales`
pub async fn create<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Json(body): Json<NewSale>,
) -> Result<impl IntoResponse, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  let sale = pipeline.raw().insert(body).await.map_err(ApiError::store)?;
  let sync = SyncStatus::settle(pipeline.sync(Some(sale.sale_id)).await)?;

  Ok((sync.status_code(StatusCode::CREATED), Json(WriteResponse { sale, sync })))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /sales/{id}`
pub async fn update<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Path(id): Path<Uuid>,
  Json(changes): Json<SaleChanges>,
) -> Result<impl IntoResponse, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  let before = fetch(pipeline.raw(), id).await?;
  let sale = pipeline
    .raw()
    .update(id, changes)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("sale {id} not found")))?;

  let mut sync = SyncStatus::settle(pipeline.sync(Some(id)).await)?;
  let old_grain = before.grain();
  if old_grain != sale.grain() {
    sync = sync.and(SyncStatus::settle(pipeline.resync_grain(&old_grain).await)?);
  }

  Ok((sync.status_code(StatusCode::OK), Json(WriteResponse { sale, sync })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /sales/{id}`: returns the removed row.
pub async fn remove<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  let sale = fetch(pipeline.raw(), id).await?;
  if !pipeline.raw().delete(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("sale {id} not found")));
  }

  let sync = SyncStatus::settle(pipeline.resync_grain(&sale.grain()).await)?;
  Ok((sync.status_code(StatusCode::OK), Json(WriteResponse { sale, sync })))
}
