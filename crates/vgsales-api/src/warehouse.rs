//! Handlers for `/warehouse` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/warehouse/counts`  | Row counts per table |
//! | `POST` | `/warehouse/ingest`  | Body: `[NewSale, ...]`; raw store only |
//! | `POST` | `/warehouse/rebuild` | Body: `{"confirm":true}`; 400 otherwise |

use axum::{Json, extract::State};
use serde::Deserialize;
use vgsales_core::{
  sale::NewSale,
  store::{RawStore, SearchIndex, WarehouseStore},
  warehouse::WarehouseCounts,
};
use vgsales_etl::{ConfirmTruncate, IngestReport, Pipeline, RebuildReport};

use crate::error::ApiError;

/// `GET /warehouse/counts`
pub async fn counts<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
) -> Result<Json<WarehouseCounts>, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  let counts = pipeline.warehouse().counts().await.map_err(ApiError::store)?;
  Ok(Json(counts))
}

/// `POST /warehouse/ingest`
pub async fn ingest<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Json(rows): Json<Vec<NewSale>>,
) -> Result<Json<IngestReport>, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  Ok(Json(pipeline.ingest(rows).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RebuildBody {
  pub confirm: bool,
}

/// `POST /warehouse/rebuild`
pub async fn rebuild<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Json(body): Json<RebuildBody>,
) -> Result<Json<RebuildReport>, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  if !body.confirm {
    return Err(ApiError::BadRequest(
      "rebuild drops every warehouse table; send {\"confirm\": true}".into(),
    ));
  }
  Ok(Json(pipeline.rebuild(ConfirmTruncate::confirmed()).await?))
}
