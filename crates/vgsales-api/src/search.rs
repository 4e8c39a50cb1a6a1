//! Handlers for `/search` endpoints.
//!
//! `GET /search` forwards to the index; `filter_by` uses the Typesense filter
//! syntax (`year:>2000 && platform:PC`) and is validated before the index sees
//! it.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use vgsales_core::{
  document::{SearchHit, SearchQuery},
  filter::Filter,
  store::{RawStore, SearchIndex, WarehouseStore},
};
use vgsales_etl::{Pipeline, SyncReport};

use crate::{error::ApiError, outcome::SyncStatus};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Free text matched against descriptions. Defaults to `*`.
  pub q:         Option<String>,
  pub filter_by: Option<String>,
  pub per_page:  Option<usize>,
}

impl SearchParams {
  fn into_query(self) -> Result<SearchQuery, ApiError> {
    let filter = match self.filter_by.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(raw) => Some(
        raw
          .parse::<Filter>()
          .map_err(|e| ApiError::BadRequest(e.to_string()))?,
      ),
    };
    Ok(SearchQuery {
      text: self.q.unwrap_or_else(|| "*".to_owned()),
      filter,
      per_page: self.per_page,
    })
  }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
  pub found: usize,
  pub hits:  Vec<SearchHit>,
}

/// `GET /search[?q=...][&filter_by=...][&per_page=...]`
pub async fn handler<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  let query = params.into_query()?;
  let hits = pipeline.search(&query).await?;
  Ok(Json(SearchResponse { found: hits.len(), hits }))
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
  pub sync:   SyncStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub report: Option<SyncReport>,
}

/// `POST /search/sync`: rewrite every fact and push the full set.
pub async fn sync_all<R, W, I>(
  State(pipeline): State<Pipeline<R, W, I>>,
) -> Result<impl IntoResponse, ApiError>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  let (sync, report) = match pipeline.sync(None).await {
    Ok(report) => (SyncStatus::Synced, Some(report)),
    Err(e) => (SyncStatus::settle(Err(e))?, None),
  };
  Ok((sync.status_code(StatusCode::OK), Json(SyncResponse { sync, report })))
}
