//! Router tests against in-memory stores.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;
use vgsales_core::{
  document::{CollectionSchema, SearchDocument, SearchHit, SearchQuery},
  sale::GrainKey,
  store::SearchIndex,
};
use vgsales_etl::Pipeline;
use vgsales_search::MemoryIndex;
use vgsales_store_sqlite::{SqliteRawStore, SqliteWarehouse};

use crate::api_router;

async fn app_with<I: SearchIndex + 'static>(index: I) -> Router {
  let raw = SqliteRawStore::open_in_memory().await.unwrap();
  let warehouse = SqliteWarehouse::open_in_memory().await.unwrap();
  let pipeline = Pipeline::new(Arc::new(raw), Arc::new(warehouse), Arc::new(index));
  pipeline.prepare_index(&CollectionSchema::default()).await.unwrap();
  api_router(pipeline)
}

async fn app() -> (Router, MemoryIndex) {
  let index = MemoryIndex::new();
  (app_with(index.clone()).await, index)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn minecraft() -> Value {
  json!({
    "name": "Minecraft 2",
    "rank": 1,
    "platform": "PC",
    "year": 2030,
    "genre": "Sandbox",
    "publisher": "Mojang",
    "na_sales": 1.0,
    "eu_sales": 1.0,
    "jp_sales": 1.0,
    "other_sales": 1.0,
    "global_sales": 4.0
  })
}

// ─── Failing index ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("search index unavailable")]
struct Unavailable;

struct FailingIndex;

impl SearchIndex for FailingIndex {
  type Error = Unavailable;

  async fn ensure_collection(&self, _schema: &CollectionSchema) -> Result<bool, Unavailable> {
    Ok(true)
  }

  async fn upsert_documents(&self, _documents: &[SearchDocument]) -> Result<(), Unavailable> {
    Err(Unavailable)
  }

  async fn delete_documents(&self, _ids: &[String]) -> Result<(), Unavailable> {
    Err(Unavailable)
  }

  async fn document_ids(&self) -> Result<Vec<String>, Unavailable> {
    Err(Unavailable)
  }

  async fn search(&self, _query: &SearchQuery) -> Result<Vec<SearchHit>, Unavailable> {
    Err(Unavailable)
  }
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
  let (app, _) = app().await;
  let (status, body) = send(&app, "GET", "/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

// ─── Sales CRUD ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn sale_lifecycle_keeps_the_index_in_step() {
  let (app, index) = app().await;

  // Create
  let (status, body) = send(&app, "POST", "/sales", Some(minecraft())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["sync"]["status"], "synced");
  let id = body["sale"]["sale_id"].as_str().unwrap().to_owned();

  let old_doc = GrainKey::new("Minecraft 2", 2030, "PC").document_id();
  assert_eq!(index.get(&old_doc).unwrap().description, "Minecraft 2 (2030) - PC");

  // Read
  let (status, body) = send(&app, "GET", &format!("/sales/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Minecraft 2");

  // Update moves the grain
  let (status, body) = send(&app, "PATCH", &format!("/sales/{id}"), Some(json!({ "year": 2031 }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["sale"]["year"], 2031);
  assert_eq!(body["sync"]["status"], "synced");

  let new_doc = GrainKey::new("Minecraft 2", 2031, "PC").document_id();
  assert_eq!(index.get(&new_doc).unwrap().description, "Minecraft 2 (2031) - PC");
  assert!(index.get(&old_doc).is_none());
  assert_eq!(index.len(), 1);

  let (_, counts) = send(&app, "GET", "/warehouse/counts", None).await;
  assert_eq!(counts["facts"], 1);

  // Delete
  let (status, body) = send(&app, "DELETE", &format!("/sales/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["sale"]["year"], 2031);
  assert!(index.is_empty());

  let (status, _) = send(&app, "GET", &format!("/sales/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, counts) = send(&app, "GET", "/warehouse/counts", None).await;
  assert_eq!(counts["facts"], 0);
}

#[tokio::test]
async fn list_respects_limit() {
  let (app, _) = app().await;
  for year in 2030..2035 {
    let mut row = minecraft();
    row["year"] = json!(year);
    send(&app, "POST", "/sales", Some(row)).await;
  }

  let (status, body) = send(&app, "GET", "/sales?limit=3", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 3);
  assert_eq!(body[0]["year"], 2030);

  let (_, body) = send(&app, "GET", "/sales", None).await;
  assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn unknown_sale_is_404() {
  let (app, _) = app().await;
  let id = Uuid::new_v4();

  let (status, body) = send(&app, "GET", &format!("/sales/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains(&id.to_string()));

  let (status, _) = send(&app, "PATCH", &format!("/sales/{id}"), Some(json!({ "rank": 2 }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&app, "DELETE", &format!("/sales/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stale_index_is_accepted_not_failed() {
  let app = app_with(FailingIndex).await;

  let (status, body) = send(&app, "POST", "/sales", Some(minecraft())).await;
  assert_eq!(status, StatusCode::ACCEPTED);
  assert_eq!(body["sync"]["status"], "index_stale");
  assert_eq!(body["sync"]["committed"], 1);

  // The row and its fact were still written.
  let id = body["sale"]["sale_id"].as_str().unwrap().to_owned();
  let (status, _) = send(&app, "GET", &format!("/sales/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  let (_, counts) = send(&app, "GET", "/warehouse/counts", None).await;
  assert_eq!(counts["facts"], 1);
}

// ─── Warehouse ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn rebuild_requires_confirmation() {
  let (app, _) = app().await;

  let (status, _) = send(&app, "POST", "/warehouse/rebuild", Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&app, "POST", "/warehouse/rebuild", Some(json!({ "confirm": false }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(&app, "POST", "/warehouse/rebuild", Some(json!({ "confirm": true }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["counts"]["facts"], 0);
}

#[tokio::test]
async fn ingest_rebuild_sync_then_search() {
  let (app, _) = app().await;

  let mut tetris = minecraft();
  tetris["name"] = json!("Tetris");
  tetris["platform"] = json!("GB");
  tetris["year"] = json!(1989);
  tetris["rank"] = json!(5);
  let rows = json!([minecraft(), minecraft(), tetris]);

  let (status, body) = send(&app, "POST", "/warehouse/ingest", Some(rows)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["received"], 3);
  assert_eq!(body["stored"], 2);

  let (_, body) = send(&app, "POST", "/warehouse/rebuild", Some(json!({ "confirm": true }))).await;
  assert_eq!(body["grains"], 2);

  let (status, body) = send(&app, "POST", "/search/sync", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["sync"]["status"], "synced");
  assert_eq!(body["report"]["documents_upserted"], 2);

  let (status, body) = send(&app, "GET", "/search?q=minecraft", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["found"], 1);
  assert_eq!(body["hits"][0]["document"]["total_sales"], 8.0);

  // `year:<2000`
  let (_, body) = send(&app, "GET", "/search?q=*&filter_by=year%3A%3C2000", None).await;
  assert_eq!(body["found"], 1);
  assert_eq!(body["hits"][0]["document"]["game"], "Tetris");

  let (_, body) = send(&app, "GET", "/search", None).await;
  assert_eq!(body["found"], 2);
}

#[tokio::test]
async fn bad_filter_is_400() {
  let (app, _) = app().await;
  let (status, body) = send(&app, "GET", "/search?q=*&filter_by=colour%3Ared", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("colour"));
}
