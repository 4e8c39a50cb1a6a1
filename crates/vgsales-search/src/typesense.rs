//! [`TypesenseIndex`]: a [`SearchIndex`] over the Typesense HTTP API.
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | ensure collection | `GET /collections/:name`, then `POST /collections` on 404 |
//! | upsert | `POST /collections/:name/documents/import?action=upsert` (JSONL) |
//! | delete | `DELETE /collections/:name/documents?filter_by=id:[..]` |
//! | list ids | `GET /collections/:name/documents/export?include_fields=id` (JSONL) |
//! | search | `GET /collections/:name/documents/search` |

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use vgsales_core::{
  document::{self, CollectionSchema, SearchDocument, SearchHit, SearchQuery},
  store::SearchIndex,
};

use crate::{Error, Result};

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Connection settings for a Typesense node.
#[derive(Debug, Clone, Deserialize)]
pub struct TypesenseConfig {
  /// e.g. `http://localhost:8108`
  pub url:          String,
  pub api_key:      String,
  #[serde(default = "default_collection")]
  pub collection:   String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_collection() -> String { document::COLLECTION_NAME.to_owned() }

fn default_timeout_secs() -> u64 { 10 }

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TypesenseIndex {
  client: Client,
  config: TypesenseConfig,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

/// One line of the import endpoint's JSONL response.
#[derive(Debug, Deserialize)]
struct ImportLine {
  success: bool,
  #[serde(default)]
  error:   Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  hits: Vec<WireHit>,
}

#[derive(Debug, Deserialize)]
struct WireHit {
  document:   SearchDocument,
  #[serde(default)]
  text_match: u64,
}

/// Fail the whole batch if any line reports `success: false`.
fn check_import(body: &str, total: usize) -> Result<()> {
  let mut failed = 0;
  let mut first = None;
  for line in body.lines().filter(|l| !l.trim().is_empty()) {
    let parsed: ImportLine = serde_json::from_str(line)?;
    if !parsed.success {
      failed += 1;
      if first.is_none() {
        first = Some(parsed.error.unwrap_or_else(|| "unknown error".to_owned()));
      }
    }
  }

  match first {
    None => Ok(()),
    Some(first) => Err(Error::ImportRejected { failed, total, first }),
  }
}

/// One line of the export endpoint's JSONL response, trimmed to its id.
#[derive(Debug, Deserialize)]
struct ExportLine {
  id: String,
}

fn parse_export(body: &str) -> Result<Vec<String>> {
  body
    .lines()
    .filter(|l| !l.trim().is_empty())
    .map(|line| Ok(serde_json::from_str::<ExportLine>(line)?.id))
    .collect()
}

/// `id:[a,b,c]`: Typesense's id-list filter.
fn id_filter(ids: &[String]) -> String {
  let quoted: Vec<String> = ids.iter().map(|id| format!("`{id}`")).collect();
  format!("id:[{}]", quoted.join(","))
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl TypesenseIndex {
  pub fn new(config: TypesenseConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.url.trim_end_matches('/'), path)
  }

  fn documents_path(&self, suffix: &str) -> String {
    format!("/collections/{}/documents{suffix}", self.config.collection)
  }

  fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
    self
      .client
      .request(method, self.url(path))
      .header(API_KEY_HEADER, &self.config.api_key)
  }

  /// Turn a non-success response into [`Error::Status`].
  async fn expect_success(
    resp: Response,
    method: &'static str,
    path: &str,
  ) -> Result<Response> {
    if resp.status().is_success() {
      return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status { method, path: path.to_owned(), status, body })
  }
}

impl SearchIndex for TypesenseIndex {
  type Error = Error;

  async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<bool> {
    let path = format!("/collections/{}", schema.name);
    let resp = self.request(reqwest::Method::GET, &path).send().await?;
    if resp.status() != StatusCode::NOT_FOUND {
      Self::expect_success(resp, "GET", &path).await?;
      return Ok(false);
    }

    debug!(collection = %schema.name, "creating collection");
    let resp = self
      .request(reqwest::Method::POST, "/collections")
      .json(schema)
      .send()
      .await?;
    Self::expect_success(resp, "POST", "/collections").await?;
    Ok(true)
  }

  async fn upsert_documents(&self, documents: &[SearchDocument]) -> Result<()> {
    if documents.is_empty() {
      return Ok(());
    }

    let path = self.documents_path("/import");
    let body = document::to_jsonl(documents)?;
    let resp = self
      .request(reqwest::Method::POST, &path)
      .query(&[("action", "upsert")])
      .header(reqwest::header::CONTENT_TYPE, "text/plain")
      .body(body)
      .send()
      .await?;
    let resp = Self::expect_success(resp, "POST", &path).await?;
    check_import(&resp.text().await?, documents.len())
  }

  async fn delete_documents(&self, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
      return Ok(());
    }

    let path = self.documents_path("");
    let resp = self
      .request(reqwest::Method::DELETE, &path)
      .query(&[("filter_by", id_filter(ids))])
      .send()
      .await?;
    Self::expect_success(resp, "DELETE", &path).await?;
    Ok(())
  }

  async fn document_ids(&self) -> Result<Vec<String>> {
    let path = self.documents_path("/export");
    let resp = self
      .request(reqwest::Method::GET, &path)
      .query(&[("include_fields", "id")])
      .send()
      .await?;
    let resp = Self::expect_success(resp, "GET", &path).await?;
    parse_export(&resp.text().await?)
  }

  async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
    let path = self.documents_path("/search");
    let mut params = vec![
      ("q", query.text.clone()),
      ("query_by", "description".to_owned()),
    ];
    if let Some(filter) = query.filter.as_ref().filter(|f| !f.is_empty()) {
      params.push(("filter_by", filter.to_string()));
    }
    if let Some(per_page) = query.per_page {
      params.push(("per_page", per_page.to_string()));
    }

    let resp = self
      .request(reqwest::Method::GET, &path)
      .query(&params)
      .send()
      .await?;
    let resp = Self::expect_success(resp, "GET", &path).await?;
    let parsed: SearchResponse = resp.json().await?;

    Ok(
      parsed
        .hits
        .into_iter()
        .map(|h| SearchHit { document: h.document, score: h.text_match })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn import_success_lines_pass() {
    let body = "{\"success\":true}\n{\"success\":true}\n";
    assert!(check_import(body, 2).is_ok());
  }

  #[test]
  fn any_rejected_line_fails_the_batch() {
    let body = concat!(
      "{\"success\":true}\n",
      "{\"success\":false,\"error\":\"Field `rank` must be an int32.\"}\n",
      "{\"success\":false}\n",
    );
    match check_import(body, 3) {
      Err(Error::ImportRejected { failed, total, first }) => {
        assert_eq!(failed, 2);
        assert_eq!(total, 3);
        assert!(first.contains("rank"));
      }
      other => panic!("expected ImportRejected, got {other:?}"),
    }
  }

  #[test]
  fn export_lines_yield_ids() {
    let body = "{\"id\":\"a-1\"}\n\n{\"id\":\"b-2\"}\n";
    assert_eq!(parse_export(body).unwrap(), vec!["a-1", "b-2"]);
    assert!(matches!(parse_export("{\"rank\":1}"), Err(Error::Json(_))));
  }

  #[test]
  fn id_filter_quotes_each_id() {
    let ids = vec!["a-1".to_owned(), "b-2".to_owned()];
    assert_eq!(id_filter(&ids), "id:[`a-1`,`b-2`]");
  }

  #[test]
  fn search_response_maps_text_match() {
    let json = r#"{"found":1,"hits":[{"text_match":578730123,"document":{
      "id":"x","game":"Tetris","publisher":"Nintendo","rank":5,"platform":"GB",
      "year":1989,"total_sales":30.26,"description":"Tetris (1989) - GB"}}]}"#;
    let parsed: SearchResponse = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.hits.len(), 1);
    assert_eq!(parsed.hits[0].text_match, 578730123);
    assert_eq!(parsed.hits[0].document.game, "Tetris");
  }

  #[test]
  fn config_defaults_collection_and_timeout() {
    let cfg: TypesenseConfig =
      serde_json::from_str(r#"{"url":"http://localhost:8108","api_key":"xyz"}"#).unwrap();
    assert_eq!(cfg.collection, "games_sales");
    assert_eq!(cfg.timeout_secs, 10);
  }
}
