//! [`MemoryIndex`]: an in-process [`SearchIndex`].
//!
//! Mirrors the Typesense behaviour the pipeline relies on: documents are
//! matched by `id` on upsert, document calls before the index's collection
//! exists fail, and hits are ordered by text score then by the default sorting
//! field (`rank`, descending).

use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex, MutexGuard},
};

use vgsales_core::{
  document::{COLLECTION_NAME, CollectionSchema, SearchDocument, SearchHit, SearchQuery},
  store::SearchIndex,
};

use crate::{Error, Result};

/// Typesense's default page size.
const DEFAULT_PER_PAGE: usize = 10;

#[derive(Default)]
struct State {
  /// Created collections, by name.
  schemas:   BTreeMap<String, CollectionSchema>,
  documents: BTreeMap<String, SearchDocument>,
}

/// Cloning is cheap; clones share the same documents.
///
/// Like [`TypesenseIndex`](crate::TypesenseIndex), document calls target one
/// named collection, which [`SearchIndex::ensure_collection`] must have
/// created first.
#[derive(Clone)]
pub struct MemoryIndex {
  collection: String,
  state:      Arc<Mutex<State>>,
}

impl Default for MemoryIndex {
  fn default() -> Self { Self::with_collection(COLLECTION_NAME) }
}

impl MemoryIndex {
  pub fn new() -> Self { Self::default() }

  pub fn with_collection(collection: impl Into<String>) -> Self {
    Self { collection: collection.into(), state: Arc::default() }
  }

  pub fn collection(&self) -> &str { &self.collection }

  /// Every stored document, ordered by id.
  pub fn documents(&self) -> Vec<SearchDocument> {
    self.lock().documents.values().cloned().collect()
  }

  pub fn get(&self, id: &str) -> Option<SearchDocument> {
    self.lock().documents.get(id).cloned()
  }

  pub fn len(&self) -> usize { self.lock().documents.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn require_collection(&self, state: &State) -> Result<()> {
    if state.schemas.contains_key(&self.collection) {
      Ok(())
    } else {
      Err(Error::MissingCollection(self.collection.clone()))
    }
  }
}

/// Score `description` against the query tokens. `None` means no match.
///
/// Every token must prefix-match some word; whole-word matches score higher.
fn score(tokens: &[String], description: &str) -> Option<u64> {
  let words: Vec<String> = description
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(str::to_lowercase)
    .collect();

  let mut total = 0;
  for token in tokens {
    if words.iter().any(|w| w == token) {
      total += 2;
    } else if words.iter().any(|w| w.starts_with(token.as_str())) {
      total += 1;
    } else {
      return None;
    }
  }
  Some(total)
}

impl SearchIndex for MemoryIndex {
  type Error = Error;

  async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<bool> {
    let mut state = self.lock();
    if state.schemas.contains_key(&schema.name) {
      return Ok(false);
    }
    state.schemas.insert(schema.name.clone(), schema.clone());
    Ok(true)
  }

  async fn upsert_documents(&self, documents: &[SearchDocument]) -> Result<()> {
    let mut state = self.lock();
    self.require_collection(&state)?;
    for doc in documents {
      state.documents.insert(doc.id.clone(), doc.clone());
    }
    Ok(())
  }

  async fn delete_documents(&self, ids: &[String]) -> Result<()> {
    let mut state = self.lock();
    self.require_collection(&state)?;
    for id in ids {
      state.documents.remove(id);
    }
    Ok(())
  }

  async fn document_ids(&self) -> Result<Vec<String>> {
    let state = self.lock();
    self.require_collection(&state)?;
    Ok(state.documents.keys().cloned().collect())
  }

  async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
    let state = self.lock();
    self.require_collection(&state)?;

    let text = query.text.trim();
    let tokens: Vec<String> = if text == "*" {
      Vec::new()
    } else {
      text.split_whitespace().map(str::to_lowercase).collect()
    };

    let mut hits: Vec<SearchHit> = state
      .documents
      .values()
      .filter(|doc| query.filter.as_ref().is_none_or(|f| f.matches(doc)))
      .filter_map(|doc| {
        score(&tokens, &doc.description).map(|score| SearchHit { document: doc.clone(), score })
      })
      .collect();

    hits.sort_by(|a, b| {
      b.score
        .cmp(&a.score)
        .then(b.document.rank.cmp(&a.document.rank))
        .then_with(|| a.document.id.cmp(&b.document.id))
    });
    hits.truncate(query.per_page.unwrap_or(DEFAULT_PER_PAGE));
    Ok(hits)
  }
}

#[cfg(test)]
mod tests {
  use vgsales_core::{document::describe, sale::GrainKey};

  use super::*;

  fn doc(game: &str, platform: &str, year: i32, rank: i32) -> SearchDocument {
    SearchDocument {
      id:          GrainKey::new(game, year, platform).document_id(),
      game:        game.into(),
      publisher:   "Nintendo".into(),
      rank,
      platform:    platform.into(),
      year,
      total_sales: 1.0,
      description: describe(game, year, platform),
    }
  }

  async fn index_with(docs: &[SearchDocument]) -> MemoryIndex {
    let index = MemoryIndex::new();
    index.ensure_collection(&CollectionSchema::default()).await.unwrap();
    index.upsert_documents(docs).await.unwrap();
    index
  }

  fn query(text: &str) -> SearchQuery {
    SearchQuery { text: text.into(), ..Default::default() }
  }

  #[tokio::test]
  async fn ensure_collection_is_idempotent() {
    let index = MemoryIndex::new();
    assert!(index.ensure_collection(&CollectionSchema::default()).await.unwrap());
    assert!(!index.ensure_collection(&CollectionSchema::default()).await.unwrap());
  }

  #[tokio::test]
  async fn writes_require_a_collection() {
    let index = MemoryIndex::new();
    let err = index.upsert_documents(&[doc("Tetris", "GB", 1989, 5)]).await;
    assert!(matches!(err, Err(Error::MissingCollection(_))));
  }

  #[tokio::test]
  async fn missing_collection_names_the_configured_collection() {
    let index = MemoryIndex::with_collection("sales_v2");
    index.ensure_collection(&CollectionSchema::default()).await.unwrap();

    match index.search(&query("*")).await {
      Err(Error::MissingCollection(name)) => assert_eq!(name, "sales_v2"),
      other => panic!("expected MissingCollection, got {other:?}"),
    }

    let schema = CollectionSchema::games_sales("sales_v2".to_owned());
    assert!(index.ensure_collection(&schema).await.unwrap());
    assert!(index.search(&query("*")).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn document_ids_lists_every_stored_id() {
    let tetris = doc("Tetris", "GB", 1989, 5);
    let halo = doc("Halo", "XB", 2001, 40);
    let index = index_with(&[tetris.clone(), halo.clone()]).await;

    let mut expected = vec![tetris.id, halo.id];
    expected.sort();
    assert_eq!(index.document_ids().await.unwrap(), expected);
  }

  #[tokio::test]
  async fn upsert_replaces_by_id() {
    let mut first = doc("Tetris", "GB", 1989, 5);
    let index = index_with(&[first.clone()]).await;

    first.total_sales = 30.0;
    index.upsert_documents(&[first.clone()]).await.unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(index.get(&first.id).unwrap().total_sales, 30.0);
  }

  #[tokio::test]
  async fn delete_ignores_unknown_ids() {
    let tetris = doc("Tetris", "GB", 1989, 5);
    let index = index_with(&[tetris.clone()]).await;

    index
      .delete_documents(&[tetris.id.clone(), "nope".into()])
      .await
      .unwrap();
    assert!(index.is_empty());
  }

  #[tokio::test]
  async fn search_matches_prefixes_and_orders_by_rank() {
    let index = index_with(&[
      doc("Super Mario Bros.", "NES", 1985, 1),
      doc("Super Mario Land", "GB", 1989, 20),
      doc("Tetris", "GB", 1989, 5),
    ])
    .await;

    let hits = index.search(&query("mari")).await.unwrap();
    let games: Vec<_> = hits.iter().map(|h| h.document.game.as_str()).collect();
    assert_eq!(games, vec!["Super Mario Land", "Super Mario Bros."]);

    let hits = index.search(&query("tetris gb")).await.unwrap();
    assert_eq!(hits.len(), 1);
  }

  #[tokio::test]
  async fn search_applies_filter_and_wildcard() {
    let index = index_with(&[
      doc("Halo", "XB", 2001, 40),
      doc("Doom", "PC", 1993, 90),
    ])
    .await;

    let q = SearchQuery {
      text:     "*".into(),
      filter:   Some("year :> 2000".parse().unwrap()),
      per_page: None,
    };
    let hits = index.search(&q).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.game, "Halo");
  }

  #[test]
  fn whole_words_outscore_prefixes() {
    let tokens = vec!["mario".to_owned()];
    assert_eq!(score(&tokens, "Super Mario Land (1989) - GB"), Some(2));
    let tokens = vec!["mar".to_owned()];
    assert_eq!(score(&tokens, "Super Mario Land (1989) - GB"), Some(1));
    let tokens = vec!["zelda".to_owned()];
    assert_eq!(score(&tokens, "Super Mario Land (1989) - GB"), None);
  }
}
