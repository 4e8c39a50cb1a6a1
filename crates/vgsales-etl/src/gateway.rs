//! Index sync gateway: batch pushes to the search index.
//!
//! Both calls return the index's own error untouched; the orchestrator decides
//! whether that failure leaves the warehouse ahead of the index.

use tracing::debug;
use vgsales_core::{document::SearchDocument, store::SearchIndex};

/// Upsert `documents` as one batch. An empty batch is a no-op.
pub async fn upsert<I: SearchIndex>(index: &I, documents: &[SearchDocument]) -> Result<(), I::Error> {
  if documents.is_empty() {
    return Ok(());
  }
  index.upsert_documents(documents).await?;
  debug!(count = documents.len(), "upserted search documents");
  Ok(())
}

/// Remove documents by id. An empty list is a no-op.
pub async fn delete<I: SearchIndex>(index: &I, ids: &[String]) -> Result<(), I::Error> {
  if ids.is_empty() {
    return Ok(());
  }
  index.delete_documents(ids).await?;
  debug!(count = ids.len(), "deleted search documents");
  Ok(())
}
