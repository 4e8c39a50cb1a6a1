//! Fact → search document projection.

use vgsales_core::{
  document::SearchDocument,
  store::WarehouseStore,
  warehouse::{DimensionKind, FactSales},
};

use crate::{Error, Result};

/// Read the fact's three dimensions and flatten them into a document.
///
/// A missing dimension is reported as [`Error::DanglingFact`].
pub async fn project<W: WarehouseStore>(store: &W, fact: &FactSales) -> Result<SearchDocument> {
  let dangling = |kind| Error::DanglingFact { key: fact.key(), kind };

  let game = store
    .get_game(fact.game_id)
    .await
    .map_err(Error::warehouse)?
    .ok_or_else(|| dangling(DimensionKind::Game))?;
  let platform = store
    .get_platform(fact.platform_id)
    .await
    .map_err(Error::warehouse)?
    .ok_or_else(|| dangling(DimensionKind::Platform))?;
  let year = store
    .get_year(fact.year_id)
    .await
    .map_err(Error::warehouse)?
    .ok_or_else(|| dangling(DimensionKind::Year))?;

  Ok(SearchDocument::from_parts(fact, &game, &platform, &year))
}

pub async fn project_all<W: WarehouseStore>(
  store: &W,
  facts: &[FactSales],
) -> Result<Vec<SearchDocument>> {
  let mut documents = Vec::with_capacity(facts.len());
  for fact in facts {
    documents.push(project(store, fact).await?);
  }
  Ok(documents)
}
