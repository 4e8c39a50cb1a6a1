//! Dimension resolution: the only way to obtain a dimension row.
//!
//! Each resolver looks the natural key up explicitly and inserts a new row
//! only when none exists, so repeated calls with the same key always return
//! the same surrogate id.

use tracing::debug;
use vgsales_core::{
  store::WarehouseStore,
  warehouse::{DimGame, DimPlatform, DimYear, Dimension, DimensionKey, GameKey},
};

use crate::{Error, Result};

pub async fn resolve_game<W: WarehouseStore>(store: &W, key: &GameKey) -> Result<DimGame> {
  if let Some(game) = store.find_game(key).await.map_err(Error::warehouse)? {
    return Ok(game);
  }

  let game = DimGame::new(key.clone());
  store.insert_game(&game).await.map_err(Error::warehouse)?;
  debug!(name = %game.name, rank = game.rank, id = %game.game_id, "created game dimension");
  Ok(game)
}

pub async fn resolve_platform<W: WarehouseStore>(store: &W, name: &str) -> Result<DimPlatform> {
  if let Some(platform) = store.find_platform(name).await.map_err(Error::warehouse)? {
    return Ok(platform);
  }

  let platform = DimPlatform::new(name);
  store.insert_platform(&platform).await.map_err(Error::warehouse)?;
  debug!(name, id = %platform.platform_id, "created platform dimension");
  Ok(platform)
}

pub async fn resolve_year<W: WarehouseStore>(store: &W, year: i32) -> Result<DimYear> {
  if let Some(found) = store.find_year(year).await.map_err(Error::warehouse)? {
    return Ok(found);
  }

  let created = DimYear::new(year);
  store.insert_year(&created).await.map_err(Error::warehouse)?;
  debug!(year, id = %created.year_id, "created year dimension");
  Ok(created)
}

/// Resolve any dimension kind from its tagged natural key.
pub async fn resolve<W: WarehouseStore>(store: &W, key: &DimensionKey) -> Result<Dimension> {
  Ok(match key {
    DimensionKey::Game(k) => Dimension::Game(resolve_game(store, k).await?),
    DimensionKey::Platform(name) => Dimension::Platform(resolve_platform(store, name).await?),
    DimensionKey::Year(year) => Dimension::Year(resolve_year(store, *year).await?),
  })
}
