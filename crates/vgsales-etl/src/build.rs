//! Fact construction for one logical (already aggregated) record.

use vgsales_core::{
  sale::NewSale,
  store::WarehouseStore,
  warehouse::{FactSales, GameKey},
};

use crate::{
  Result,
  resolve::{resolve_game, resolve_platform, resolve_year},
};

/// Resolve the record's three dimensions and bind a fact to them.
///
/// `total_sales` is the record's `global_sales`. The fact is not persisted and
/// the input is not deduplicated; run [`aggregate`](crate::aggregate) first.
pub async fn build_fact<W: WarehouseStore>(store: &W, record: &NewSale) -> Result<FactSales> {
  let game     = resolve_game(store, &GameKey::of(record)).await?;
  let platform = resolve_platform(store, &record.platform).await?;
  let year     = resolve_year(store, record.year).await?;

  Ok(FactSales {
    game_id:     game.game_id,
    platform_id: platform.platform_id,
    year_id:     year.year_id,
    total_sales: record.global_sales,
  })
}
