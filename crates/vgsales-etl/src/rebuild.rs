//! Full warehouse rebuild from the raw store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use vgsales_core::{
  store::{RawStore, SearchIndex, WarehouseStore},
  warehouse::WarehouseCounts,
};

use crate::{Error, Pipeline, Result, aggregate, build_fact};

/// Proof that the caller meant to drop the warehouse.
///
/// [`Pipeline::rebuild`] cannot be called without one, and the only way to
/// obtain one is [`ConfirmTruncate::confirmed`].
#[derive(Debug)]
pub struct ConfirmTruncate(());

impl ConfirmTruncate {
  pub fn confirmed() -> Self { Self(()) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildReport {
  /// Physical rows read from the raw store.
  pub raw_rows:    usize,
  /// Distinct grains after aggregation; equals the facts written.
  pub grains:      usize,
  /// Table sizes after the rebuild.
  pub counts:      WarehouseCounts,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

impl<R, W, I> Pipeline<R, W, I>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  /// Drop every warehouse table and rebuild it from the raw store.
  ///
  /// The search index is left alone; follow with [`Pipeline::sync`] and no id
  /// to refresh it.
  pub async fn rebuild(&self, _confirm: ConfirmTruncate) -> Result<RebuildReport> {
    let started_at = Utc::now();
    warn!("truncating warehouse for rebuild");
    self.warehouse().truncate_all().await.map_err(Error::warehouse)?;

    let rows = self.raw().list_all().await.map_err(Error::raw)?;
    let raw_rows = rows.len();
    let grains = aggregate(rows.iter().map(|r| r.to_new()));

    for record in &grains {
      let fact = build_fact(self.warehouse(), record).await?;
      self.warehouse().put_fact(&fact).await.map_err(Error::warehouse)?;
    }

    let counts = self.warehouse().counts().await.map_err(Error::warehouse)?;
    let report = RebuildReport {
      raw_rows,
      grains: grains.len(),
      counts,
      started_at,
      finished_at: Utc::now(),
    };

    info!(
      raw_rows,
      facts = counts.facts,
      games = counts.games,
      platforms = counts.platforms,
      years = counts.years,
      "rebuilt warehouse"
    );
    Ok(report)
  }
}
