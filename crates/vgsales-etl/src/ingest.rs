//! Ingestion: aggregate flat source rows, then store one raw row per grain.

use serde::Serialize;
use tracing::info;
use vgsales_core::{
  sale::NewSale,
  store::{RawStore, SearchIndex, WarehouseStore},
};

use crate::{Error, Pipeline, Result, aggregate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
  /// Source rows handed to [`Pipeline::ingest`].
  pub received: usize,
  /// Raw rows written, one per distinct grain.
  pub stored:   usize,
}

impl<R, W, I> Pipeline<R, W, I>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  /// Collapse duplicate grains and insert the result into the raw store.
  ///
  /// Touches neither the warehouse nor the index; follow with a rebuild or a
  /// full sync.
  pub async fn ingest(&self, rows: Vec<NewSale>) -> Result<IngestReport> {
    let received = rows.len();
    let grains = aggregate(rows);

    for row in &grains {
      self.raw().insert(row.clone()).await.map_err(Error::raw)?;
    }

    let report = IngestReport { received, stored: grains.len() };
    info!(received, stored = report.stored, "ingested raw sales");
    Ok(report)
  }
}
