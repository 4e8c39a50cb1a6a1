//! Incremental sync: raw store → warehouse → search index.
//!
//! Every sync works on whole grains. The raw rows sharing a grain are
//! aggregated, written as one fact, and any other fact left behind for that
//! grain (an older game dimension after a genre or rank edit) is retired. A
//! grain with no raw rows left has its fact and document removed.
//!
//! A full sync also sweeps: facts whose grain has no raw rows are retired, and
//! index documents without a fact behind them are deleted. After it the index
//! holds exactly the projection of the fact table.
//!
//! The warehouse write always happens first. If the index push then fails the
//! result is [`Error::IndexStale`], never a plain error: the caller must know
//! the warehouse already moved.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use vgsales_core::{
  document::SearchDocument,
  sale::{GrainKey, NewSale},
  store::{RawStore, SearchIndex, WarehouseStore},
  warehouse::FactSales,
};

use crate::{
  Error, Pipeline, Result, aggregate, build_fact, gateway,
  project::{project, project_all},
};

/// What a sync was asked to cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum SyncScope {
  All,
  Record { id: Uuid },
  Grain { grain: GrainKey },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
  pub scope:              SyncScope,
  /// Facts inserted or replaced.
  pub facts_written:      usize,
  /// Facts removed because their grain moved to another game row or lost
  /// all of its raw rows.
  pub facts_retired:      usize,
  pub documents_upserted: usize,
  pub documents_deleted:  usize,
  pub started_at:         DateTime<Utc>,
  pub finished_at:        DateTime<Utc>,
}

impl SyncReport {
  fn begin(scope: SyncScope) -> Self {
    Self {
      scope,
      facts_written: 0,
      facts_retired: 0,
      documents_upserted: 0,
      documents_deleted: 0,
      started_at: Utc::now(),
      finished_at: Utc::now(),
    }
  }

  fn committed(&self) -> usize { self.facts_written + self.facts_retired }

  fn finish(mut self) -> Self {
    self.finished_at = Utc::now();
    info!(
      scope = ?self.scope,
      written = self.facts_written,
      retired = self.facts_retired,
      upserted = self.documents_upserted,
      deleted = self.documents_deleted,
      "sync complete"
    );
    self
  }
}

/// Outcome of writing one grain to the warehouse.
enum GrainWrite {
  Written(FactSales),
  Emptied,
}

impl<R, W, I> Pipeline<R, W, I>
where
  R: RawStore,
  W: WarehouseStore,
  I: SearchIndex,
{
  /// Bring the warehouse and index up to date with the raw store.
  ///
  /// With an id, only that record's grain is touched; an unknown id is
  /// [`Error::SaleNotFound`]. Without one, every grain is rewritten, orphaned
  /// facts and documents are removed, and the whole fact table is pushed to
  /// the index.
  pub async fn sync(&self, id: Option<Uuid>) -> Result<SyncReport> {
    match id {
      Some(id) => self.sync_record(id).await,
      None => self.sync_all().await,
    }
  }

  /// Recompute one grain from whatever raw rows it still has.
  ///
  /// Used after a delete, or after an update moved a record away from
  /// `grain`.
  pub async fn resync_grain(&self, grain: &GrainKey) -> Result<SyncReport> {
    let mut report = SyncReport::begin(SyncScope::Grain { grain: grain.clone() });
    let outcome = self.write_grain(grain, &mut report).await?;
    self.propagate(grain, outcome, &mut report).await?;
    Ok(report.finish())
  }

  async fn sync_record(&self, id: Uuid) -> Result<SyncReport> {
    let record = self
      .raw()
      .get(id)
      .await
      .map_err(Error::raw)?
      .ok_or(Error::SaleNotFound(id))?;
    let grain = record.grain();

    let mut report = SyncReport::begin(SyncScope::Record { id });
    let outcome = self.write_grain(&grain, &mut report).await?;
    self.propagate(&grain, outcome, &mut report).await?;
    Ok(report.finish())
  }

  async fn sync_all(&self) -> Result<SyncReport> {
    let mut report = SyncReport::begin(SyncScope::All);

    let rows = self.raw().list_all().await.map_err(Error::raw)?;
    let mut written = HashSet::new();
    for record in aggregate(rows.iter().map(|r| r.to_new())) {
      written.insert(self.write_record(&record, &mut report).await?.key());
    }

    let (facts, orphans): (Vec<_>, Vec<_>) = self
      .warehouse()
      .list_facts()
      .await
      .map_err(Error::warehouse)?
      .into_iter()
      .partition(|f| written.contains(&f.key()));
    for orphan in &orphans {
      self.retire(orphan, &mut report).await?;
    }

    let documents = project_all(self.warehouse(), &facts).await?;
    self.push(&documents, &mut report).await?;
    self.sweep(&documents, &mut report).await?;
    Ok(report.finish())
  }

  // ─── Warehouse side ──────────────────────────────────────────────────────

  async fn write_grain(&self, grain: &GrainKey, report: &mut SyncReport) -> Result<GrainWrite> {
    let rows = self.raw().list_by_grain(grain).await.map_err(Error::raw)?;

    match aggregate(rows.iter().map(|r| r.to_new())).into_iter().next() {
      Some(record) => Ok(GrainWrite::Written(self.write_record(&record, report).await?)),
      None => {
        for fact in self.facts_for(grain).await? {
          self.retire(&fact, report).await?;
        }
        Ok(GrainWrite::Emptied)
      }
    }
  }

  /// Write the fact for an aggregated record and retire every other fact of
  /// the same grain.
  async fn write_record(&self, record: &NewSale, report: &mut SyncReport) -> Result<FactSales> {
    let fact = build_fact(self.warehouse(), record).await?;
    self.warehouse().put_fact(&fact).await.map_err(Error::warehouse)?;
    report.facts_written += 1;

    for stale in self.facts_for(&record.grain()).await? {
      if stale.key() != fact.key() {
        self.retire(&stale, report).await?;
      }
    }
    Ok(fact)
  }

  async fn facts_for(&self, grain: &GrainKey) -> Result<Vec<FactSales>> {
    self.warehouse().facts_for_grain(grain).await.map_err(Error::warehouse)
  }

  async fn retire(&self, fact: &FactSales, report: &mut SyncReport) -> Result<()> {
    if self.warehouse().delete_fact(fact.key()).await.map_err(Error::warehouse)? {
      report.facts_retired += 1;
    }
    Ok(())
  }

  // ─── Index side ──────────────────────────────────────────────────────────

  async fn propagate(
    &self,
    grain: &GrainKey,
    outcome: GrainWrite,
    report: &mut SyncReport,
  ) -> Result<()> {
    match outcome {
      GrainWrite::Written(fact) => {
        let document = project(self.warehouse(), &fact).await?;
        self.push(std::slice::from_ref(&document), report).await
      }
      GrainWrite::Emptied => {
        let ids = [grain.document_id()];
        gateway::delete(self.index(), &ids)
          .await
          .map_err(|e| stale(report, e))?;
        report.documents_deleted += ids.len();
        Ok(())
      }
    }
  }

  /// Delete every index document that is not in `keep`.
  async fn sweep(&self, keep: &[SearchDocument], report: &mut SyncReport) -> Result<()> {
    let keep: HashSet<&str> = keep.iter().map(|d| d.id.as_str()).collect();
    let orphans: Vec<String> = self
      .index()
      .document_ids()
      .await
      .map_err(|e| stale(report, e))?
      .into_iter()
      .filter(|id| !keep.contains(id.as_str()))
      .collect();

    gateway::delete(self.index(), &orphans)
      .await
      .map_err(|e| stale(report, e))?;
    report.documents_deleted += orphans.len();
    Ok(())
  }

  async fn push(&self, documents: &[SearchDocument], report: &mut SyncReport) -> Result<()> {
    gateway::upsert(self.index(), documents)
      .await
      .map_err(|e| stale(report, e))?;
    report.documents_upserted += documents.len();
    Ok(())
  }
}

fn stale(report: &SyncReport, e: impl std::error::Error + Send + Sync + 'static) -> Error {
  let committed = report.committed();
  warn!(committed, error = %e, "warehouse committed but search index push failed");
  Error::IndexStale { committed, source: Box::new(e) }
}
