//! [`SqliteRawStore`]: the SQLite implementation of [`RawStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use vgsales_core::{
  sale::{GrainKey, NewSale, RawSaleRecord, SaleChanges},
  store::RawStore,
};

use crate::{
  Result,
  encode::{RawSaleRow, SALE_COLUMNS, encode_limit, encode_uuid, read_new_sale},
  schema::{PRAGMAS, RAW_SCHEMA},
};

/// Raw sale rows backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteRawStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteRawStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(RAW_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_sales(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<RawSaleRecord>> {
    let rows: Vec<RawSaleRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawSaleRow::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(RawSaleRow::into_record).collect()
  }
}

impl RawStore for SqliteRawStore {
  type Error = crate::Error;

  async fn insert(&self, sale: NewSale) -> Result<RawSaleRecord> {
    let record = sale.with_id(Uuid::new_v4());
    let id_str = encode_uuid(record.sale_id);
    let row = record.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO history (
             sale_id, name, rank, platform, year, genre, publisher,
             na_sales, eu_sales, jp_sales, other_sales, global_sales
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            row.name,
            row.rank,
            row.platform,
            row.year,
            row.genre,
            row.publisher,
            row.na_sales,
            row.eu_sales,
            row.jp_sales,
            row.other_sales,
            row.global_sales,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get(&self, id: Uuid) -> Result<Option<RawSaleRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSaleRow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SALE_COLUMNS} FROM history WHERE sale_id = ?1"),
              rusqlite::params![id_str],
              RawSaleRow::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSaleRow::into_record).transpose()
  }

  async fn list_all(&self) -> Result<Vec<RawSaleRecord>> {
    self
      .query_sales(format!("SELECT {SALE_COLUMNS} FROM history ORDER BY seq"), vec![])
      .await
  }

  async fn list_sample(&self, limit: usize) -> Result<Vec<RawSaleRecord>> {
    self
      .query_sales(
        format!("SELECT {SALE_COLUMNS} FROM history ORDER BY seq LIMIT ?1"),
        vec![encode_limit(limit).into()],
      )
      .await
  }

  async fn list_by_grain(&self, grain: &GrainKey) -> Result<Vec<RawSaleRecord>> {
    self
      .query_sales(
        format!(
          "SELECT {SALE_COLUMNS} FROM history
           WHERE name = ?1 AND year = ?2 AND platform = ?3
           ORDER BY seq"
        ),
        vec![
          grain.name.clone().into(),
          i64::from(grain.year).into(),
          grain.platform.clone().into(),
        ],
      )
      .await
  }

  async fn update(&self, id: Uuid, changes: SaleChanges) -> Result<Option<RawSaleRecord>> {
    let id_str = encode_uuid(id);

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current = tx
          .query_row(
            &format!("SELECT {SALE_COLUMNS} FROM history WHERE sale_id = ?1"),
            rusqlite::params![id_str],
            read_new_sale,
          )
          .optional()?;

        let Some(current) = current else {
          return Ok(None);
        };

        let mut record = current.with_id(id);
        record.apply(changes);

        tx.execute(
          "UPDATE history SET
             name = ?2, rank = ?3, platform = ?4, year = ?5, genre = ?6,
             publisher = ?7, na_sales = ?8, eu_sales = ?9, jp_sales = ?10,
             other_sales = ?11, global_sales = ?12
           WHERE sale_id = ?1",
          rusqlite::params![
            id_str,
            record.name,
            record.rank,
            record.platform,
            record.year,
            record.genre,
            record.publisher,
            record.na_sales,
            record.eu_sales,
            record.jp_sales,
            record.other_sales,
            record.global_sales,
          ],
        )?;
        tx.commit()?;

        Ok(Some(record))
      })
      .await?;

    Ok(updated)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM history WHERE sale_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(removed > 0)
  }
}
