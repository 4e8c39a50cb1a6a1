//! [`SqliteWarehouse`]: the SQLite implementation of [`WarehouseStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;
use vgsales_core::{
  sale::GrainKey,
  store::WarehouseStore,
  warehouse::{
    DimGame, DimPlatform, DimYear, FactKey, FactSales, GameKey, WarehouseCounts,
  },
};

use crate::{
  Result,
  encode::{RawFact, RawGame, RawPlatform, RawYear, decode_count, encode_uuid},
  schema::{PRAGMAS, WAREHOUSE_DROP, WAREHOUSE_SCHEMA},
};

const GAME_COLUMNS: &str = "game_id, name, genre, publisher, rank";
const FACT_COLUMNS: &str = "f.game_id, f.platform_id, f.year_id, f.total_sales";

/// The star schema backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory warehouse: useful for testing.
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
        conn.execute_batch(WAREHOUSE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_facts(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<FactSales>> {
    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawFact::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  async fn count(&self, table: &'static str) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    decode_count(n)
  }
}

impl WarehouseStore for SqliteWarehouse {
  type Error = crate::Error;

  async fn truncate_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(WAREHOUSE_DROP)?;
        tx.execute_batch(WAREHOUSE_SCHEMA)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!("warehouse tables dropped and recreated");
    Ok(())
  }

  // ── Games ─────────────────────────────────────────────────────────────────

  async fn find_game(&self, key: &GameKey) -> Result<Option<DimGame>> {
    let key = key.clone();

    let raw: Option<RawGame> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {GAME_COLUMNS} FROM dim_game
                 WHERE name = ?1 AND genre = ?2 AND publisher = ?3 AND rank = ?4"
              ),
              rusqlite::params![key.name, key.genre, key.publisher, key.rank],
              RawGame::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGame::into_game).transpose()
  }

  async fn insert_game(&self, game: &DimGame) -> Result<()> {
    let id_str = encode_uuid(game.game_id);
    let game = game.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO dim_game (game_id, name, genre, publisher, rank)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, game.name, game.genre, game.publisher, game.rank],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_game(&self, id: Uuid) -> Result<Option<DimGame>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGame> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GAME_COLUMNS} FROM dim_game WHERE game_id = ?1"),
              rusqlite::params![id_str],
              RawGame::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGame::into_game).transpose()
  }

  async fn list_games(&self) -> Result<Vec<DimGame>> {
    let raws: Vec<RawGame> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {GAME_COLUMNS} FROM dim_game"))?;
        let rows = stmt
          .query_map([], RawGame::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGame::into_game).collect()
  }

  // ── Platforms ─────────────────────────────────────────────────────────────

  async fn find_platform(&self, name: &str) -> Result<Option<DimPlatform>> {
    let name = name.to_owned();

    let raw: Option<RawPlatform> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT platform_id, name FROM dim_platform WHERE name = ?1",
              rusqlite::params![name],
              RawPlatform::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlatform::into_platform).transpose()
  }

  async fn insert_platform(&self, platform: &DimPlatform) -> Result<()> {
    let id_str = encode_uuid(platform.platform_id);
    let name = platform.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO dim_platform (platform_id, name) VALUES (?1, ?2)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_platform(&self, id: Uuid) -> Result<Option<DimPlatform>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPlatform> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT platform_id, name FROM dim_platform WHERE platform_id = ?1",
              rusqlite::params![id_str],
              RawPlatform::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlatform::into_platform).transpose()
  }

  async fn list_platforms(&self) -> Result<Vec<DimPlatform>> {
    let raws: Vec<RawPlatform> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT platform_id, name FROM dim_platform")?;
        let rows = stmt
          .query_map([], RawPlatform::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlatform::into_platform).collect()
  }

  // ── Years ─────────────────────────────────────────────────────────────────

  async fn find_year(&self, year: i32) -> Result<Option<DimYear>> {
    let raw: Option<RawYear> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT year_id, year FROM dim_year WHERE year = ?1",
              rusqlite::params![year],
              RawYear::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawYear::into_year).transpose()
  }

  async fn insert_year(&self, year: &DimYear) -> Result<()> {
    let id_str = encode_uuid(year.year_id);
    let value = year.year;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO dim_year (year_id, year) VALUES (?1, ?2)",
          rusqlite::params![id_str, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_year(&self, id: Uuid) -> Result<Option<DimYear>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawYear> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT year_id, year FROM dim_year WHERE year_id = ?1",
              rusqlite::params![id_str],
              RawYear::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawYear::into_year).transpose()
  }

  async fn list_years(&self) -> Result<Vec<DimYear>> {
    let raws: Vec<RawYear> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT year_id, year FROM dim_year")?;
        let rows = stmt
          .query_map([], RawYear::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawYear::into_year).collect()
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn put_fact(&self, fact: &FactSales) -> Result<()> {
    let game_id     = encode_uuid(fact.game_id);
    let platform_id = encode_uuid(fact.platform_id);
    let year_id     = encode_uuid(fact.year_id);
    let total_sales = fact.total_sales;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO fact_sales (game_id, platform_id, year_id, total_sales)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (game_id, platform_id, year_id)
           DO UPDATE SET total_sales = excluded.total_sales",
          rusqlite::params![game_id, platform_id, year_id, total_sales],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_fact(&self, key: FactKey) -> Result<Option<FactSales>> {
    let mut facts = self
      .query_facts(
        format!(
          "SELECT {FACT_COLUMNS} FROM fact_sales f
           WHERE f.game_id = ?1 AND f.platform_id = ?2 AND f.year_id = ?3"
        ),
        vec![
          encode_uuid(key.game_id).into(),
          encode_uuid(key.platform_id).into(),
          encode_uuid(key.year_id).into(),
        ],
      )
      .await?;
    Ok(facts.pop())
  }

  async fn list_facts(&self) -> Result<Vec<FactSales>> {
    self
      .query_facts(format!("SELECT {FACT_COLUMNS} FROM fact_sales f"), vec![])
      .await
  }

  async fn facts_for_grain(&self, grain: &GrainKey) -> Result<Vec<FactSales>> {
    self
      .query_facts(
        format!(
          "SELECT {FACT_COLUMNS}
           FROM fact_sales f
           JOIN dim_game     g ON g.game_id     = f.game_id
           JOIN dim_platform p ON p.platform_id = f.platform_id
           JOIN dim_year     y ON y.year_id     = f.year_id
           WHERE g.name = ?1 AND p.name = ?2 AND y.year = ?3"
        ),
        vec![
          grain.name.clone().into(),
          grain.platform.clone().into(),
          i64::from(grain.year).into(),
        ],
      )
      .await
  }

  async fn delete_fact(&self, key: FactKey) -> Result<bool> {
    let game_id     = encode_uuid(key.game_id);
    let platform_id = encode_uuid(key.platform_id);
    let year_id     = encode_uuid(key.year_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM fact_sales
           WHERE game_id = ?1 AND platform_id = ?2 AND year_id = ?3",
          rusqlite::params![game_id, platform_id, year_id],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn counts(&self) -> Result<WarehouseCounts> {
    Ok(WarehouseCounts {
      games:     self.count("dim_game").await?,
      platforms: self.count("dim_platform").await?,
      years:     self.count("dim_year").await?,
      facts:     self.count("fact_sales").await?,
    })
  }
}
