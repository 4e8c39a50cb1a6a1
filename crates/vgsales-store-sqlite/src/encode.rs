//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings. Row mappers read plain
//! column values inside the connection thread; id decoding happens afterwards
//! so it can fail with a typed error.

use rusqlite::Row;
use uuid::Uuid;
use vgsales_core::{
  sale::{NewSale, RawSaleRecord},
  warehouse::{DimGame, DimPlatform, DimYear, FactSales},
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Counts ──────────────────────────────────────────────────────────────────

pub fn encode_limit(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> Result<usize> {
  usize::try_from(n).map_err(|_| Error::Count(n))
}

// ─── Raw sales ───────────────────────────────────────────────────────────────

/// Column list matching [`read_new_sale`] offsets 1.. (offset 0 is the id).
pub const SALE_COLUMNS: &str = "sale_id, name, rank, platform, year, genre, publisher,
   na_sales, eu_sales, jp_sales, other_sales, global_sales";

/// Raw strings read directly from a `history` row.
pub struct RawSaleRow {
  pub sale_id: String,
  pub fields:  NewSale,
}

impl RawSaleRow {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { sale_id: row.get(0)?, fields: read_new_sale(row)? })
  }

  pub fn into_record(self) -> Result<RawSaleRecord> {
    Ok(self.fields.with_id(decode_uuid(&self.sale_id)?))
  }
}

/// Read the non-id columns of a row selected with [`SALE_COLUMNS`].
pub fn read_new_sale(row: &Row<'_>) -> rusqlite::Result<NewSale> {
  Ok(NewSale {
    name:         row.get(1)?,
    rank:         row.get(2)?,
    platform:     row.get(3)?,
    year:         row.get(4)?,
    genre:        row.get(5)?,
    publisher:    row.get(6)?,
    na_sales:     row.get(7)?,
    eu_sales:     row.get(8)?,
    jp_sales:     row.get(9)?,
    other_sales:  row.get(10)?,
    global_sales: row.get(11)?,
  })
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

pub struct RawGame {
  pub game_id:   String,
  pub name:      String,
  pub genre:     String,
  pub publisher: String,
  pub rank:      i32,
}

impl RawGame {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      game_id:   row.get(0)?,
      name:      row.get(1)?,
      genre:     row.get(2)?,
      publisher: row.get(3)?,
      rank:      row.get(4)?,
    })
  }

  pub fn into_game(self) -> Result<DimGame> {
    Ok(DimGame {
      game_id:   decode_uuid(&self.game_id)?,
      name:      self.name,
      genre:     self.genre,
      publisher: self.publisher,
      rank:      self.rank,
    })
  }
}

pub struct RawPlatform {
  pub platform_id: String,
  pub name:        String,
}

impl RawPlatform {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { platform_id: row.get(0)?, name: row.get(1)? })
  }

  pub fn into_platform(self) -> Result<DimPlatform> {
    Ok(DimPlatform { platform_id: decode_uuid(&self.platform_id)?, name: self.name })
  }
}

pub struct RawYear {
  pub year_id: String,
  pub year:    i32,
}

impl RawYear {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { year_id: row.get(0)?, year: row.get(1)? })
  }

  pub fn into_year(self) -> Result<DimYear> {
    Ok(DimYear { year_id: decode_uuid(&self.year_id)?, year: self.year })
  }
}

// ─── Facts ───────────────────────────────────────────────────────────────────

pub struct RawFact {
  pub game_id:     String,
  pub platform_id: String,
  pub year_id:     String,
  pub total_sales: f64,
}

impl RawFact {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      game_id:     row.get(0)?,
      platform_id: row.get(1)?,
      year_id:     row.get(2)?,
      total_sales: row.get(3)?,
    })
  }

  pub fn into_fact(self) -> Result<FactSales> {
    Ok(FactSales {
      game_id:     decode_uuid(&self.game_id)?,
      platform_id: decode_uuid(&self.platform_id)?,
      year_id:     decode_uuid(&self.year_id)?,
      total_sales: self.total_sales,
    })
  }
}
