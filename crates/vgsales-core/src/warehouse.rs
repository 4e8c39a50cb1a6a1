//! Star-schema types: three dimensions and the sales fact table.
//!
//! Dimension rows carry a surrogate id (no business meaning, used for joins)
//! and a natural key (the business value that identifies them). Exactly one
//! row exists per natural key; rows are created lazily by the resolver and are
//! never updated afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sale::NewSale;

// ─── Dimension kinds ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
  Game,
  Platform,
  Year,
}

impl fmt::Display for DimensionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Game => "game",
      Self::Platform => "platform",
      Self::Year => "year",
    })
  }
}

// ─── Natural keys ────────────────────────────────────────────────────────────

/// Natural key of [`DimGame`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameKey {
  pub name:      String,
  pub genre:     String,
  pub publisher: String,
  pub rank:      i32,
}

impl GameKey {
  pub fn of(record: &NewSale) -> Self {
    Self {
      name:      record.name.clone(),
      genre:     record.genre.clone(),
      publisher: record.publisher.clone(),
      rank:      record.rank,
    }
  }
}

/// Any dimension's natural key, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum DimensionKey {
  Game(GameKey),
  Platform(String),
  Year(i32),
}

impl DimensionKey {
  pub fn kind(&self) -> DimensionKind {
    match self {
      Self::Game(_) => DimensionKind::Game,
      Self::Platform(_) => DimensionKind::Platform,
      Self::Year(_) => DimensionKind::Year,
    }
  }
}

// ─── Dimension rows ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimGame {
  pub game_id:   Uuid,
  pub name:      String,
  pub genre:     String,
  pub publisher: String,
  pub rank:      i32,
}

impl DimGame {
  pub fn new(key: GameKey) -> Self {
    Self {
      game_id:   Uuid::new_v4(),
      name:      key.name,
      genre:     key.genre,
      publisher: key.publisher,
      rank:      key.rank,
    }
  }

  pub fn key(&self) -> GameKey {
    GameKey {
      name:      self.name.clone(),
      genre:     self.genre.clone(),
      publisher: self.publisher.clone(),
      rank:      self.rank,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimPlatform {
  pub platform_id: Uuid,
  pub name:        String,
}

impl DimPlatform {
  pub fn new(name: impl Into<String>) -> Self {
    Self { platform_id: Uuid::new_v4(), name: name.into() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimYear {
  pub year_id: Uuid,
  pub year:    i32,
}

impl DimYear {
  pub fn new(year: i32) -> Self { Self { year_id: Uuid::new_v4(), year } }
}

/// A resolved dimension row of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Dimension {
  Game(DimGame),
  Platform(DimPlatform),
  Year(DimYear),
}

impl Dimension {
  pub fn id(&self) -> Uuid {
    match self {
      Self::Game(g) => g.game_id,
      Self::Platform(p) => p.platform_id,
      Self::Year(y) => y.year_id,
    }
  }

  pub fn kind(&self) -> DimensionKind {
    match self {
      Self::Game(_) => DimensionKind::Game,
      Self::Platform(_) => DimensionKind::Platform,
      Self::Year(_) => DimensionKind::Year,
    }
  }
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// Primary key of the fact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactKey {
  pub game_id:     Uuid,
  pub platform_id: Uuid,
  pub year_id:     Uuid,
}

impl fmt::Display for FactKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}", self.game_id, self.platform_id, self.year_id)
  }
}

/// One measurement at the (game, platform, year) grain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSales {
  pub game_id:     Uuid,
  pub platform_id: Uuid,
  pub year_id:     Uuid,
  pub total_sales: f64,
}

impl FactSales {
  pub fn key(&self) -> FactKey {
    FactKey {
      game_id:     self.game_id,
      platform_id: self.platform_id,
      year_id:     self.year_id,
    }
  }
}

/// Row counts of the whole warehouse, used by rebuild reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseCounts {
  pub games:     usize,
  pub platforms: usize,
  pub years:     usize,
  pub facts:     usize,
}
