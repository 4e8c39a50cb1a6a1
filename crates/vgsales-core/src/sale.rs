//! Raw sales records: the flat, source-shaped rows the pipeline ingests.
//!
//! A raw record is one observed sale entry. It is owned by the raw store,
//! mutable in place (except for its id), and never deleted implicitly by the
//! pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Grain ───────────────────────────────────────────────────────────────────

/// The `(name, year, platform)` tuple that identifies one fact row.
///
/// The raw store may hold several physical rows with the same grain; the
/// pipeline aggregates them before building a fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrainKey {
  pub name:     String,
  pub year:     i32,
  pub platform: String,
}

/// Namespace for grain-derived document ids (UUID v5).
const GRAIN_NAMESPACE: Uuid = Uuid::from_u128(0x6a1d_3c0e_52f4_4a8b_9d27_e1c4_0b5f_7a93);

impl GrainKey {
  pub fn new(name: impl Into<String>, year: i32, platform: impl Into<String>) -> Self {
    Self { name: name.into(), year, platform: platform.into() }
  }

  /// Stable search-document id for this grain.
  ///
  /// Two documents for the same grain always share an id, so an index upsert
  /// replaces instead of duplicating.
  pub fn document_id(&self) -> String {
    let seed = format!("{}\u{1f}{}\u{1f}{}", self.name, self.platform, self.year);
    Uuid::new_v5(&GRAIN_NAMESPACE, seed.as_bytes())
      .hyphenated()
      .to_string()
  }
}

impl fmt::Display for GrainKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({}) - {}", self.name, self.year, self.platform)
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted raw sale row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSaleRecord {
  pub sale_id:      Uuid,
  pub name:         String,
  pub rank:         i32,
  pub platform:     String,
  pub year:         i32,
  pub genre:        String,
  pub publisher:    String,
  pub na_sales:     f64,
  pub eu_sales:     f64,
  pub jp_sales:     f64,
  pub other_sales:  f64,
  pub global_sales: f64,
}

impl RawSaleRecord {
  pub fn grain(&self) -> GrainKey {
    GrainKey::new(self.name.clone(), self.year, self.platform.clone())
  }

  /// Apply a partial update in place. The id is never touched.
  pub fn apply(&mut self, changes: SaleChanges) {
    let SaleChanges {
      name,
      rank,
      platform,
      year,
      genre,
      publisher,
      na_sales,
      eu_sales,
      jp_sales,
      other_sales,
      global_sales,
    } = changes;

    if let Some(v) = name { self.name = v; }
    if let Some(v) = rank { self.rank = v; }
    if let Some(v) = platform { self.platform = v; }
    if let Some(v) = year { self.year = v; }
    if let Some(v) = genre { self.genre = v; }
    if let Some(v) = publisher { self.publisher = v; }
    if let Some(v) = na_sales { self.na_sales = v; }
    if let Some(v) = eu_sales { self.eu_sales = v; }
    if let Some(v) = jp_sales { self.jp_sales = v; }
    if let Some(v) = other_sales { self.other_sales = v; }
    if let Some(v) = global_sales { self.global_sales = v; }
  }

  /// Drop the identity, keeping only the observed values.
  pub fn to_new(&self) -> NewSale {
    NewSale {
      name:         self.name.clone(),
      rank:         self.rank,
      platform:     self.platform.clone(),
      year:         self.year,
      genre:        self.genre.clone(),
      publisher:    self.publisher.clone(),
      na_sales:     self.na_sales,
      eu_sales:     self.eu_sales,
      jp_sales:     self.jp_sales,
      other_sales:  self.other_sales,
      global_sales: self.global_sales,
    }
  }
}

/// Input to [`RawStore::insert`](crate::store::RawStore::insert); the store
/// assigns the id. Missing sales measures default to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSale {
  pub name:         String,
  pub rank:         i32,
  pub platform:     String,
  pub year:         i32,
  pub genre:        String,
  pub publisher:    String,
  #[serde(default)]
  pub na_sales:     f64,
  #[serde(default)]
  pub eu_sales:     f64,
  #[serde(default)]
  pub jp_sales:     f64,
  #[serde(default)]
  pub other_sales:  f64,
  #[serde(default)]
  pub global_sales: f64,
}

impl NewSale {
  pub fn grain(&self) -> GrainKey {
    GrainKey::new(self.name.clone(), self.year, self.platform.clone())
  }

  pub fn with_id(self, sale_id: Uuid) -> RawSaleRecord {
    RawSaleRecord {
      sale_id,
      name:         self.name,
      rank:         self.rank,
      platform:     self.platform,
      year:         self.year,
      genre:        self.genre,
      publisher:    self.publisher,
      na_sales:     self.na_sales,
      eu_sales:     self.eu_sales,
      jp_sales:     self.jp_sales,
      other_sales:  self.other_sales,
      global_sales: self.global_sales,
    }
  }
}

/// A partial update: every `Some` field overwrites the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleChanges {
  pub name:         Option<String>,
  pub rank:         Option<i32>,
  pub platform:     Option<String>,
  pub year:         Option<i32>,
  pub genre:        Option<String>,
  pub publisher:    Option<String>,
  pub na_sales:     Option<f64>,
  pub eu_sales:     Option<f64>,
  pub jp_sales:     Option<f64>,
  pub other_sales:  Option<f64>,
  pub global_sales: Option<f64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record() -> RawSaleRecord {
    NewSale {
      name:         "Minecraft 2".into(),
      rank:         1,
      platform:     "PC".into(),
      year:         2030,
      genre:        "Sandbox".into(),
      publisher:    "Mojang".into(),
      na_sales:     1.0,
      eu_sales:     1.0,
      jp_sales:     1.0,
      other_sales:  1.0,
      global_sales: 4.0,
    }
    .with_id(Uuid::new_v4())
  }

  #[test]
  fn apply_only_touches_given_fields() {
    let mut r = record();
    let id = r.sale_id;
    r.apply(SaleChanges { year: Some(2031), ..Default::default() });

    assert_eq!(r.sale_id, id);
    assert_eq!(r.year, 2031);
    assert_eq!(r.name, "Minecraft 2");
    assert_eq!(r.global_sales, 4.0);
  }

  #[test]
  fn document_id_is_stable_per_grain() {
    let a = GrainKey::new("Tetris", 1989, "GB");
    let b = GrainKey::new("Tetris", 1989, "GB");
    let c = GrainKey::new("Tetris", 1989, "NES");
    assert_eq!(a.document_id(), b.document_id());
    assert_ne!(a.document_id(), c.document_id());
  }

  #[test]
  fn new_sale_defaults_missing_measures() {
    let json = r#"{"name":"Pong","rank":9,"platform":"2600","year":1977,
                   "genre":"Sports","publisher":"Atari"}"#;
    let sale: NewSale = serde_json::from_str(json).unwrap();
    assert_eq!(sale.na_sales, 0.0);
    assert_eq!(sale.global_sales, 0.0);
  }

  #[test]
  fn grain_display_matches_description_shape() {
    assert_eq!(record().grain().to_string(), "Minecraft 2 (2030) - PC");
  }
}
