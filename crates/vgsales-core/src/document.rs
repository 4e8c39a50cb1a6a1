//! The denormalised search document and the collection it lives in.
//!
//! Documents are disposable derived state: recomputed from the warehouse on
//! every sync and only ever written to the external index.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  filter::Filter,
  sale::GrainKey,
  warehouse::{DimGame, DimPlatform, DimYear, FactSales},
};

/// Name of the single collection the pipeline maintains.
pub const COLLECTION_NAME: &str = "games_sales";

// ─── Document ────────────────────────────────────────────────────────────────

/// One fact joined with its three dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
  /// Derived from the grain; see [`GrainKey::document_id`].
  pub id:          String,
  pub game:        String,
  pub publisher:   String,
  pub rank:        i32,
  pub platform:    String,
  pub year:        i32,
  pub total_sales: f64,
  pub description: String,
}

impl SearchDocument {
  /// Pure projection of a fact and its resolved dimensions.
  pub fn from_parts(
    fact: &FactSales,
    game: &DimGame,
    platform: &DimPlatform,
    year: &DimYear,
  ) -> Self {
    let grain = GrainKey::new(game.name.clone(), year.year, platform.name.clone());
    Self {
      id:          grain.document_id(),
      game:        game.name.clone(),
      publisher:   game.publisher.clone(),
      rank:        game.rank,
      platform:    platform.name.clone(),
      year:        year.year,
      total_sales: fact.total_sales,
      description: describe(&game.name, year.year, &platform.name),
    }
  }

  pub fn grain(&self) -> GrainKey {
    GrainKey::new(self.game.clone(), self.year, self.platform.clone())
  }
}

/// `"{game} ({year}) - {platform}"`
pub fn describe(game: &str, year: i32, platform: &str) -> String {
  format!("{game} ({year}) - {platform}")
}

/// Encode documents as newline-delimited JSON, one document per line.
pub fn to_jsonl(documents: &[SearchDocument]) -> Result<String> {
  let mut out = String::new();
  for doc in documents {
    out.push_str(&serde_json::to_string(doc)?);
    out.push('\n');
  }
  Ok(out)
}

// ─── Collection schema ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
  String,
  Int32,
  Float,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionField {
  pub name:  String,
  #[serde(rename = "type")]
  pub kind:  FieldType,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub facet: bool,
}

impl CollectionField {
  fn new(name: &str, kind: FieldType) -> Self {
    Self { name: name.to_owned(), kind, facet: false }
  }

  fn faceted(mut self) -> Self {
    self.facet = true;
    self
  }
}

/// The fixed field schema of the sales collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
  pub name:                  String,
  pub fields:                Vec<CollectionField>,
  pub default_sorting_field: String,
}

impl CollectionSchema {
  pub fn games_sales(name: impl Into<String>) -> Self {
    Self {
      name:                  name.into(),
      fields:                vec![
        CollectionField::new("game", FieldType::String),
        CollectionField::new("publisher", FieldType::String),
        CollectionField::new("rank", FieldType::Int32),
        CollectionField::new("platform", FieldType::String),
        CollectionField::new("year", FieldType::Int32).faceted(),
        CollectionField::new("total_sales", FieldType::Float),
        CollectionField::new("description", FieldType::String),
      ],
      default_sorting_field: "rank".to_owned(),
    }
  }
}

impl Default for CollectionSchema {
  fn default() -> Self { Self::games_sales(COLLECTION_NAME) }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Parameters for [`SearchIndex::search`](crate::store::SearchIndex::search).
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
  /// Free text matched against `description`; `*` matches everything.
  pub text:     String,
  pub filter:   Option<Filter>,
  pub per_page: Option<usize>,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
  pub document: SearchDocument,
  /// Backend-specific relevance; higher is better.
  pub score:    u64,
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn projection_builds_description() {
    let game = DimGame {
      game_id:   Uuid::new_v4(),
      name:      "Minecraft 2".into(),
      genre:     "Sandbox".into(),
      publisher: "Mojang".into(),
      rank:      1,
    };
    let platform = DimPlatform::new("PC");
    let year = DimYear::new(2030);
    let fact = FactSales {
      game_id:     game.game_id,
      platform_id: platform.platform_id,
      year_id:     year.year_id,
      total_sales: 4.0,
    };

    let doc = SearchDocument::from_parts(&fact, &game, &platform, &year);
    assert_eq!(doc.description, "Minecraft 2 (2030) - PC");
    assert_eq!(doc.total_sales, 4.0);
    assert_eq!(doc.publisher, "Mojang");
    assert_eq!(doc.id, GrainKey::new("Minecraft 2", 2030, "PC").document_id());
  }

  #[test]
  fn schema_marks_year_as_facet() {
    let schema = CollectionSchema::default();
    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(json["name"], "games_sales");
    assert_eq!(json["default_sorting_field"], "rank");
    let year = json["fields"]
      .as_array()
      .unwrap()
      .iter()
      .find(|f| f["name"] == "year")
      .unwrap();
    assert_eq!(year["type"], "int32");
    assert_eq!(year["facet"], true);
  }

  #[test]
  fn jsonl_has_one_line_per_document() {
    let doc = SearchDocument {
      id:          "x".into(),
      game:        "Pong".into(),
      publisher:   "Atari".into(),
      rank:        3,
      platform:    "2600".into(),
      year:        1977,
      total_sales: 1.5,
      description: describe("Pong", 1977, "2600"),
    };
    let body = to_jsonl(&[doc.clone(), doc]).unwrap();
    assert_eq!(body.lines().count(), 2);
  }
}
