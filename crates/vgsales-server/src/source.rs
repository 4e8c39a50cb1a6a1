//! Reader for the ingestion file: a JSON array of source-shaped rows.
//!
//! Column names are accepted both as exported by the public dataset
//! (`Name`, `NA_Sales`, ...) and lowercased. Rows without a year are dropped;
//! a missing publisher becomes `"Unknown"`.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use vgsales_core::sale::NewSale;

#[derive(Debug, Deserialize)]
struct SourceRow {
  #[serde(alias = "Rank")]
  rank:         i32,
  #[serde(alias = "Name")]
  name:         String,
  #[serde(alias = "Platform")]
  platform:     String,
  #[serde(alias = "Year", default)]
  year:         Option<i32>,
  #[serde(alias = "Genre")]
  genre:        String,
  #[serde(alias = "Publisher", default)]
  publisher:    Option<String>,
  #[serde(alias = "NA_Sales", default)]
  na_sales:     f64,
  #[serde(alias = "EU_Sales", default)]
  eu_sales:     f64,
  #[serde(alias = "JP_Sales", default)]
  jp_sales:     f64,
  #[serde(alias = "Other_Sales", default)]
  other_sales:  f64,
  #[serde(alias = "Global_Sales", default)]
  global_sales: f64,
}

impl SourceRow {
  fn into_sale(self) -> Option<NewSale> {
    Some(NewSale {
      name:         self.name,
      rank:         self.rank,
      platform:     self.platform,
      year:         self.year?,
      genre:        self.genre,
      publisher:    self.publisher.unwrap_or_else(|| "Unknown".to_owned()),
      na_sales:     self.na_sales,
      eu_sales:     self.eu_sales,
      jp_sales:     self.jp_sales,
      other_sales:  self.other_sales,
      global_sales: self.global_sales,
    })
  }
}

/// Parse rows from JSON text, dropping those with no year.
pub fn parse(text: &str) -> anyhow::Result<(Vec<NewSale>, usize)> {
  let rows: Vec<SourceRow> =
    serde_json::from_str(text).context("ingestion file is not a JSON array of rows")?;
  let total = rows.len();
  let sales: Vec<NewSale> = rows.into_iter().filter_map(SourceRow::into_sale).collect();
  let dropped = total - sales.len();
  Ok((sales, dropped))
}

pub fn read(path: &Path) -> anyhow::Result<(Vec<NewSale>, usize)> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  parse(&text)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dataset_columns_and_missing_years() {
    let text = r#"[
      {"Rank": 1, "Name": "Wii Sports", "Platform": "Wii", "Year": 2006,
       "Genre": "Sports", "Publisher": "Nintendo", "NA_Sales": 41.49,
       "EU_Sales": 29.02, "JP_Sales": 3.77, "Other_Sales": 8.46, "Global_Sales": 82.74},
      {"Rank": 180, "Name": "Madden NFL 2004", "Platform": "PS2", "Year": null,
       "Genre": "Sports", "Publisher": "Electronic Arts", "Global_Sales": 5.23},
      {"rank": 9, "name": "Pong", "platform": "2600", "year": 1977,
       "genre": "Sports", "publisher": null}
    ]"#;

    let (sales, dropped) = parse(text).unwrap();
    assert_eq!(dropped, 1);
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].name, "Wii Sports");
    assert_eq!(sales[0].global_sales, 82.74);
    assert_eq!(sales[1].publisher, "Unknown");
    assert_eq!(sales[1].na_sales, 0.0);
  }

  #[test]
  fn non_array_is_rejected() {
    assert!(parse(r#"{"Name": "Tetris"}"#).is_err());
  }
}
