//! Grain-level aggregation of raw rows.

use std::collections::HashMap;

use vgsales_core::sale::{GrainKey, NewSale};

/// Collapse rows sharing a `(name, year, platform)` grain into one row each.
///
/// Per group: the four regional measures are summed, `rank` is the maximum,
/// and `genre`/`publisher` come from the first row seen. A lone row keeps its
/// own `global_sales`. A merged group's `global_sales` is the sum of its
/// summed regional measures, falling back to the members' summed
/// `global_sales` when no member carries a regional figure.
/// Output order follows the first appearance of each grain.
pub fn aggregate(rows: impl IntoIterator<Item = NewSale>) -> Vec<NewSale> {
  let mut slots: HashMap<GrainKey, usize> = HashMap::new();
  let mut groups: Vec<Group> = Vec::new();

  for row in rows {
    match slots.get(&row.grain()) {
      Some(&i) => groups[i].merge(row),
      None => {
        slots.insert(row.grain(), groups.len());
        groups.push(Group::new(row));
      }
    }
  }

  groups.into_iter().map(Group::finish).collect()
}

struct Group {
  row:     NewSale,
  members: usize,
  global:  f64,
}

impl Group {
  fn new(row: NewSale) -> Self {
    let global = row.global_sales;
    Self { row, members: 1, global }
  }

  fn merge(&mut self, row: NewSale) {
    let acc = &mut self.row;
    acc.na_sales += row.na_sales;
    acc.eu_sales += row.eu_sales;
    acc.jp_sales += row.jp_sales;
    acc.other_sales += row.other_sales;
    acc.rank = acc.rank.max(row.rank);
    self.global += row.global_sales;
    self.members += 1;
  }

  fn finish(self) -> NewSale {
    let mut row = self.row;
    if self.members > 1 {
      let regional = row.na_sales + row.eu_sales + row.jp_sales + row.other_sales;
      row.global_sales = if regional != 0.0 { regional } else { self.global };
    }
    row
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(name: &str, platform: &str, year: i32, each: f64, rank: i32) -> NewSale {
    NewSale {
      name:         name.into(),
      rank,
      platform:     platform.into(),
      year,
      genre:        format!("genre-{rank}"),
      publisher:    format!("publisher-{rank}"),
      na_sales:     each,
      eu_sales:     each,
      jp_sales:     each,
      other_sales:  each,
      global_sales: each * 4.0,
    }
  }

  #[test]
  fn sums_measures_and_takes_max_rank() {
    let out = aggregate([row("G", "P", 2000, 1.0, 5), row("G", "P", 2000, 2.0, 9)]);

    assert_eq!(out.len(), 1);
    let g = &out[0];
    assert_eq!(
      (g.na_sales, g.eu_sales, g.jp_sales, g.other_sales),
      (3.0, 3.0, 3.0, 3.0)
    );
    assert_eq!(g.global_sales, 12.0);
    assert_eq!(g.rank, 9);
  }

  #[test]
  fn merged_global_follows_summed_regionals() {
    let rows: Vec<NewSale> = serde_json::from_value(serde_json::json!([
      { "name": "G", "rank": 5, "platform": "P", "year": 2000, "genre": "g",
        "publisher": "p", "na_sales": 1.0, "eu_sales": 1.0, "jp_sales": 1.0,
        "other_sales": 1.0 },
      { "name": "G", "rank": 9, "platform": "P", "year": 2000, "genre": "g",
        "publisher": "p", "na_sales": 2.0, "eu_sales": 2.0, "jp_sales": 2.0,
        "other_sales": 2.0 },
    ]))
    .unwrap();

    let out = aggregate(rows);

    assert_eq!(out.len(), 1);
    let g = &out[0];
    assert_eq!(
      (g.na_sales, g.eu_sales, g.jp_sales, g.other_sales),
      (3.0, 3.0, 3.0, 3.0)
    );
    assert_eq!(g.global_sales, 12.0);
    assert_eq!(g.rank, 9);
  }

  #[test]
  fn merged_global_ignores_stale_member_globals() {
    let mut a = row("G", "P", 2000, 1.0, 1);
    a.global_sales = 100.0;
    let out = aggregate([a, row("G", "P", 2000, 1.0, 2)]);
    assert_eq!(out[0].global_sales, 8.0);
  }

  #[test]
  fn global_only_rows_keep_their_totals() {
    let mut a = row("G", "P", 2000, 0.0, 1);
    a.global_sales = 4.0;
    let mut b = row("G", "P", 2000, 0.0, 2);
    b.global_sales = 1.5;
    let mut lone = row("Minecraft 2", "PC", 2030, 0.0, 1);
    lone.global_sales = 4.0;

    let out = aggregate([a, b, lone]);

    assert_eq!(out[0].global_sales, 5.5);
    assert_eq!(out[1].global_sales, 4.0);
  }

  #[test]
  fn keeps_attributes_of_first_row() {
    let out = aggregate([row("G", "P", 2000, 1.0, 9), row("G", "P", 2000, 1.0, 5)]);
    assert_eq!(out[0].genre, "genre-9");
    assert_eq!(out[0].publisher, "publisher-9");
    assert_eq!(out[0].rank, 9);
  }

  #[test]
  fn distinct_grains_stay_separate_in_first_seen_order() {
    let out = aggregate([
      row("Tetris", "GB", 1989, 1.0, 1),
      row("Tetris", "NES", 1989, 1.0, 2),
      row("Tetris", "GB", 1990, 1.0, 3),
      row("Tetris", "GB", 1989, 1.0, 4),
    ]);

    let grains: Vec<_> = out.iter().map(|r| (r.platform.as_str(), r.year)).collect();
    assert_eq!(grains, vec![("GB", 1989), ("NES", 1989), ("GB", 1990)]);
    assert_eq!(out[0].global_sales, 8.0);
  }

  #[test]
  fn empty_input_gives_empty_output() {
    assert!(aggregate(Vec::new()).is_empty());
  }
}
