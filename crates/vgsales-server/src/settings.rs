//! Runtime configuration, layered from `vgsales.toml` and `VGSALES_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use vgsales_search::SearchConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_raw_store_path")]
  pub raw_store_path: PathBuf,
  #[serde(default = "default_warehouse_path")]
  pub warehouse_path: PathBuf,
  #[serde(default)]
  pub search:         SearchConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_raw_store_path() -> PathBuf { PathBuf::from("vgsales-raw.db") }

fn default_warehouse_path() -> PathBuf { PathBuf::from("vgsales-warehouse.db") }

impl ServerConfig {
  /// Read `path` if it exists, then let the environment override it.
  ///
  /// Nested keys use `__`: `VGSALES_SEARCH__API_KEY`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("VGSALES")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(text: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(text, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.address(), "127.0.0.1:8000");
    assert_eq!(cfg.raw_store_path, PathBuf::from("vgsales-raw.db"));
    assert!(matches!(cfg.search, SearchConfig::Memory(_)));
    assert_eq!(cfg.search.schema().name, "games_sales");
  }

  #[test]
  fn memory_backend_takes_a_collection_name() {
    let cfg = from_toml(
      r#"
        [search]
        backend    = "memory"
        collection = "sales_v2"
      "#,
    );
    assert_eq!(cfg.search.schema().name, "sales_v2");
  }

  #[test]
  fn typesense_backend_is_selected_by_tag() {
    let cfg = from_toml(
      r#"
        port = 9000
        [search]
        backend = "typesense"
        url     = "http://localhost:8108"
        api_key = "xyz"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    let SearchConfig::Typesense(ts) = &cfg.search else {
      panic!("expected typesense backend");
    };
    assert_eq!(ts.api_key, "xyz");
    assert_eq!(cfg.search.schema().name, "games_sales");
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let plain = Path::new("/tmp/raw.db");
    assert_eq!(expand_tilde(plain), plain);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/raw.db")), PathBuf::from(home).join("raw.db"));
    }
  }
}
