//! vgsales binary.
//!
//! Reads `vgsales.toml` (or the path given with `--config`), opens the raw
//! store and warehouse as SQLite files, connects the configured search index,
//! and runs one command:
//!
//! ```text
//! vgsales serve                      # JSON API over HTTP
//! vgsales ingest --file rows.json    # load source rows into the raw store
//! vgsales rebuild --yes [--reindex]  # drop and rebuild the warehouse
//! vgsales sync [--id <uuid>]         # push raw changes to warehouse and index
//! ```

mod settings;
mod source;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vgsales_etl::{ConfirmTruncate, Pipeline};
use vgsales_search::AnyIndex;
use vgsales_store_sqlite::{SqliteRawStore, SqliteWarehouse};

use crate::settings::{ServerConfig, expand_tilde};

type AppPipeline = Pipeline<SqliteRawStore, SqliteWarehouse, AnyIndex>;

#[derive(Parser)]
#[command(author, version, about = "Video-game sales warehouse")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vgsales.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Load a JSON array of source rows into the raw store.
  Ingest {
    #[arg(short, long)]
    file: PathBuf,
  },
  /// Drop every warehouse table and rebuild it from the raw store.
  Rebuild {
    /// Required: confirms the warehouse may be dropped.
    #[arg(long)]
    yes:     bool,
    /// Push the rebuilt fact table to the search index afterwards.
    #[arg(long)]
    reindex: bool,
  },
  /// Sync one raw record, or everything, into the warehouse and index.
  Sync {
    #[arg(long)]
    id: Option<Uuid>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;
  let pipeline = open(&server_cfg).await?;

  match cli.command {
    Command::Serve => serve(&server_cfg, pipeline).await,
    Command::Ingest { file } => {
      let (rows, dropped) = source::read(&file)?;
      if dropped > 0 {
        tracing::info!(dropped, "skipped rows without a year");
      }
      print(&pipeline.ingest(rows).await?)
    }
    Command::Rebuild { yes, reindex } => {
      if !yes {
        anyhow::bail!("rebuild drops every warehouse table; pass --yes to confirm");
      }
      print(&pipeline.rebuild(ConfirmTruncate::confirmed()).await?)?;
      if reindex {
        print(&pipeline.sync(None).await?)?;
      }
      Ok(())
    }
    Command::Sync { id } => print(&pipeline.sync(id).await?),
  }
}

/// Open both SQLite stores and the search index, and make sure the
/// collection exists.
async fn open(server_cfg: &ServerConfig) -> anyhow::Result<AppPipeline> {
  let raw_path = expand_tilde(&server_cfg.raw_store_path);
  let raw = SqliteRawStore::open(&raw_path)
    .await
    .with_context(|| format!("failed to open raw store at {raw_path:?}"))?;

  let warehouse_path = expand_tilde(&server_cfg.warehouse_path);
  let warehouse = SqliteWarehouse::open(&warehouse_path)
    .await
    .with_context(|| format!("failed to open warehouse at {warehouse_path:?}"))?;

  let index = AnyIndex::from_config(&server_cfg.search).context("failed to build search client")?;

  let pipeline = Pipeline::new(Arc::new(raw), Arc::new(warehouse), Arc::new(index));
  let schema = server_cfg.search.schema();
  if pipeline
    .prepare_index(&schema)
    .await
    .with_context(|| format!("failed to prepare collection {}", schema.name))?
  {
    tracing::info!(collection = %schema.name, "created search collection");
  }
  Ok(pipeline)
}

async fn serve(server_cfg: &ServerConfig, pipeline: AppPipeline) -> anyhow::Result<()> {
  let app = vgsales_api::api_router(pipeline);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn print(report: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(report)?);
  Ok(())
}
