//! SQL schemas for the raw store and the warehouse.
//!
//! Executed once at connection startup. Both schemas are idempotent thanks to
//! `CREATE ... IF NOT EXISTS`.

/// Connection-level settings. Must run outside any transaction.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Raw, source-shaped rows. Duplicate grains are allowed here.
pub const RAW_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    sale_id      TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    rank         INTEGER NOT NULL,
    platform     TEXT NOT NULL,
    year         INTEGER NOT NULL,
    genre        TEXT NOT NULL,
    publisher    TEXT NOT NULL,
    na_sales     REAL NOT NULL DEFAULT 0,
    eu_sales     REAL NOT NULL DEFAULT 0,
    jp_sales     REAL NOT NULL DEFAULT 0,
    other_sales  REAL NOT NULL DEFAULT 0,
    global_sales REAL NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS history_grain_idx ON history(name, year, platform);

PRAGMA user_version = 1;
";

/// The star schema. Natural keys are UNIQUE so a duplicate dimension insert
/// fails instead of silently proliferating rows.
pub const WAREHOUSE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dim_game (
    game_id   TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    genre     TEXT NOT NULL,
    publisher TEXT NOT NULL,
    rank      INTEGER NOT NULL,
    UNIQUE (name, genre, publisher, rank)
);

CREATE TABLE IF NOT EXISTS dim_platform (
    platform_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS dim_year (
    year_id TEXT PRIMARY KEY,
    year    INTEGER NOT NULL UNIQUE
);

-- One row per (game, platform, year) grain.
CREATE TABLE IF NOT EXISTS fact_sales (
    game_id     TEXT NOT NULL REFERENCES dim_game(game_id),
    platform_id TEXT NOT NULL REFERENCES dim_platform(platform_id),
    year_id     TEXT NOT NULL REFERENCES dim_year(year_id),
    total_sales REAL NOT NULL,
    PRIMARY KEY (game_id, platform_id, year_id)
);

CREATE INDEX IF NOT EXISTS dim_game_name_idx ON dim_game(name);

PRAGMA user_version = 1;
";

/// Facts first so foreign keys never dangle mid-drop.
pub const WAREHOUSE_DROP: &str = "
DROP TABLE IF EXISTS fact_sales;
DROP TABLE IF EXISTS dim_game;
DROP TABLE IF EXISTS dim_platform;
DROP TABLE IF EXISTS dim_year;
";
