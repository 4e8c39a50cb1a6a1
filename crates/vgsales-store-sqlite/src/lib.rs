//! SQLite backends for the raw sales store and the warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The raw store and the warehouse are
//! separate databases, usually separate files.

mod encode;
mod raw;
mod schema;
mod warehouse;

pub mod error;

pub use error::{Error, Result};
pub use raw::SqliteRawStore;
pub use warehouse::SqliteWarehouse;
