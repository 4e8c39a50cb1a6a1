//! The reshape-and-sync pipeline.
//!
//! Raw sale rows are aggregated to the `(name, year, platform)` grain,
//! resolved into a star schema, and projected into a search index:
//!
//! ```text
//! rows ─ aggregate ─▶ raw store ─ build_fact ─▶ warehouse ─ project ─▶ gateway ─▶ index
//!                                   (resolve)
//! ```
//!
//! Leaf operations are free functions generic over the store traits in
//! [`vgsales_core::store`]. The orchestrating operations (ingest, rebuild,
//! sync) live on [`Pipeline`], which owns nothing but the handles its caller
//! passes in.

pub mod aggregate;
pub mod build;
pub mod error;
pub mod gateway;
pub mod project;
pub mod resolve;

mod ingest;
mod pipeline;
mod rebuild;
mod sync;

pub use aggregate::aggregate;
pub use build::build_fact;
pub use error::{BoxError, Error, Result};
pub use ingest::IngestReport;
pub use pipeline::Pipeline;
pub use project::project;
pub use rebuild::{ConfirmTruncate, RebuildReport};
pub use sync::{SyncReport, SyncScope};
