//! Core types and trait definitions for the video-game sales warehouse.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the flat raw-sale shape, the star schema (three dimensions and one
//! fact table), the denormalised search document, and the three storage
//! abstractions the pipeline talks to.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod document;
pub mod error;
pub mod filter;
pub mod sale;
pub mod store;
pub mod warehouse;

pub use error::{Error, Result};
