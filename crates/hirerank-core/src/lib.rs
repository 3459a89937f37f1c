//! Core types and trait definitions for the hirerank assessment engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the profile and report types, the pure scoring function, and the traits the
//! engine's collaborators (profile store, assessment cache, similarity
//! retriever, narrative generator) implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod fingerprint;
pub mod narrative;
pub mod profile;
pub mod report;
pub mod scoring;
pub mod skills;
pub mod store;

pub use error::{Error, Result};
