//! Server wiring for hirerank: configuration and the HTTP-backed narrative
//! generator. The `hirerank` binary in `main.rs` assembles these with the
//! SQLite store, the engine and the API router.

pub mod config;
pub mod narrator;

pub use config::{NarratorConfig, ServerConfig};
pub use narrator::{HttpNarrator, Narrator, NarratorError};
