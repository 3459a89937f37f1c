//! Assessment and ranking orchestration.
//!
//! [`Engine`] ties the pure scoring function to the storage and generator
//! collaborators: cache-first single assessments, concurrent rankings with
//! partial-failure tolerance, and stored rankings. [`Precompute`] runs
//! rankings in the background to warm the cache.
//!
//! # Wiring
//!
//! ```rust,ignore
//! let engine = Engine::new(store, narrator, config.engine.clone())?;
//! let precompute = Precompute::spawn(engine.clone(), &config.engine);
//! let ranking = engine.rank(&job_id, false).await?;
//! ```

#![allow(async_fn_in_trait)]

pub mod config;
pub mod engine;
pub mod error;
pub mod precompute;

pub use config::EngineConfig;
pub use engine::{Backend, Engine};
pub use error::{Error, Result};
pub use precompute::Precompute;
