//! Error types for `hirerank-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid scoring weights: {0}")]
  InvalidWeights(String),

  #[error("invalid experience floor {0}: must lie in [0, 1)")]
  InvalidExperienceFloor(f64),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
