//! Error type for `hirerank-engine`.

use hirerank_core::profile::{CandidateId, JobId};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("job not found: {0}")]
  JobNotFound(JobId),

  #[error("candidate not found: {0}")]
  CandidateNotFound(CandidateId),

  /// Generator failure or timeout. Recovered inside the engine; callers of
  /// `assess` and `rank` never see it.
  #[error("narrative unavailable: {0}")]
  NarrativeUnavailable(String),

  #[error("profile store error: {0}")]
  Store(#[source] BoxError),

  #[error("assessment cache error: {0}")]
  Cache(#[source] BoxError),

  #[error("assessment cache write conflict persisted after retry")]
  CacheWriteConflict,

  #[error("precompute queue is full")]
  QueueFull,

  #[error("precompute for job {0} is already queued")]
  AlreadyQueued(JobId),

  #[error("precompute scheduler is shut down")]
  Closed,

  #[error("invalid engine configuration: {0}")]
  InvalidConfig(String),

  #[error("core error: {0}")]
  Core(#[from] hirerank_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
