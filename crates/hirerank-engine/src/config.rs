//! Engine tunables.

use std::time::Duration;

use hirerank_core::scoring::ScoringConfig;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub scoring:                   ScoringConfig,
  /// Candidates pulled from the similarity retriever per ranking.
  pub retriever_top_k:           usize,
  /// In-flight assessments per ranking request.
  pub max_concurrency:           usize,
  /// Narrative generator calls in flight across the whole engine.
  pub max_concurrent_narratives: usize,
  pub narrative_timeout_ms:      u64,
  /// Reports passed to the ranking summary.
  pub summary_top_n:             usize,
  pub precompute_queue_capacity: usize,
  /// Precompute rankings run at once.
  pub precompute_workers:        usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      scoring:                   ScoringConfig::default(),
      retriever_top_k:           50,
      max_concurrency:           4,
      max_concurrent_narratives: 4,
      narrative_timeout_ms:      60_000,
      summary_top_n:             3,
      precompute_queue_capacity: 64,
      precompute_workers:        2,
    }
  }
}

impl EngineConfig {
  pub fn narrative_timeout(&self) -> Duration { Duration::from_millis(self.narrative_timeout_ms) }

  pub fn validate(&self) -> Result<()> {
    self.scoring.validate()?;
    let positive = [
      ("max_concurrency", self.max_concurrency),
      ("max_concurrent_narratives", self.max_concurrent_narratives),
      ("precompute_queue_capacity", self.precompute_queue_capacity),
      ("precompute_workers", self.precompute_workers),
    ];
    for (name, value) in positive {
      if value == 0 {
        return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
      }
    }
    if self.narrative_timeout_ms == 0 {
      return Err(Error::InvalidConfig("narrative_timeout_ms must be positive".into()));
    }
    Ok(())
  }
}
