//! The narrative generator collaborator.
//!
//! Produces the human-readable parts of a report (strengths, weaknesses,
//! reasoning, a recommendation label) and the comparative summary of a
//! ranking. Implementations are typically backed by a language model and may
//! be slow or fail; callers bound them with a timeout and fall back to
//! score-only prose.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  profile::{CandidateProfile, JobProfile},
  report::AssessmentReport,
  scoring::ScoreBreakdown,
};

/// Prose for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
  #[serde(default)]
  pub strengths:      Vec<String>,
  #[serde(default)]
  pub weaknesses:     Vec<String>,
  #[serde(default)]
  pub reasoning:      String,
  /// Free-form label; parsed with
  /// [`Recommendation::parse_or_score`](crate::report::Recommendation::parse_or_score).
  #[serde(default)]
  pub recommendation: String,
}

pub trait NarrativeGenerator: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Explain `scores` for `candidate` against `job`.
  fn generate<'a>(
    &'a self,
    job: &'a JobProfile,
    candidate: &'a CandidateProfile,
    scores: &'a ScoreBreakdown,
  ) -> impl Future<Output = Result<Narrative, Self::Error>> + Send + 'a;

  /// Compare the top-ranked candidates for `job` in a short paragraph.
  fn summarize<'a>(
    &'a self,
    job: &'a JobProfile,
    top: &'a [AssessmentReport],
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
