//! Storage and retrieval traits.
//!
//! Backends (e.g. `hirerank-store-sqlite`) implement these; the engine
//! depends only on the abstractions.

use std::future::Future;

use crate::{
  profile::{CandidateId, CandidateProfile, JobId, JobProfile},
  report::AssessmentReport,
};

// ─── Profiles ────────────────────────────────────────────────────────────────

/// Read access to job and candidate profiles.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_job<'a>(
    &'a self,
    id: &'a JobId,
  ) -> impl Future<Output = Result<Option<JobProfile>, Self::Error>> + Send + 'a;

  fn get_candidate<'a>(
    &'a self,
    id: &'a CandidateId,
  ) -> impl Future<Output = Result<Option<CandidateProfile>, Self::Error>> + Send + 'a;

  /// Candidates that applied directly to `job`, in id order.
  fn list_candidates_for_job<'a>(
    &'a self,
    job: &'a JobId,
  ) -> impl Future<Output = Result<Vec<CandidateId>, Self::Error>> + Send + 'a;
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
  /// The profile did not exist before.
  pub created:     bool,
  /// Cached reports dropped because the profile content changed.
  pub invalidated: usize,
}

/// Write access to profiles.
///
/// Replacing a profile with different content invalidates every cached
/// report that involves it, atomically with the write. Deleting a profile
/// removes its reports.
pub trait ProfileWriter: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn upsert_job(
    &self,
    job: JobProfile,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  fn upsert_candidate(
    &self,
    candidate: CandidateProfile,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  /// Returns `false` if the job did not exist.
  fn delete_job<'a>(
    &'a self,
    id: &'a JobId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Returns `false` if the candidate did not exist.
  fn delete_candidate<'a>(
    &'a self,
    id: &'a CandidateId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Assessment cache ────────────────────────────────────────────────────────

/// Lets callers distinguish a lost write race from other storage failures.
pub trait WriteConflict {
  fn is_write_conflict(&self) -> bool;
}

/// Persistent map from (job, candidate) to the latest report.
///
/// At most one report exists per pair; `put` replaces any previous one
/// atomically, so readers never observe two rows or none mid-replace.
pub trait AssessmentCache: Send + Sync {
  type Error: std::error::Error + WriteConflict + Send + Sync + 'static;

  fn get<'a>(
    &'a self,
    job: &'a JobId,
    candidate: &'a CandidateId,
  ) -> impl Future<Output = Result<Option<AssessmentReport>, Self::Error>> + Send + 'a;

  /// Store `report`, replacing any previous report for the same pair.
  ///
  /// Returns `false` without writing when the report's fingerprints no
  /// longer match the stored profiles, i.e. a profile was edited or removed
  /// while the report was being computed.
  fn put<'a>(
    &'a self,
    report: &'a AssessmentReport,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Returns `true` if a report was removed.
  fn invalidate<'a>(
    &'a self,
    job: &'a JobId,
    candidate: &'a CandidateId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn invalidate_all_for_job<'a>(
    &'a self,
    job: &'a JobId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn invalidate_all_for_candidate<'a>(
    &'a self,
    candidate: &'a CandidateId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Every cached report for `job`, in ranking order.
  fn list_for_job<'a>(
    &'a self,
    job: &'a JobId,
  ) -> impl Future<Output = Result<Vec<AssessmentReport>, Self::Error>> + Send + 'a;
}

// ─── Similarity ──────────────────────────────────────────────────────────────

/// Nearest-neighbour search over candidate embeddings.
pub trait SimilarityRetriever: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Up to `k` candidate ids, most similar first.
  fn top_k<'a>(
    &'a self,
    embedding: &'a [f32],
    k: usize,
  ) -> impl Future<Output = Result<Vec<CandidateId>, Self::Error>> + Send + 'a;
}
