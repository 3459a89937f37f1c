//! [`Engine`]: the assessment and ranking orchestrators.

use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::Utc;
use hirerank_core::{
  fingerprint::{candidate_fingerprint, job_fingerprint},
  narrative::{Narrative, NarrativeGenerator},
  profile::{CandidateId, CandidateProfile, JobId, JobProfile},
  report::{AssessmentReport, NarrativeStatus, RankingResult, Recommendation, SkippedCandidate, sort_ranked},
  scoring::{ScoreBreakdown, Scorer},
  store::{AssessmentCache, ProfileStore, SimilarityRetriever, WriteConflict as _},
};
use tokio::{sync::Semaphore, task::JoinSet};
use uuid::Uuid;

use crate::{Error, Result, config::EngineConfig};

/// Everything the engine reads and writes: profiles, cached reports, and
/// nearest-neighbour retrieval.
pub trait Backend: ProfileStore + AssessmentCache + SimilarityRetriever + 'static {}

impl<T> Backend for T where T: ProfileStore + AssessmentCache + SimilarityRetriever + 'static {}

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

fn cache_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Cache(Box::new(e))
}

/// A job profile loaded once per request, with its fingerprint.
struct JobContext {
  profile:     JobProfile,
  fingerprint: String,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Cache-first assessment and ranking over a [`Backend`] and a
/// [`NarrativeGenerator`].
///
/// Cloning is cheap; clones share the backend, the generator and the
/// narrative concurrency limit.
pub struct Engine<S, N> {
  backend:    Arc<S>,
  narrator:   Arc<N>,
  scorer:     Arc<Scorer>,
  narratives: Arc<Semaphore>,
  config:     Arc<EngineConfig>,
}

impl<S, N> Clone for Engine<S, N> {
  fn clone(&self) -> Self {
    Self {
      backend:    Arc::clone(&self.backend),
      narrator:   Arc::clone(&self.narrator),
      scorer:     Arc::clone(&self.scorer),
      narratives: Arc::clone(&self.narratives),
      config:     Arc::clone(&self.config),
    }
  }
}

impl<S, N> Engine<S, N>
where
  S: Backend,
  N: NarrativeGenerator + 'static,
{
  /// Validates `config` and builds the scorer.
  pub fn new(backend: Arc<S>, narrator: Arc<N>, config: EngineConfig) -> Result<Self> {
    config.validate()?;
    let scorer = Scorer::new(config.scoring.clone())?;
    Ok(Self {
      backend,
      narrator,
      scorer: Arc::new(scorer),
      narratives: Arc::new(Semaphore::new(config.max_concurrent_narratives)),
      config: Arc::new(config),
    })
  }

  pub fn config(&self) -> &EngineConfig { &self.config }

  pub fn backend(&self) -> &Arc<S> { &self.backend }

  fn narrative_timeout(&self) -> Duration { self.config.narrative_timeout() }

  // ── Assessment ────────────────────────────────────────────────────────────

  /// Assess one candidate against one job.
  ///
  /// Without `force_refresh` a cached report is returned unchanged. Otherwise
  /// the pair is scored, narrated, and the cache entry replaced. Narrative
  /// failure never fails the assessment.
  pub async fn assess(
    &self,
    job_id: &JobId,
    candidate_id: &CandidateId,
    force_refresh: bool,
  ) -> Result<AssessmentReport> {
    if !force_refresh {
      if let Some(report) = self.cached(job_id, candidate_id).await? {
        tracing::debug!(job_id = %job_id, candidate_id = %candidate_id, "assessment cache hit");
        return Ok(report);
      }
    }
    let job = self.load_job(job_id).await?;
    self.compute(&job, candidate_id).await
  }

  /// The stored report for a pair, if any. Never computes.
  pub async fn cached(
    &self,
    job_id: &JobId,
    candidate_id: &CandidateId,
  ) -> Result<Option<AssessmentReport>> {
    self.backend.get(job_id, candidate_id).await.map_err(cache_err)
  }

  async fn assess_in(
    &self,
    job: &JobContext,
    candidate_id: &CandidateId,
    force_refresh: bool,
  ) -> Result<AssessmentReport> {
    if !force_refresh {
      if let Some(report) = self.cached(&job.profile.id, candidate_id).await? {
        return Ok(report);
      }
    }
    self.compute(job, candidate_id).await
  }

  async fn load_job(&self, job_id: &JobId) -> Result<JobContext> {
    let profile = self
      .backend
      .get_job(job_id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::JobNotFound(job_id.clone()))?;
    let fingerprint = job_fingerprint(&profile)?;
    Ok(JobContext { profile, fingerprint })
  }

  async fn load_candidate(&self, candidate_id: &CandidateId) -> Result<CandidateProfile> {
    self
      .backend
      .get_candidate(candidate_id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::CandidateNotFound(candidate_id.clone()))
  }

  async fn compute(&self, job: &JobContext, candidate_id: &CandidateId) -> Result<AssessmentReport> {
    let candidate = self.load_candidate(candidate_id).await?;
    let scores = self.scorer.score(&job.profile, &candidate);

    let narrative = match self.narrate(&job.profile, &candidate, &scores).await {
      Ok(n) => Some(n),
      Err(e) => {
        tracing::warn!(
          job_id = %job.profile.id,
          candidate_id = %candidate_id,
          error = %e,
          "falling back to score-only assessment"
        );
        None
      }
    };

    let report = build_report(job, &candidate, &scores, narrative)?;
    self.persist(&report).await?;

    tracing::info!(
      job_id = %report.job_id,
      candidate_id = %report.candidate_id,
      score = report.overall_score,
      recommendation = %report.recommendation,
      "assessment complete"
    );
    Ok(report)
  }

  async fn narrate(
    &self,
    job: &JobProfile,
    candidate: &CandidateProfile,
    scores: &ScoreBreakdown,
  ) -> Result<Narrative> {
    let _permit = self
      .narratives
      .acquire()
      .await
      .map_err(|e| Error::NarrativeUnavailable(e.to_string()))?;

    match tokio::time::timeout(
      self.narrative_timeout(),
      self.narrator.generate(job, candidate, scores),
    )
    .await
    {
      Ok(Ok(narrative)) => Ok(narrative),
      Ok(Err(e)) => Err(Error::NarrativeUnavailable(e.to_string())),
      Err(_) => Err(Error::NarrativeUnavailable(format!(
        "timed out after {:?}",
        self.narrative_timeout()
      ))),
    }
  }

  /// Replace the cached report, retrying once if another writer raced us.
  ///
  /// A report whose profiles changed mid-computation is returned to the
  /// caller but not cached.
  async fn persist(&self, report: &AssessmentReport) -> Result<()> {
    let stored = match self.backend.put(report).await {
      Ok(stored) => stored,
      Err(e) if e.is_write_conflict() => {
        tracing::warn!(
          job_id = %report.job_id,
          candidate_id = %report.candidate_id,
          "cache write conflict; retrying"
        );
        match self.backend.put(report).await {
          Ok(stored) => stored,
          Err(e) if e.is_write_conflict() => return Err(Error::CacheWriteConflict),
          Err(e) => return Err(cache_err(e)),
        }
      }
      Err(e) => return Err(cache_err(e)),
    };

    if !stored {
      tracing::warn!(
        job_id = %report.job_id,
        candidate_id = %report.candidate_id,
        "profile edited during assessment; report not cached"
      );
    }
    Ok(())
  }

  // ── Ranking ───────────────────────────────────────────────────────────────

  /// Rank every candidate considered for `job_id`: direct applicants, then
  /// the retriever's nearest neighbours.
  ///
  /// Candidates whose assessment fails are listed in
  /// [`RankingResult::skipped`] rather than failing the ranking.
  pub async fn rank(&self, job_id: &JobId, force_refresh: bool) -> Result<RankingResult> {
    let job = Arc::new(self.load_job(job_id).await?);
    let pool = self.resolve_pool(&job.profile).await?;
    tracing::debug!(job_id = %job_id, pool = pool.len(), "ranking pool resolved");

    let (rankings, failures) = self.assess_pool(Arc::clone(&job), pool, force_refresh).await;
    self.finish(&job.profile, rankings, skipped(failures)).await
  }

  /// Rank an explicit list of candidates. Every id was requested directly,
  /// so an unknown candidate fails the whole comparison.
  pub async fn compare(
    &self,
    job_id: &JobId,
    candidate_ids: &[CandidateId],
    force_refresh: bool,
  ) -> Result<RankingResult> {
    let job = Arc::new(self.load_job(job_id).await?);
    let pool = dedupe(candidate_ids.iter().cloned());

    let (rankings, mut failures) = self.assess_pool(Arc::clone(&job), pool, force_refresh).await;
    if let Some(i) = failures.iter().position(|(_, e)| matches!(e, Error::CandidateNotFound(_))) {
      return Err(failures.swap_remove(i).1);
    }
    self.finish(&job.profile, rankings, skipped(failures)).await
  }

  /// Cached reports for `job_id` in ranking order, optionally truncated.
  /// Computes nothing and calls no generator.
  pub async fn stored_ranking(&self, job_id: &JobId, limit: Option<usize>) -> Result<RankingResult> {
    let job = self.load_job(job_id).await?;
    let mut rankings = self.backend.list_for_job(job_id).await.map_err(cache_err)?;
    sort_ranked(&mut rankings);
    if let Some(limit) = limit {
      rankings.truncate(limit);
    }

    Ok(RankingResult {
      job_id:           job.profile.id,
      job_title:        job.profile.title,
      total_candidates: rankings.len(),
      rankings,
      summary:          None,
      skipped:          Vec::new(),
      generated_at:     Utc::now(),
    })
  }

  async fn resolve_pool(&self, job: &JobProfile) -> Result<Vec<CandidateId>> {
    let direct = self
      .backend
      .list_candidates_for_job(&job.id)
      .await
      .map_err(store_err)?;

    let similar = match &job.embedding {
      Some(embedding) => {
        match self.backend.top_k(embedding, self.config.retriever_top_k).await {
          Ok(ids) => ids,
          Err(e) => {
            tracing::warn!(job_id = %job.id, error = %e, "similarity retrieval failed; using direct applicants only");
            Vec::new()
          }
        }
      }
      None => Vec::new(),
    };

    Ok(dedupe(direct.into_iter().chain(similar)))
  }

  /// Assess `pool` with at most `max_concurrency` assessments in flight.
  /// Failures come back alongside the reports instead of aborting the batch.
  /// Dropping the returned future aborts outstanding assessments.
  async fn assess_pool(
    &self,
    job: Arc<JobContext>,
    pool: Vec<CandidateId>,
    force_refresh: bool,
  ) -> (Vec<AssessmentReport>, Vec<(CandidateId, Error)>) {
    let mut tasks = JoinSet::new();
    let mut rankings = Vec::with_capacity(pool.len());
    let mut failures = Vec::new();

    let mut collect = |(candidate_id, outcome): (CandidateId, Result<AssessmentReport>)| {
      match outcome {
        Ok(report) => rankings.push(report),
        Err(e) => {
          tracing::warn!(
            job_id = %job.profile.id,
            candidate_id = %candidate_id,
            error = %e,
            "candidate skipped"
          );
          failures.push((candidate_id, e));
        }
      }
    };

    for candidate_id in pool {
      while tasks.len() >= self.config.max_concurrency {
        if let Some(joined) = tasks.join_next().await {
          collect(unwrap_join(joined));
        }
      }
      let engine = self.clone();
      let job = Arc::clone(&job);
      tasks.spawn(async move {
        let outcome = engine.assess_in(&job, &candidate_id, force_refresh).await;
        (candidate_id, outcome)
      });
    }
    while let Some(joined) = tasks.join_next().await {
      collect(unwrap_join(joined));
    }

    (rankings, failures)
  }

  async fn finish(
    &self,
    job: &JobProfile,
    mut rankings: Vec<AssessmentReport>,
    skipped: Vec<SkippedCandidate>,
  ) -> Result<RankingResult> {
    sort_ranked(&mut rankings);
    let summary = self.summarize(job, &rankings).await;

    tracing::info!(
      job_id = %job.id,
      ranked = rankings.len(),
      skipped = skipped.len(),
      "ranking complete"
    );

    Ok(RankingResult {
      job_id: job.id.clone(),
      job_title: job.title.clone(),
      total_candidates: rankings.len(),
      rankings,
      summary,
      skipped,
      generated_at: Utc::now(),
    })
  }

  async fn summarize(&self, job: &JobProfile, rankings: &[AssessmentReport]) -> Option<String> {
    if rankings.is_empty() {
      return None;
    }
    let top = &rankings[..rankings.len().min(self.config.summary_top_n)];

    let _permit = self.narratives.acquire().await.ok()?;
    match tokio::time::timeout(self.narrative_timeout(), self.narrator.summarize(job, top)).await {
      Ok(Ok(summary)) => Some(summary),
      Ok(Err(e)) => {
        tracing::warn!(job_id = %job.id, error = %e, "ranking summary failed");
        None
      }
      Err(_) => {
        tracing::warn!(job_id = %job.id, "ranking summary timed out");
        None
      }
    }
  }

  // ── Invalidation ──────────────────────────────────────────────────────────

  pub async fn invalidate(&self, job_id: &JobId, candidate_id: &CandidateId) -> Result<bool> {
    self.backend.invalidate(job_id, candidate_id).await.map_err(cache_err)
  }

  pub async fn invalidate_for_job(&self, job_id: &JobId) -> Result<usize> {
    let n = self.backend.invalidate_all_for_job(job_id).await.map_err(cache_err)?;
    tracing::info!(job_id = %job_id, invalidated = n, "job assessments invalidated");
    Ok(n)
  }

  pub async fn invalidate_for_candidate(&self, candidate_id: &CandidateId) -> Result<usize> {
    let n = self
      .backend
      .invalidate_all_for_candidate(candidate_id)
      .await
      .map_err(cache_err)?;
    tracing::info!(candidate_id = %candidate_id, invalidated = n, "candidate assessments invalidated");
    Ok(n)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn build_report(
  job: &JobContext,
  candidate: &CandidateProfile,
  scores: &ScoreBreakdown,
  narrative: Option<Narrative>,
) -> Result<AssessmentReport> {
  let overall = scores.overall;
  let (strengths, weaknesses, reasoning, recommendation, narrative_status) = match narrative {
    Some(n) => (
      n.strengths,
      n.weaknesses,
      n.reasoning,
      Recommendation::parse_or_score(&n.recommendation, overall),
      NarrativeStatus::Generated,
    ),
    None => (
      Vec::new(),
      Vec::new(),
      format!("Narrative unavailable; score-based recommendation: {overall:.2}/100"),
      Recommendation::from_score(overall),
      NarrativeStatus::Unavailable,
    ),
  };

  Ok(AssessmentReport {
    report_id: Uuid::new_v4(),
    job_id: job.profile.id.clone(),
    candidate_id: candidate.id.clone(),
    candidate_name: candidate.name.clone(),
    overall_score: overall,
    skill_match_score: scores.skills.score,
    experience_match_score: scores.experience_match,
    semantic_similarity_score: scores.semantic_similarity,
    matched_skills: scores.skills.matched.clone(),
    missing_skills: scores.skills.missing.clone(),
    extra_skills: scores.skills.extra.clone(),
    strengths,
    weaknesses,
    reasoning,
    recommendation,
    narrative_status,
    job_fingerprint: job.fingerprint.clone(),
    candidate_fingerprint: candidate_fingerprint(candidate)?,
    created_at: Utc::now(),
  })
}

/// Order-preserving dedupe; the first occurrence wins.
fn dedupe(ids: impl IntoIterator<Item = CandidateId>) -> Vec<CandidateId> {
  let mut seen = HashSet::new();
  ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn skipped(failures: Vec<(CandidateId, Error)>) -> Vec<SkippedCandidate> {
  let mut skipped: Vec<_> = failures
    .into_iter()
    .map(|(candidate_id, e)| SkippedCandidate { candidate_id, reason: e.to_string() })
    .collect();
  skipped.sort_by(|a, b| a.candidate_id.cmp(&b.candidate_id));
  skipped
}

fn unwrap_join<T>(joined: std::result::Result<T, tokio::task::JoinError>) -> T {
  match joined {
    Ok(value) => value,
    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
    // Tasks are only cancelled by dropping the set, which also drops us.
    Err(e) => unreachable!("assessment task cancelled: {e}"),
  }
}
