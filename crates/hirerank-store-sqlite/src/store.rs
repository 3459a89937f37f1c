//! [`SqliteStore`]: the SQLite implementation of the hirerank storage
//! traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use hirerank_core::{
  fingerprint::{candidate_fingerprint, job_fingerprint},
  profile::{CandidateId, CandidateProfile, JobId, JobProfile},
  report::AssessmentReport,
  scoring::cosine_similarity,
  store::{AssessmentCache, ProfileStore, ProfileWriter, SimilarityRetriever, UpsertOutcome},
};

use crate::{
  Result,
  encode::{ASSESSMENT_COLUMNS, EncodedAssessment, RawAssessment, decode_json, encode_dt, encode_json},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Profiles and assessment reports backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_profile<T>(&self, sql: &'static str, id: String) -> Result<Option<T>>
  where
    T: serde::de::DeserializeOwned,
  {
    let json: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id], |row| row.get(0))
            .optional()?,
        )
      })
      .await?;
    json.as_deref().map(decode_json).transpose()
  }

  async fn delete_assessments(&self, sql: &'static str, id: String) -> Result<usize> {
    let n = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params![id])?))
      .await?;
    Ok(n)
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = crate::Error;

  async fn get_job(&self, id: &JobId) -> Result<Option<JobProfile>> {
    self
      .load_profile("SELECT profile_json FROM jobs WHERE job_id = ?1", id.0.clone())
      .await
  }

  async fn get_candidate(&self, id: &CandidateId) -> Result<Option<CandidateProfile>> {
    self
      .load_profile(
        "SELECT profile_json FROM candidates WHERE candidate_id = ?1",
        id.0.clone(),
      )
      .await
  }

  async fn list_candidates_for_job(&self, job: &JobId) -> Result<Vec<CandidateId>> {
    let job_id = job.0.clone();

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT candidate_id FROM candidates WHERE job_id = ?1 ORDER BY candidate_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![job_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(CandidateId).collect())
  }
}

// ─── ProfileWriter impl ──────────────────────────────────────────────────────

impl ProfileWriter for SqliteStore {
  type Error = crate::Error;

  async fn upsert_job(&self, job: JobProfile) -> Result<UpsertOutcome> {
    let fingerprint  = job_fingerprint(&job)?;
    let profile_json = encode_json(&job)?;
    let job_id       = job.id.0.clone();
    let now          = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<String> = tx
          .query_row(
            "SELECT fingerprint FROM jobs WHERE job_id = ?1",
            rusqlite::params![job_id],
            |row| row.get(0),
          )
          .optional()?;

        let invalidated = match &previous {
          Some(old) if *old != fingerprint => tx.execute(
            "DELETE FROM assessments WHERE job_id = ?1",
            rusqlite::params![job_id],
          )?,
          _ => 0,
        };

        tx.execute(
          "INSERT INTO jobs (job_id, profile_json, fingerprint, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (job_id) DO UPDATE SET
             profile_json = excluded.profile_json,
             fingerprint  = excluded.fingerprint,
             updated_at   = excluded.updated_at",
          rusqlite::params![job_id, profile_json, fingerprint, now],
        )?;

        tx.commit()?;
        Ok(UpsertOutcome { created: previous.is_none(), invalidated })
      })
      .await?;

    if outcome.invalidated > 0 {
      tracing::debug!(job_id = %job.id, invalidated = outcome.invalidated, "job edited; reports invalidated");
    }
    Ok(outcome)
  }

  async fn upsert_candidate(&self, candidate: CandidateProfile) -> Result<UpsertOutcome> {
    let fingerprint  = candidate_fingerprint(&candidate)?;
    let profile_json = encode_json(&candidate)?;
    let embedding    = candidate.embedding.as_deref().map(encode_json).transpose()?;
    let candidate_id = candidate.id.0.clone();
    let job_id       = candidate.job_id.as_ref().map(|j| j.0.clone());
    let now          = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<String> = tx
          .query_row(
            "SELECT fingerprint FROM candidates WHERE candidate_id = ?1",
            rusqlite::params![candidate_id],
            |row| row.get(0),
          )
          .optional()?;

        let invalidated = match &previous {
          Some(old) if *old != fingerprint => tx.execute(
            "DELETE FROM assessments WHERE candidate_id = ?1",
            rusqlite::params![candidate_id],
          )?,
          _ => 0,
        };

        tx.execute(
          "INSERT INTO candidates
             (candidate_id, job_id, profile_json, embedding, fingerprint, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (candidate_id) DO UPDATE SET
             job_id       = excluded.job_id,
             profile_json = excluded.profile_json,
             embedding    = excluded.embedding,
             fingerprint  = excluded.fingerprint,
             updated_at   = excluded.updated_at",
          rusqlite::params![candidate_id, job_id, profile_json, embedding, fingerprint, now],
        )?;

        tx.commit()?;
        Ok(UpsertOutcome { created: previous.is_none(), invalidated })
      })
      .await?;

    if outcome.invalidated > 0 {
      tracing::debug!(
        candidate_id = %candidate.id,
        invalidated = outcome.invalidated,
        "candidate edited; reports invalidated"
      );
    }
    Ok(outcome)
  }

  async fn delete_job(&self, id: &JobId) -> Result<bool> {
    let job_id = id.0.clone();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM assessments WHERE job_id = ?1", rusqlite::params![job_id])?;
        tx.execute(
          "UPDATE candidates SET job_id = NULL WHERE job_id = ?1",
          rusqlite::params![job_id],
        )?;
        let n = tx.execute("DELETE FROM jobs WHERE job_id = ?1", rusqlite::params![job_id])?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn delete_candidate(&self, id: &CandidateId) -> Result<bool> {
    let candidate_id = id.0.clone();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "DELETE FROM assessments WHERE candidate_id = ?1",
          rusqlite::params![candidate_id],
        )?;
        let n = tx.execute(
          "DELETE FROM candidates WHERE candidate_id = ?1",
          rusqlite::params![candidate_id],
        )?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }
}

// ─── AssessmentCache impl ────────────────────────────────────────────────────

impl AssessmentCache for SqliteStore {
  type Error = crate::Error;

  async fn get(&self, job: &JobId, candidate: &CandidateId) -> Result<Option<AssessmentReport>> {
    let job_id       = job.0.clone();
    let candidate_id = candidate.0.clone();

    let raw: Option<RawAssessment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ASSESSMENT_COLUMNS} FROM assessments
                 WHERE job_id = ?1 AND candidate_id = ?2"
              ),
              rusqlite::params![job_id, candidate_id],
              RawAssessment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAssessment::into_report).transpose()
  }

  async fn put(&self, report: &AssessmentReport) -> Result<bool> {
    let encoded = EncodedAssessment::new(report)?;

    let stored = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<(String, String)> = tx
          .query_row(
            "SELECT j.fingerprint, c.fingerprint
             FROM jobs j, candidates c
             WHERE j.job_id = ?1 AND c.candidate_id = ?2",
            rusqlite::params![encoded.job_id, encoded.candidate_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        let fresh = current.is_some_and(|(job_fp, candidate_fp)| {
          job_fp == encoded.job_fingerprint && candidate_fp == encoded.candidate_fingerprint
        });
        if !fresh {
          return Ok(false);
        }

        tx.execute(
          "DELETE FROM assessments WHERE job_id = ?1 AND candidate_id = ?2",
          rusqlite::params![encoded.job_id, encoded.candidate_id],
        )?;
        encoded.insert(&tx)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !stored {
      tracing::debug!(
        job_id = %report.job_id,
        candidate_id = %report.candidate_id,
        "report computed from outdated profiles; not stored"
      );
    }
    Ok(stored)
  }

  async fn invalidate(&self, job: &JobId, candidate: &CandidateId) -> Result<bool> {
    let job_id       = job.0.clone();
    let candidate_id = candidate.0.clone();

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM assessments WHERE job_id = ?1 AND candidate_id = ?2",
          rusqlite::params![job_id, candidate_id],
        )?)
      })
      .await?;

    Ok(n > 0)
  }

  async fn invalidate_all_for_job(&self, job: &JobId) -> Result<usize> {
    self
      .delete_assessments("DELETE FROM assessments WHERE job_id = ?1", job.0.clone())
      .await
  }

  async fn invalidate_all_for_candidate(&self, candidate: &CandidateId) -> Result<usize> {
    self
      .delete_assessments(
        "DELETE FROM assessments WHERE candidate_id = ?1",
        candidate.0.clone(),
      )
      .await
  }

  async fn list_for_job(&self, job: &JobId) -> Result<Vec<AssessmentReport>> {
    let job_id = job.0.clone();

    let raws: Vec<RawAssessment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ASSESSMENT_COLUMNS} FROM assessments
           WHERE job_id = ?1
           ORDER BY overall_score DESC, candidate_id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![job_id], RawAssessment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssessment::into_report).collect()
  }
}

// ─── SimilarityRetriever impl ────────────────────────────────────────────────

impl SimilarityRetriever for SqliteStore {
  type Error = crate::Error;

  /// Brute-force cosine over every stored candidate embedding.
  async fn top_k(&self, embedding: &[f32], k: usize) -> Result<Vec<CandidateId>> {
    if k == 0 || embedding.is_empty() {
      return Ok(Vec::new());
    }

    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT candidate_id, embedding FROM candidates WHERE embedding IS NOT NULL",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut scored = Vec::with_capacity(rows.len());
    for (id, json) in rows {
      let stored: Vec<f32> = decode_json(&json)?;
      if stored.len() != embedding.len() {
        continue;
      }
      if let Some(sim) = cosine_similarity(embedding, &stored) {
        scored.push((sim, CandidateId(id)));
      }
    }

    scored.sort_by(|(sa, ia), (sb, ib)| sb.total_cmp(sa).then_with(|| ia.cmp(ib)));
    scored.truncate(k);
    Ok(scored.into_iter().map(|(_, id)| id).collect())
  }
}
