//! Handlers for profile upload and removal.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `PUT`    | `/jobs/{job_id}` | Body: job profile; 201 when new, 200 when replaced |
//! | `GET`    | `/jobs/{job_id}` | |
//! | `DELETE` | `/jobs/{job_id}` | 204; also drops the job's reports |
//! | `PUT`    | `/candidates/{candidate_id}` | Body: candidate profile |
//! | `GET`    | `/candidates/{candidate_id}` | |
//! | `DELETE` | `/candidates/{candidate_id}` | 204; also drops the candidate's reports |
//! | `DELETE` | `/candidates/{candidate_id}/assessments` | `{"invalidated": n}` |
//!
//! Replacing a profile with different content invalidates the reports that
//! used it; an identical re-upload leaves them in place.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hirerank_core::{
  narrative::NarrativeGenerator,
  profile::{CandidateId, CandidateProfile, JobId, JobProfile},
  store::{ProfileStore, ProfileWriter, UpsertOutcome},
};
use serde_json::{Value, json};

use crate::{ApiBackend, AppState, error::ApiError};

fn upsert_response(outcome: UpsertOutcome) -> impl IntoResponse {
  let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
  let body = json!({ "created": outcome.created, "invalidated": outcome.invalidated });
  (status, Json(body))
}

// ─── Jobs ─────────────────────────────────────────────────────────────────────

/// `PUT /jobs/{job_id}`
pub async fn put_job<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
  Json(job): Json<JobProfile>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  if job.id != job_id {
    return Err(ApiError::BadRequest(format!(
      "body id {} does not match path id {job_id}",
      job.id
    )));
  }
  let outcome = ProfileWriter::upsert_job(&**state.engine.backend(), job)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(upsert_response(outcome))
}

/// `GET /jobs/{job_id}`
pub async fn get_job<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
) -> Result<Json<JobProfile>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let job = ProfileStore::get_job(&**state.engine.backend(), &job_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;
  Ok(Json(job))
}

/// `DELETE /jobs/{job_id}`
pub async fn delete_job<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
) -> Result<StatusCode, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let deleted = ProfileWriter::delete_job(&**state.engine.backend(), &job_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("job {job_id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Candidates ───────────────────────────────────────────────────────────────

/// `PUT /candidates/{candidate_id}`
pub async fn put_candidate<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(candidate_id): Path<CandidateId>,
  Json(candidate): Json<CandidateProfile>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  if candidate.id != candidate_id {
    return Err(ApiError::BadRequest(format!(
      "body id {} does not match path id {candidate_id}",
      candidate.id
    )));
  }
  let outcome = ProfileWriter::upsert_candidate(&**state.engine.backend(), candidate)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(upsert_response(outcome))
}

/// `GET /candidates/{candidate_id}`
pub async fn get_candidate<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(candidate_id): Path<CandidateId>,
) -> Result<Json<CandidateProfile>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let candidate = ProfileStore::get_candidate(&**state.engine.backend(), &candidate_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("candidate {candidate_id} not found")))?;
  Ok(Json(candidate))
}

/// `DELETE /candidates/{candidate_id}`
pub async fn delete_candidate<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(candidate_id): Path<CandidateId>,
) -> Result<StatusCode, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let deleted = ProfileWriter::delete_candidate(&**state.engine.backend(), &candidate_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("candidate {candidate_id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /candidates/{candidate_id}/assessments` returns `{"invalidated": n}`
pub async fn invalidate_candidate<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(candidate_id): Path<CandidateId>,
) -> Result<Json<Value>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let n = state.engine.invalidate_for_candidate(&candidate_id).await?;
  Ok(Json(json!({ "invalidated": n })))
}
