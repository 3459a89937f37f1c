//! Handlers for `/assessments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/assessments` | Body: [`AssessBody`]; cache-first unless `force_refresh` |
//! | `GET`    | `/assessments/{job_id}/{candidate_id}` | Cached report only; 404 if none |
//! | `DELETE` | `/assessments/{job_id}/{candidate_id}` | Drop the cached report |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hirerank_core::{
  narrative::NarrativeGenerator,
  profile::{CandidateId, JobId},
  report::AssessmentReport,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiBackend, AppState, error::ApiError};

// ─── Assess ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssessBody {
  pub job_id:        JobId,
  pub candidate_id:  CandidateId,
  #[serde(default)]
  pub force_refresh: bool,
}

/// `POST /assessments`
pub async fn assess<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Json(body): Json<AssessBody>,
) -> Result<Json<AssessmentReport>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let report = state
    .engine
    .assess(&body.job_id, &body.candidate_id, body.force_refresh)
    .await?;
  Ok(Json(report))
}

// ─── Cached ───────────────────────────────────────────────────────────────────

/// `GET /assessments/{job_id}/{candidate_id}`
pub async fn get_cached<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path((job_id, candidate_id)): Path<(JobId, CandidateId)>,
) -> Result<Json<AssessmentReport>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let report = state
    .engine
    .cached(&job_id, &candidate_id)
    .await?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no assessment of {candidate_id} for {job_id}"))
    })?;
  Ok(Json(report))
}

// ─── Invalidate ───────────────────────────────────────────────────────────────

/// `DELETE /assessments/{job_id}/{candidate_id}` returns `{"invalidated": bool}`
pub async fn invalidate<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path((job_id, candidate_id)): Path<(JobId, CandidateId)>,
) -> Result<Json<Value>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let removed = state.engine.invalidate(&job_id, &candidate_id).await?;
  Ok(Json(json!({ "invalidated": removed })))
}
