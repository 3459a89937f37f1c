//! Handlers for per-job ranking endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/jobs/{job_id}/ranking` | `?force_refresh=true` recomputes every pair |
//! | `GET`    | `/jobs/{job_id}/ranking/stored` | Cached reports only; optional `?limit=` |
//! | `POST`   | `/jobs/{job_id}/compare` | Body: [`CompareBody`] |
//! | `POST`   | `/jobs/{job_id}/precompute` | 202; coalesced if already queued |
//! | `DELETE` | `/jobs/{job_id}/assessments` | Drop every cached report for the job |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hirerank_core::{
  narrative::NarrativeGenerator,
  profile::{CandidateId, JobId},
  report::RankingResult,
  store::ProfileStore as _,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiBackend, AppState, error::ApiError};

// ─── Rank ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RankParams {
  #[serde(default)]
  pub force_refresh: bool,
}

/// `GET /jobs/{job_id}/ranking[?force_refresh=true]`
pub async fn rank<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
  Query(params): Query<RankParams>,
) -> Result<Json<RankingResult>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let result = state.engine.rank(&job_id, params.force_refresh).await?;
  Ok(Json(result))
}

// ─── Stored ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct StoredParams {
  pub limit: Option<usize>,
}

/// `GET /jobs/{job_id}/ranking/stored[?limit=N]`
pub async fn stored<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
  Query(params): Query<StoredParams>,
) -> Result<Json<RankingResult>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let result = state.engine.stored_ranking(&job_id, params.limit).await?;
  Ok(Json(result))
}

// ─── Compare ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CompareBody {
  pub candidate_ids: Vec<CandidateId>,
  #[serde(default)]
  pub force_refresh: bool,
}

/// `POST /jobs/{job_id}/compare`, body: `{"candidate_ids": [...]}`
pub async fn compare<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
  Json(body): Json<CompareBody>,
) -> Result<Json<RankingResult>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  if body.candidate_ids.is_empty() {
    return Err(ApiError::BadRequest("candidate_ids must not be empty".into()));
  }
  let result = state
    .engine
    .compare(&job_id, &body.candidate_ids, body.force_refresh)
    .await?;
  Ok(Json(result))
}

// ─── Precompute ───────────────────────────────────────────────────────────────

/// `POST /jobs/{job_id}/precompute` returns 202 with `{"status": "queued"}` or
/// `{"status": "already_queued"}`; 404 for an unknown job.
pub async fn precompute<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  state
    .engine
    .backend()
    .get_job(&job_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;

  let status = match state.precompute.schedule_precompute(job_id) {
    Ok(()) => "queued",
    Err(hirerank_engine::Error::AlreadyQueued(_)) => "already_queued",
    Err(e) => return Err(e.into()),
  };
  Ok((StatusCode::ACCEPTED, Json(json!({ "status": status }))))
}

// ─── Invalidate ───────────────────────────────────────────────────────────────

/// `DELETE /jobs/{job_id}/assessments` returns `{"invalidated": n}`
pub async fn invalidate_all<S, N>(
  State(state): State<Arc<AppState<S, N>>>,
  Path(job_id): Path<JobId>,
) -> Result<Json<Value>, ApiError>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  let n = state.engine.invalidate_for_job(&job_id).await?;
  Ok(Json(json!({ "invalidated": n })))
}
