//! JSON REST API for the hirerank engine.
//!
//! Exposes an axum [`Router`] over an [`Engine`] whose backend can also write
//! profiles. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = Arc::new(AppState { engine, precompute });
//! let app = Router::new().nest("/api", hirerank_api::api_router(state));
//! ```

pub mod assessments;
pub mod error;
pub mod jobs;
pub mod profiles;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use hirerank_core::{narrative::NarrativeGenerator, store::ProfileWriter};
use hirerank_engine::{Backend, Engine, Precompute};

pub use error::ApiError;

/// Shared handler state.
pub struct AppState<S, N> {
  pub engine:     Engine<S, N>,
  pub precompute: Arc<Precompute>,
}

/// Bounds every handler needs on the backend and generator.
pub trait ApiBackend: Backend + ProfileWriter {}

impl<T: Backend + ProfileWriter> ApiBackend for T {}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(state: Arc<AppState<S, N>>) -> Router<()>
where
  S: ApiBackend,
  N: NarrativeGenerator + 'static,
{
  Router::new()
    // Assessments
    .route("/assessments", post(assessments::assess::<S, N>))
    .route(
      "/assessments/{job_id}/{candidate_id}",
      get(assessments::get_cached::<S, N>).delete(assessments::invalidate::<S, N>),
    )
    // Rankings
    .route("/jobs/{job_id}/ranking", get(jobs::rank::<S, N>))
    .route("/jobs/{job_id}/ranking/stored", get(jobs::stored::<S, N>))
    .route("/jobs/{job_id}/compare", post(jobs::compare::<S, N>))
    .route("/jobs/{job_id}/precompute", post(jobs::precompute::<S, N>))
    .route("/jobs/{job_id}/assessments", delete(jobs::invalidate_all::<S, N>))
    .route(
      "/candidates/{candidate_id}/assessments",
      delete(profiles::invalidate_candidate::<S, N>),
    )
    // Profiles
    .route(
      "/jobs/{job_id}",
      put(profiles::put_job::<S, N>)
        .get(profiles::get_job::<S, N>)
        .delete(profiles::delete_job::<S, N>),
    )
    .route(
      "/candidates/{candidate_id}",
      put(profiles::put_candidate::<S, N>)
        .get(profiles::get_candidate::<S, N>)
        .delete(profiles::delete_candidate::<S, N>),
    )
    .with_state(state)
}
