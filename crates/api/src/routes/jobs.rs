use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Job routes, mounted under `/api/v1`.
///
/// ```text
/// POST /process              submit a job
/// GET  /status/{job_id}      poll job state
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/process", post(jobs::submit_job))
        .route("/status/{job_id}", get(jobs::job_status))
}
