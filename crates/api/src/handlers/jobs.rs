//! Handlers for job submission and status polling.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use jobwire_core::envelope;
use jobwire_core::error::ValidationError;
use jobwire_core::types::JobId;

use crate::error::AppResult;
use crate::response::{StatusResponse, SubmitResponse};
use crate::state::AppState;

/// POST /api/v1/process
///
/// The body is read raw so that non-JSON input gets the same error shape
/// as any other validation failure.
pub async fn submit_job(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
    let raw: serde_json::Value =
        serde_json::from_slice(&body).map_err(|_| ValidationError::InvalidBody)?;
    let envelope = envelope::validate(&raw)?;

    let job = state.gateway.submit(envelope).await?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse::accepted(job.id))))
}

/// GET /api/v1/status/{job_id}
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    let job_id = JobId::from(job_id);
    let job_state = state.tracker.query(&job_id).await?;
    Ok(Json(StatusResponse::from(job_state)))
}
