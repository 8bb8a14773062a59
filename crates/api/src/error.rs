use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jobwire_core::error::{CodecError, ValidationError};

use crate::engine::{GatewayError, SubmissionError, TrackerError};
use crate::response::ErrorResponse;

/// Application-level error type for HTTP handlers.
///
/// Every variant maps to an HTTP status, a numeric `status_code` and a
/// short message; the `error` field carries the detail.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status, numeric code and message for this error.
    pub fn classify(&self) -> (StatusCode, u16, &'static str) {
        match self {
            AppError::Validation(err) => {
                let message = match err {
                    ValidationError::InvalidBody => "Invalid JSON Format",
                    ValidationError::MissingOperation => "Missing Task Identity",
                    ValidationError::UnknownDomain(_) => "Unknown Domain",
                    ValidationError::InvalidParameters => "Invalid Parameters",
                    ValidationError::InvalidArgs => "Invalid Arguments",
                    ValidationError::InvalidKwargs => "Invalid Keyword Arguments",
                    ValidationError::MalformedArgument { .. } => "Malformed Argument",
                };
                (StatusCode::BAD_REQUEST, err.code(), message)
            }
            AppError::Gateway(GatewayError::InvalidEnvelope(err)) => {
                let message = match err {
                    CodecError::UnsupportedKind(_) => "Unsupported Value Kind",
                    CodecError::ShapeMismatch(_) => "Array Shape Mismatch",
                    CodecError::ImageDecode(_) => "Invalid Image Payload",
                    CodecError::MalformedPayload { .. } => "Malformed Value Payload",
                };
                (StatusCode::UNPROCESSABLE_ENTITY, err.code(), message)
            }
            AppError::Gateway(GatewayError::Submission(err)) => match err {
                SubmissionError::Unserializable(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    5002,
                    "Task submission failed",
                ),
                SubmissionError::BrokerUnavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    5003,
                    "Broker unavailable",
                ),
                SubmissionError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, 5000, "Unknown Error")
                }
            },
            AppError::Tracker(TrackerError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, 4040, "Task not found")
            }
            AppError::Tracker(TrackerError::StoreUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                5004,
                "Result store unavailable",
            ),
            AppError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, 5000, "Unknown Error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, status_code, message) = self.classify();

        let error = if status.is_server_error() {
            tracing::error!(error = %self, status_code, "Request failed");
            match &self {
                AppError::InternalError(_)
                | AppError::Gateway(GatewayError::Submission(SubmissionError::Internal(_))) => {
                    "An internal error occurred".to_string()
                }
                other => other.to_string(),
            }
        } else {
            tracing::debug!(error = %self, status_code, "Request rejected");
            self.to_string()
        };

        let body = ErrorResponse {
            status_code,
            message: message.to_string(),
            error,
        };
        (status, axum::Json(body)).into_response()
    }
}
