//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use supplement_core::{FhirError, IssueType, OperationOutcome};

use crate::insights::InsightError;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, outcome) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, OperationOutcome::not_found(&msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, OperationOutcome::invalid(&msg)),
            AppError::BadGateway(msg) => (
                StatusCode::BAD_GATEWAY,
                OperationOutcome::error(IssueType::Transient, &msg),
            ),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                OperationOutcome::error(IssueType::NotSupported, &msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                OperationOutcome::error(IssueType::Exception, &msg),
            ),
        };

        (status, Json(outcome)).into_response()
    }
}

impl From<FhirError> for AppError {
    fn from(err: FhirError) -> Self {
        match err {
            FhirError::NotFound(msg) => AppError::NotFound(msg),
            FhirError::Invalid(msg) => AppError::BadRequest(msg),
            FhirError::Transport(msg) => {
                tracing::error!(error = %msg, "FHIR backend transport failure");
                AppError::BadGateway(msg)
            }
            // Malformed data is degraded inside the core; reaching here means
            // the backend answered with something that is not a collection at all
            FhirError::Malformed(msg) => AppError::BadGateway(format!("Malformed backend response: {}", msg)),
        }
    }
}

impl From<InsightError> for AppError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::NotConfigured => AppError::Unavailable(err.to_string()),
            other => {
                tracing::error!(error = %other, "Insight service failure");
                AppError::BadGateway(other.to_string())
            }
        }
    }
}
