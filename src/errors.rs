use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Error body returned to HTTP callers.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Forbidden")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Error taxonomy of the work order core.
///
/// Every variant is surfaced to the caller verbatim; the core performs no
/// retries for business-rule failures. Only notification delivery is
/// allowed to fail silently, and that path never produces a `ServiceError`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    /// Entity absent or soft-deleted.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Role or department authorization failure.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Action not defined for the work order's current status.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Missing or malformed action-specific fields.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Organization/department scoping violated.
    #[error("Department mismatch: {0}")]
    DepartmentMismatch(String),

    /// Lost a concurrent race on the same work order or counter scope.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Supervisor with no department in the active organization.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Directory lookup failed.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) | ServiceError::NotConfigured(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidAction(_)
            | ServiceError::InvalidPayload(_)
            | ServiceError::DepartmentMismatch(_)
            | ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::AuthError(_) => StatusCode::UNAUTHORIZED,
            ServiceError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal failures keep their detail in the logs, not the body.
        let message = match &self {
            ServiceError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error surfaced to handler");
                "Internal server error".to_string()
            }
            ServiceError::InternalError(e) => {
                tracing::error!(error = %e, "internal error surfaced to handler");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
