//! Service error types with HTTP status code mapping.
//!
//! [`QcError`] is the central error type. Each variant maps to a specific
//! HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "permission denied: viewer@example.com may not modify review state",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see ranges on [`QcError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                   |
/// |-----------|-----------------------|-------------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request               |
/// | 2000–2999 | Authorization         | 403 Forbidden                 |
/// | 3000–3999 | Server                | 500 Internal Server Error     |
/// | 5000–5999 | Upstream store        | 503 Service Unavailable       |
#[derive(Debug, thiserror::Error)]
pub enum QcError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Issue key is not one of the known defect flags.
    #[error("invalid issue_key '{0}'")]
    InvalidIssueKey(String),

    /// Status filter is not `All`, `REVIEWED` or `NOT_REVIEWED`.
    #[error("invalid status filter '{0}'")]
    InvalidStatusFilter(String),

    /// Actor is not a syntactically valid email.
    #[error("invalid actor email '{0}'")]
    InvalidActor(String),

    /// Actor's role does not allow writes.
    #[error("permission denied: {actor} may not modify review state")]
    PermissionDenied {
        /// Email of the rejected actor.
        actor: String,
    },

    /// No review store is configured; the service only serves reads.
    #[error("review store not configured; system is read-only")]
    ReadOnly,

    /// The analytical source store failed.
    #[error("source store unavailable: {0}")]
    SourceUnavailable(String),

    /// The review-state store failed.
    #[error("review store unavailable: {0}")]
    ReviewStoreUnavailable(String),

    /// The analytical audit sink rejected or could not take a write.
    #[error("audit sink unavailable: {0}")]
    AuditSinkUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QcError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidIssueKey(_) => 1002,
            Self::InvalidStatusFilter(_) => 1003,
            Self::InvalidActor(_) => 1004,
            Self::PermissionDenied { .. } => 2003,
            Self::Internal(_) => 3000,
            Self::ReadOnly => 5001,
            Self::SourceUnavailable(_) => 5002,
            Self::ReviewStoreUnavailable(_) => 5003,
            Self::AuditSinkUnavailable(_) => 5004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidIssueKey(_)
            | Self::InvalidStatusFilter(_)
            | Self::InvalidActor(_) => StatusCode::BAD_REQUEST,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ReadOnly
            | Self::SourceUnavailable(_)
            | Self::ReviewStoreUnavailable(_)
            | Self::AuditSinkUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for QcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_is_forbidden() {
        let err = QcError::PermissionDenied {
            actor: "v@example.com".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), 2003);
    }

    #[test]
    fn upstream_failures_are_unavailable() {
        assert_eq!(QcError::ReadOnly.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            QcError::SourceUnavailable("timeout".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn audit_sink_failure_has_its_own_code() {
        let err = QcError::AuditSinkUnavailable("timeout".to_string());
        assert_eq!(err.error_code(), 5004);
        assert!(err.to_string().starts_with("audit sink unavailable"));
    }

    #[test]
    fn response_carries_status() {
        let response = QcError::InvalidIssueKey("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
