//! API error handling
//!
//! Every response body has the `{success, error?, error_kind?, data?}`
//! shape of [`OperationOutcome`], whether it comes from the ledger or from
//! a rejected request.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_ledger::{ErrorKind, OperationOutcome};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Missing or invalid X-User-Id header")]
    Unauthorized,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("{message}")]
    Ledger { kind: ErrorKind, message: String },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ledger { kind, .. } => status_for(*kind),
        }
    }

    fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Ledger { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// HTTP status for a ledger error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::DuplicateReference | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::TransactionFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_kind: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON whose values do not fit the request type
            JsonRejection::JsonDataError(error) => ApiError::Ledger {
                kind: ErrorKind::Validation,
                message: error.body_text(),
            },
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// A ledger outcome rendered with the status its error kind implies
#[derive(Debug)]
pub struct ApiOutcome<T> {
    success_status: StatusCode,
    outcome: OperationOutcome<T>,
}

impl<T> ApiOutcome<T> {
    /// 200 on success
    pub fn ok(outcome: OperationOutcome<T>) -> Self {
        Self {
            success_status: StatusCode::OK,
            outcome,
        }
    }

    /// 201 on success
    pub fn created(outcome: OperationOutcome<T>) -> Self {
        Self {
            success_status: StatusCode::CREATED,
            outcome,
        }
    }
}

impl<T> From<OperationOutcome<T>> for ApiOutcome<T> {
    fn from(outcome: OperationOutcome<T>) -> Self {
        Self::ok(outcome)
    }
}

impl<T: Serialize> IntoResponse for ApiOutcome<T> {
    fn into_response(self) -> Response {
        let status = if self.outcome.success {
            self.success_status
        } else {
            status_for(
                self.outcome
                    .error_kind
                    .unwrap_or(ErrorKind::TransactionFailure),
            )
        };
        (status, Json(self.outcome)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_ledger::LedgerError;

    #[test]
    fn test_kind_to_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::DuplicateReference), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::TransactionFailure),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_failed_outcome_uses_kind_status() {
        let outcome: OperationOutcome<()> =
            OperationOutcome::failed(&LedgerError::DuplicateReference("INV-1".into()));
        let response = ApiOutcome::created(outcome).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_successful_outcome_uses_success_status() {
        let response = ApiOutcome::created(OperationOutcome::ok(1)).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_unauthorized_has_no_kind() {
        let error = ApiError::Unauthorized;
        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
        assert!(error.kind().is_none());
    }
}
