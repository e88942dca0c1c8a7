//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, RepositoryError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed id, query or body.
    BadRequest(String),
    /// Error returned by a use case.
    Domain(DomainError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => domain_error_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Domain(err) => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        } else {
            tracing::warn!(%status, error = %message, "request rejected");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::ClientNotFound(_)
        | DomainError::ClientNotFoundByCpf(_)
        | DomainError::ProductNotFound(_)
        | DomainError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::InvalidOrderOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::InvalidClient(_) | DomainError::InvalidProduct(_) => StatusCode::BAD_REQUEST,
        DomainError::ClientAlreadyExists(_) => StatusCode::CONFLICT,
        DomainError::Repository(
            RepositoryError::ConcurrencyConflict { .. } | RepositoryError::Duplicate(_),
        ) => StatusCode::CONFLICT,
        DomainError::Repository(RepositoryError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Payment(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
