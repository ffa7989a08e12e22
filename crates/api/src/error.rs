//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::AlreadyExists(_) | DomainError::InvalidStatusTransition { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DomainError::InvalidInput(_) | DomainError::EmptyCart => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DomainError::Store(store_err) => {
            // Storage details are logged, never returned to the client.
            tracing::error!(error = %store_err, "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::OrderStatus;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        assert_eq!(
            status_of(DomainError::not_found("product", 7)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::AlreadyExists("product")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::InvalidStatusTransition {
                from: OrderStatus::Created,
                to: OrderStatus::Completed,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::InvalidInput("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DomainError::EmptyCart), StatusCode::BAD_REQUEST);
    }
}
