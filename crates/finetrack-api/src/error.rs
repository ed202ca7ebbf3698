//! Structured error type implementing `axum::response::IntoResponse`.
//! Every handler failure is converted here into a uniform JSON body
//! `{"error": {"code", "message"}}`; storage/dependency detail is
//! logged, never echoed to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use finetrack_db::StoreError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unique-constraint clash, e.g. duplicate email (400 per the API
    /// contract, not 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing, invalid or expired credential (401).
    #[error("unauthorized: {0}")]
    Auth(String),

    /// Valid credential, insufficient role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity absent (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage or credential-subsystem failure (500). Message is logged
    /// but not returned to the client.
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Conflict(_) => (StatusCode::BAD_REQUEST, "CONFLICT"),
            Self::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Dependency(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Dependency(_) => {
                tracing::error!(error = %self, "dependency failure");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Dependency(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let cases = [
            (ApiError::Validation("v".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (ApiError::Conflict("c".into()), StatusCode::BAD_REQUEST, "CONFLICT"),
            (ApiError::Auth("a".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (ApiError::Forbidden("f".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (ApiError::NotFound("n".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ApiError::Dependency("d".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            let (s, c) = err.status_and_code();
            assert_eq!(s, status);
            assert_eq!(c, code);
        }
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err = ApiError::from(StoreError::Conflict("duplicate email".into()));
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err = ApiError::from(StoreError::NotFound("payment gone".into()));
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn store_sqlite_maps_to_dependency() {
        let err = ApiError::from(StoreError::Poisoned);
        assert!(matches!(err, ApiError::Dependency(_)));
    }

    #[tokio::test]
    async fn dependency_detail_is_hidden_from_the_client() {
        use http_body_util::BodyExt;

        let response = ApiError::Dependency("db socket closed".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("socket"));
    }
}
