use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::store::EngineError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

/// Maps engine failures to responses; storage causes are logged, never returned.
pub(crate) fn map_engine_error(error: EngineError, context: &str) -> ApiError {
    match error {
        EngineError::InvalidRegions(err) => ApiError::BadRequest(err.to_string()),
        EngineError::ScoreMismatch(err) => ApiError::BadRequest(err.to_string()),
        EngineError::NotFound(message) => ApiError::NotFound(message),
        EngineError::Storage(err) if is_unique_violation(&err) => {
            ApiError::Conflict("A concurrent update touched the same record; retry".to_string())
        }
        EngineError::Storage(err) => ApiError::internal(err, context),
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some("23505"),
        _ => false,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::ServiceUnavailable(message) => {
                tracing::warn!(error = %message, "Service unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, message)
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::regions::RegionValidationError;

    #[test]
    fn engine_errors_map_to_client_statuses() {
        let invalid = EngineError::InvalidRegions(RegionValidationError::NonPositiveQuestion);
        assert!(matches!(map_engine_error(invalid, "ctx"), ApiError::BadRequest(_)));

        let missing = EngineError::material_not_found("doc");
        match map_engine_error(missing, "ctx") {
            ApiError::NotFound(message) => assert!(message.contains("doc")),
            other => panic!("unexpected {other:?}"),
        }

        let storage = EngineError::Storage(sqlx::Error::PoolTimedOut);
        match map_engine_error(storage, "Failed to load regions") {
            ApiError::Internal(message) => assert_eq!(message, "Failed to load regions"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_body_carries_status_and_detail() {
        let response = ApiError::NotFound("Round missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["detail"], "Round missing");
    }
}
