use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use sepsis_triage::TriageError;

pub const NOT_READY_DETAIL: &str = "Service not ready: clinical artifacts are still loading";

/// Errors returned to HTTP clients as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", NOT_READY_DETAIL)]
    NotReady,
    #[error("Model artifacts not loaded: {0}")]
    ArtifactMissing(String),
    #[error("{0}")]
    Scoring(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Method Not Allowed. Use POST {0} with a JSON body.")]
    MethodNotAllowed(&'static str),
    #[error("Invalid request body: {detail}")]
    InvalidBody { status: StatusCode, detail: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::ArtifactMissing(_) | ApiError::Scoring(_) | ApiError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::ArtifactMissing(detail) => ApiError::ArtifactMissing(detail),
            other => ApiError::Scoring(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            log::error!("request failed: {self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triage_errors_map_to_server_errors() {
        let missing: ApiError = TriageError::ArtifactMissing("severity model".into()).into();
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(missing.to_string(), "Model artifacts not loaded: severity model");

        let malformed: ApiError = TriageError::MalformedArtifact("bad".into()).into();
        assert!(matches!(malformed, ApiError::Scoring(_)));
    }

    #[test]
    fn guidance_message_names_the_path() {
        let err = ApiError::MethodNotAllowed("/severity");
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            err.to_string(),
            "Method Not Allowed. Use POST /severity with a JSON body."
        );
        assert_eq!(ApiError::NotReady.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::NotReady.to_string(), NOT_READY_DETAIL);
    }

    #[test]
    fn invalid_body_keeps_the_rejection_status() {
        let err = ApiError::InvalidBody {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "missing field".into(),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Invalid request body: missing field");
    }
}
