//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`. Domain error codes map to
//! status codes here and nowhere else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::domain::plan_request::WebhookError;

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// No usable identity headers.
    AuthenticationRequired,
    Domain(DomainError),
    Webhook(WebhookError),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        Self::Webhook(err)
    }
}

/// Status for a domain error category.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::QuestionNotFound
        | ErrorCode::PlanRequestNotFound
        | ErrorCode::GrantNotFound
        | ErrorCode::TechniqueNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidStateTransition
        | ErrorCode::WorkflowTerminal
        | ErrorCode::ConcursoLimitReached => StatusCode::CONFLICT,
        ErrorCode::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::AccessDenied | ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required"),
            ),
            ApiError::Domain(err) => {
                let status = status_for(err.code);
                if status.is_server_error() {
                    tracing::error!(code = %err.code, error = %err.message, "request failed");
                }
                let body = if err.details.is_empty() {
                    ErrorResponse::new(err.code.to_string(), err.message)
                } else {
                    let details = serde_json::to_value(&err.details).unwrap_or_default();
                    ErrorResponse::with_details(err.code.to_string(), err.message, details)
                };
                (status, body)
            }
            ApiError::Webhook(err) => {
                tracing::warn!(error = %err, "payment webhook rejected");
                (
                    err.status_code(),
                    ErrorResponse::new("WEBHOOK_REJECTED", err.to_string()),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_statuses() {
        assert_eq!(status_for(ErrorCode::QuestionNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::WorkflowTerminal), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::QuotaExceeded), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(status_for(ErrorCode::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorCode::ValidationFailed), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorCode::StorageUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn domain_error_response_carries_details() {
        let err = DomainError::new(ErrorCode::QuotaExceeded, "limit")
            .with_detail("upgrade_prompt", "upgrade now");
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn error_response_serializes_without_details_when_none() {
        let response = ErrorResponse::new("NOT_FOUND", "Not found");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("details"));
    }

    #[test]
    fn webhook_errors_use_their_own_status() {
        let response = ApiError::from(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
