//! Domain error vocabulary.
//!
//! `ValidationError` is raised while building value objects; `DomainError`
//! is what services return and what the HTTP layer maps to status codes.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: &'static str },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: &'static str,
        min: i32,
        max: i32,
        actual: i32,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: &'static str) -> Self {
        Self::EmptyField { field }
    }

    pub fn out_of_range(field: &'static str, min: i32, max: i32, actual: i32) -> Self {
        Self::OutOfRange {
            field,
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyField { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidFormat { field, .. } => field,
        }
    }
}

/// Stable machine-readable codes, serialized in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,

    QuestionNotFound,
    PlanRequestNotFound,
    GrantNotFound,
    TechniqueNotFound,

    InvalidStateTransition,
    WorkflowTerminal,
    ConcursoLimitReached,

    QuotaExceeded,
    AccessDenied,
    Forbidden,

    StorageUnavailable,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::QuestionNotFound => "QUESTION_NOT_FOUND",
            Self::PlanRequestNotFound => "PLAN_REQUEST_NOT_FOUND",
            Self::GrantNotFound => "GRANT_NOT_FOUND",
            Self::TechniqueNotFound => "TECHNIQUE_NOT_FOUND",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::WorkflowTerminal => "WORKFLOW_TERMINAL",
            Self::ConcursoLimitReached => "CONCURSO_LIMIT_REACHED",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::Forbidden => "FORBIDDEN",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every service operation.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Validation failure tagged with the field name.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageUnavailable, message)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.field(), err.to_string())
    }
}
