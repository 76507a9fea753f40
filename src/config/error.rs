use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment could not be read or a value has the wrong type.
    #[error("cannot load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A value that parsed but makes no sense for this service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be set")]
    MissingRequired(&'static str),

    #[error("server.port must be non-zero")]
    InvalidPort,

    #[error("server.request_timeout_secs must be between 1 and 300")]
    InvalidTimeout,

    #[error("'{0}' is not a bindable socket address")]
    InvalidSocketAddr(String),

    #[error("access.free_question_limit must be at least 1")]
    InvalidQuestionLimit,

    #[error("payment.abandon_after_hours must be at least 1")]
    InvalidAbandonWindow,

    #[error("payment.payment_link_base must start with http:// or https://")]
    InvalidPaymentLink,
}
