//! Error types for the form intake service

use thiserror::Error;

/// Result type alias for form intake operations
pub type Result<T> = std::result::Result<T, IntakeError>;

/// Main error type for the form intake service
///
/// Pipeline stages never surface these to callers: rejections are reported as
/// [`crate::forms::SubmissionOutcome`] values. `IntakeError` covers startup
/// (configuration, client construction) and the internals of the adapter.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Transport error: {0}")]
    Transport(#[from] crate::collector::TransportError),

    #[error("Rate limit error: {0}")]
    RateLimit(#[from] crate::middleware::RateLimitError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for IntakeError {
    fn from(err: config::ConfigError) -> Self {
        IntakeError::Config(err.to_string())
    }
}
