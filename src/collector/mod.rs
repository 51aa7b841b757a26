//! Submission to the external form collector
//!
//! The collector is a third-party form service. Submissions are posted to a
//! fixed per-form endpoint, keyed by opaque per-field tokens. Its responses
//! are not readable, so delivery is acknowledged optimistically:
//! reaching the network layer without an error counts as success.

pub mod adapter;
pub mod client;
pub mod mapping;

pub use adapter::{AcknowledgmentPolicy, Dispatch, SubmissionAdapter};
pub use client::HttpTransport;
pub use mapping::{FieldMapping, FormEndpoint};

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// What the transport learned about a delivered request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The request went out; nothing about the response is observable
    Opaque,
    /// The request went out and the collector answered with this status
    Status(u16),
}

/// Trait for form collector transports
#[async_trait]
pub trait FormTransport: Send + Sync {
    /// POST the url-encoded `payload` to `endpoint`
    async fn post_form(
        &self,
        endpoint: &Url,
        payload: &[(String, String)],
    ) -> Result<Delivery, TransportError>;
}

/// Errors raised while delivering a submission
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
