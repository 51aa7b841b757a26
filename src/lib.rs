//! Form Intake - validation, sanitization and throttling for web form submissions
//!
//! Submissions pass through a fixed sequence of guards before being forwarded
//! to an external form collector:
//!
//! 1. **Rate limiting**: a fixed-window attempt budget per form kind
//! 2. **Validation**: per-field required, length and format rules
//! 3. **Sanitization**: markup and script-scheme stripping, email and URL normalization
//! 4. **Submission**: mapping to the collector's field tokens and a url-encoded POST
//!
//! Any stage can reject the submission, in which case later stages never run.
//! The collector's response is opaque, so an accepted submission means the
//! collector was reached, not that it stored the data.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use form_intake::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("config.toml")?;
//!
//!     let transport = Arc::new(HttpTransport::new(&config.collector)?);
//!     let intake = FormIntake::from_config(&config, transport, Arc::new(RateLimiter::new()), None)?;
//!
//!     let mut fields = FieldValues::new();
//!     fields.insert("name".into(), "Ann".into());
//!     fields.insert("email".into(), "ann@example.com".into());
//!     fields.insert("subject".into(), "Hello".into());
//!     fields.insert("message".into(), "I'd like to get in touch.".into());
//!
//!     let outcome = intake.submit(FormKind::Contact, None, &fields).await?;
//!     println!("{}: {}", outcome.title(), outcome.user_message());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod observability;
pub mod shutdown;

pub use config::Config;
pub use error::{IntakeError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::collector::{AcknowledgmentPolicy, FormTransport, HttpTransport, SubmissionAdapter};
    pub use crate::config::Config;
    pub use crate::error::{IntakeError, Result};
    pub use crate::forms::{
        FieldValues, FormIntake, FormKind, FormPipeline, FormSchema, RejectReason, SubmissionOutcome,
    };
    pub use crate::middleware::{InputValidator, RateLimitPolicy, RateLimiter};
    pub use crate::observability::MetricsCollector;
}
