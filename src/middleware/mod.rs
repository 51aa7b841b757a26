//! Submission guards: rate limiting, validation and sanitization

pub mod clock;
pub mod rate_limiter;
pub mod sanitizer;
pub mod validator;

pub use clock::{Clock, SystemClock};
pub use rate_limiter::{RateLimitError, RateLimitPolicy, RateLimitStats, RateLimiter};
pub use sanitizer::{sanitize_email, sanitize_fields, sanitize_text, sanitize_url};
pub use validator::{InputValidator, ValidationError};
