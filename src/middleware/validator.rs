//! Schema-driven validation of form submissions

use crate::forms::{FieldErrors, FieldFormat, FieldRule, FieldValues, FormSchema};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};
use url::Url;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

/// Input validator
pub struct InputValidator;

impl InputValidator {
    /// Validate a whole submission against its schema.
    ///
    /// Every field is checked and every failure is collected, so the caller
    /// sees all problems at once. `Err` always carries at least one entry.
    /// Values are judged as submitted, before sanitization.
    pub fn validate_form(schema: &FormSchema, fields: &FieldValues) -> Result<(), FieldErrors> {
        let errors: FieldErrors = schema
            .fields()
            .iter()
            .filter_map(|rule| {
                let value = fields.get(rule.name).map(String::as_str);
                Self::validate_field(rule, value)
                    .err()
                    .map(|err| (rule.name.to_string(), err.message(rule.label)))
            })
            .collect();

        if errors.is_empty() {
            debug!("Form validation passed for {}", schema.kind());
            Ok(())
        } else {
            warn!(
                "Form validation failed for {}: {} field(s) rejected",
                schema.kind(),
                errors.len()
            );
            Err(errors)
        }
    }

    /// Validate one field value against its rule.
    ///
    /// A missing value is treated as empty. Rules are applied in the order
    /// required, length, format; the first failure is returned.
    pub fn validate_field(rule: &FieldRule, value: Option<&str>) -> Result<(), ValidationError> {
        let trimmed = value.unwrap_or_default().trim();

        if trimmed.is_empty() {
            return if rule.required {
                Err(ValidationError::Required)
            } else {
                Ok(())
            };
        }

        let length = trimmed.chars().count();
        if length < rule.min_length {
            return Err(ValidationError::TooShort {
                length,
                min_length: rule.min_length,
            });
        }
        if length > rule.max_length {
            return Err(ValidationError::TooLong {
                length,
                max_length: rule.max_length,
            });
        }

        match rule.format {
            FieldFormat::Email if !Self::is_valid_email(trimmed) => Err(ValidationError::InvalidEmail),
            FieldFormat::Url if !Self::is_absolute_url(trimmed) => Err(ValidationError::InvalidUrl),
            _ => Ok(()),
        }
    }

    /// Permissive address check: `local@domain.tld` with no spaces or extra `@`
    pub fn is_valid_email(email: &str) -> bool {
        email_pattern().is_match(email)
    }

    /// Whether the value parses as an absolute URL
    pub fn is_absolute_url(value: &str) -> bool {
        Url::parse(value).is_ok()
    }
}

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Value is required")]
    Required,

    #[error("Value too short: {length} characters (min: {min_length})")]
    TooShort { length: usize, min_length: usize },

    #[error("Value too long: {length} characters (max: {max_length})")]
    TooLong { length: usize, max_length: usize },

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid URL")]
    InvalidUrl,
}

impl ValidationError {
    /// User-facing message for a field with the given label
    pub fn message(&self, label: &str) -> String {
        match self {
            ValidationError::Required => format!("{} is required", label),
            ValidationError::TooShort { min_length, .. } => {
                format!("{} must be at least {} characters", label, min_length)
            }
            ValidationError::TooLong { max_length, .. } => {
                format!("{} must be at most {} characters", label, max_length)
            }
            ValidationError::InvalidEmail => "Please enter a valid email address".to_string(),
            ValidationError::InvalidUrl => format!("Please enter a valid {}", label),
        }
    }
}
