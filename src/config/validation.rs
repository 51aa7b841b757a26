//! Configuration validation

use super::*;
use crate::error::{IntakeError, Result};
use std::collections::HashSet;
use url::Url;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_collector_config(&config.collector)?;
    validate_forms_config(&config.forms)?;
    validate_logging_config(&config.logging)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validate collector configuration
fn validate_collector_config(config: &CollectorConfig) -> Result<()> {
    if config.base_url.is_empty() {
        return Err(IntakeError::Config(
            "Collector base URL cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| IntakeError::Config(format!("Invalid collector base URL: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(IntakeError::Config(
            "Collector base URL must start with http:// or https://".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(IntakeError::Config(
            "Collector timeout must be greater than 0".to_string(),
        ));
    }

    if config.timeout_secs > 300 {
        return Err(IntakeError::Config(
            "Collector timeout too large (max: 300 seconds)".to_string(),
        ));
    }

    Ok(())
}

/// Validate per-form configuration
fn validate_forms_config(forms: &HashMap<String, FormConfig>) -> Result<()> {
    for key in forms.keys() {
        if !FormKind::ALL.iter().any(|kind| kind.as_str() == key) {
            return Err(IntakeError::Config(format!(
                "Unknown form '{}' (expected one of: contact, collaboration, member_registration)",
                key
            )));
        }
    }

    for kind in FormKind::ALL {
        let form = forms.get(kind.as_str()).ok_or_else(|| {
            IntakeError::Config(format!("Missing configuration for form '{}'", kind))
        })?;
        validate_form_config(kind, form)?;
    }

    Ok(())
}

/// Validate one form's id, field mapping and rate limit
fn validate_form_config(kind: FormKind, config: &FormConfig) -> Result<()> {
    if config.form_id.is_empty() {
        return Err(IntakeError::Config(format!(
            "Form id for '{}' cannot be empty",
            kind
        )));
    }

    // The id becomes a path segment of the submission URL
    if !config
        .form_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(IntakeError::Config(format!(
            "Form id for '{}' contains invalid characters (allowed: alphanumeric, '-', '_')",
            kind
        )));
    }

    let missing = config.field_mapping().missing_fields(&kind.schema());
    if !missing.is_empty() {
        return Err(IntakeError::Config(format!(
            "Form '{}' has no destination token for: {}",
            kind,
            missing.join(", ")
        )));
    }

    let mut seen = HashSet::new();
    for (field, token) in &config.fields {
        if !seen.insert(token.as_str()) {
            return Err(IntakeError::Config(format!(
                "Form '{}' maps more than one field to token '{}' (at '{}')",
                kind, token, field
            )));
        }
    }

    if config.max_attempts == 0 {
        return Err(IntakeError::Config(format!(
            "Max attempts for '{}' must be greater than 0",
            kind
        )));
    }

    if config.window_ms == 0 {
        return Err(IntakeError::Config(format!(
            "Rate limit window for '{}' must be greater than 0",
            kind
        )));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    match config.format.as_str() {
        "json" | "compact" | "pretty" => Ok(()),
        other => Err(IntakeError::Config(format!(
            "Unknown log format '{}' (expected json, compact or pretty)",
            other
        ))),
    }
}

/// Validate server configuration
pub fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(IntakeError::Config("Server port cannot be 0".to_string()));
    }

    if config.host.is_empty() {
        return Err(IntakeError::Config(
            "Server host cannot be empty".to_string(),
        ));
    }

    if config.max_body_size_kb == 0 {
        return Err(IntakeError::Config(
            "Max body size must be greater than 0".to_string(),
        ));
    }

    if config.cleanup_interval_secs == 0 {
        return Err(IntakeError::Config(
            "Rate limit cleanup interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
