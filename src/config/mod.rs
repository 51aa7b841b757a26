//! Configuration management for the form intake service

use crate::collector::{AcknowledgmentPolicy, FieldMapping};
use crate::forms::FormKind;
use crate::middleware::RateLimitPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub mod loader;
pub mod validation;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub collector: CollectorConfig,

    /// Per-form collector settings keyed by form kind (`contact`,
    /// `collaboration`, `member_registration`); every kind must be present
    pub forms: HashMap<String, FormConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Configuration for the external form collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Collector base URL; form endpoints live under `/forms/d/e/{form_id}`
    #[serde(default = "default_collector_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How a completed POST is interpreted
    #[serde(default)]
    pub acknowledgment: AcknowledgmentPolicy,

    /// User agent sent with submissions
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Collector settings for one form kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Collector form identifier
    pub form_id: String,

    /// Logical field name to destination token
    pub fields: HashMap<String, String>,

    /// Attempts allowed per rate-limit window
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Rate-limit window in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl FormConfig {
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.max_attempts, Duration::from_millis(self.window_ms))
    }

    pub fn field_mapping(&self) -> FieldMapping {
        FieldMapping::new(self.fields.clone())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Server host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size")]
    pub max_body_size_kb: usize,

    /// Scope rate limits to the client address as well as the form
    #[serde(default)]
    pub per_client_rate_limit: bool,

    /// Interval between sweeps of expired rate-limit records
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            host: default_server_host(),
            max_body_size_kb: default_max_body_size(),
            per_client_rate_limit: false,
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, compact or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_collector_base_url() -> String { "https://docs.google.com".to_string() }
fn default_timeout() -> u64 { 10 }
fn default_user_agent() -> String { format!("form-intake/{}", env!("CARGO_PKG_VERSION")) }
fn default_max_attempts() -> u32 { 3 }
fn default_window_ms() -> u64 { 300_000 } // 5 minutes
fn default_server_port() -> u16 { 8080 }
fn default_server_host() -> String { "0.0.0.0".to_string() }
fn default_max_body_size() -> usize { 64 }
fn default_cleanup_interval() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config_with_env(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Validate this configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validation::validate_config(self)
    }

    /// Collector settings for a form kind
    pub fn form(&self, kind: FormKind) -> Option<&FormConfig> {
        self.forms.get(kind.as_str())
    }

    /// Rate-limit policy for a form kind, falling back to the defaults
    pub fn rate_limit_policy(&self, kind: FormKind) -> RateLimitPolicy {
        self.form(kind)
            .map(FormConfig::rate_limit_policy)
            .unwrap_or_default()
    }

    /// Create default configuration.
    ///
    /// Form ids are placeholders; replace them with the collector's real ids.
    pub fn default_config() -> Self {
        let form = |form_id: &str, fields: &[(&str, &str)]| FormConfig {
            form_id: form_id.to_string(),
            fields: fields
                .iter()
                .map(|(name, token)| (name.to_string(), token.to_string()))
                .collect(),
            max_attempts: default_max_attempts(),
            window_ms: default_window_ms(),
        };

        let mut forms = HashMap::new();
        forms.insert(
            FormKind::Contact.as_str().to_string(),
            form(
                "YOUR_CONTACT_FORM_ID",
                &[
                    ("name", "entry.111222333"),
                    ("email", "entry.444555666"),
                    ("subject", "entry.777888999"),
                    ("message", "entry.101112131"),
                ],
            ),
        );
        forms.insert(
            FormKind::Collaboration.as_str().to_string(),
            form(
                "YOUR_COLLABORATION_FORM_ID",
                &[
                    ("name", "entry.141516171"),
                    ("email", "entry.181920212"),
                    ("organization", "entry.222324252"),
                    ("collaboration_type", "entry.232425262"),
                    ("project_title", "entry.262728292"),
                    ("description", "entry.272829303"),
                    ("timeline", "entry.353637383"),
                ],
            ),
        );
        forms.insert(
            FormKind::MemberRegistration.as_str().to_string(),
            form(
                "YOUR_MEMBER_FORM_ID",
                &[
                    ("first_name", "entry.123456789"),
                    ("last_name", "entry.987654321"),
                    ("email", "entry.456789123"),
                    ("current_role", "entry.789123456"),
                    ("experience", "entry.321654987"),
                    ("interests", "entry.654987321"),
                    ("background", "entry.147258369"),
                    ("linkedin", "entry.963852741"),
                ],
            ),
        );

        Self {
            collector: CollectorConfig {
                base_url: default_collector_base_url(),
                timeout_secs: default_timeout(),
                acknowledgment: AcknowledgmentPolicy::default(),
                user_agent: default_user_agent(),
            },
            forms,
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
