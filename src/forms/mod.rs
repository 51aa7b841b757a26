//! Form kinds, schemas and the per-form submission pipeline

pub mod intake;
pub mod outcome;
pub mod pipeline;
pub mod schema;

pub use intake::FormIntake;
pub use outcome::{FieldErrors, RejectReason, SubmissionOutcome};
pub use pipeline::FormPipeline;
pub use schema::{FieldFormat, FieldRule, FormSchema};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flat mapping of logical field name to user input, in submission order
pub type FieldValues = IndexMap<String, String>;

/// A named category of submission with its own schema and field mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Contact,
    Collaboration,
    MemberRegistration,
}

impl FormKind {
    /// Every form kind the service accepts
    pub const ALL: [FormKind; 3] = [
        FormKind::Contact,
        FormKind::Collaboration,
        FormKind::MemberRegistration,
    ];

    /// Configuration key for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Collaboration => "collaboration",
            FormKind::MemberRegistration => "member_registration",
        }
    }

    /// Logical rate-limit identifier; each kind is throttled independently
    pub fn rate_limit_identifier(&self) -> &'static str {
        match self {
            FormKind::Contact => "contact-form",
            FormKind::Collaboration => "collaboration-form",
            FormKind::MemberRegistration => "member-registration",
        }
    }

    /// Built-in schema for this kind
    pub fn schema(&self) -> FormSchema {
        FormSchema::for_kind(*self)
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = UnknownFormKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contact" => Ok(FormKind::Contact),
            "collaboration" => Ok(FormKind::Collaboration),
            "member-registration" | "member_registration" | "join" => {
                Ok(FormKind::MemberRegistration)
            }
            _ => Err(UnknownFormKind(s.to_string())),
        }
    }
}

/// Returned when a form kind name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown form kind: {0}")]
pub struct UnknownFormKind(pub String);
