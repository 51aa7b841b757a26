//! Per-form field constraints

use super::FormKind;
use crate::middleware::sanitizer::{MAX_EMAIL_CHARS, MAX_TEXT_CHARS};

/// Structural format a field value must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldFormat {
    #[default]
    Freeform,
    Email,
    Url,
}

/// Constraint set for a single logical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Logical field name, unique within a form
    pub name: &'static str,
    /// Human label used in error messages
    pub label: &'static str,
    pub required: bool,
    /// Minimum length in characters (trimmed)
    pub min_length: usize,
    /// Maximum length in characters (trimmed)
    pub max_length: usize,
    pub format: FieldFormat,
}

impl FieldRule {
    /// A required free-text field with a minimum length of one character
    pub const fn required(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            required: true,
            min_length: 1,
            max_length: MAX_TEXT_CHARS,
            format: FieldFormat::Freeform,
        }
    }

    /// An optional free-text field
    pub const fn optional(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            required: false,
            min_length: 0,
            max_length: MAX_TEXT_CHARS,
            format: FieldFormat::Freeform,
        }
    }

    pub const fn min(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub const fn max(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Email format, bounded by the address-length ceiling
    pub const fn email(mut self) -> Self {
        self.format = FieldFormat::Email;
        self.max_length = MAX_EMAIL_CHARS;
        self
    }

    pub const fn url(mut self) -> Self {
        self.format = FieldFormat::Url;
        self
    }
}

/// Ordered, immutable set of field rules for one form kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    kind: FormKind,
    fields: Vec<FieldRule>,
}

impl FormSchema {
    /// Create a schema from an ordered list of rules
    pub fn new(kind: FormKind, fields: Vec<FieldRule>) -> Self {
        Self { kind, fields }
    }

    /// Built-in schema for a form kind
    pub fn for_kind(kind: FormKind) -> Self {
        match kind {
            FormKind::Contact => Self::contact(),
            FormKind::Collaboration => Self::collaboration(),
            FormKind::MemberRegistration => Self::member_registration(),
        }
    }

    pub fn contact() -> Self {
        Self::new(
            FormKind::Contact,
            vec![
                FieldRule::required("name", "Name").max(100),
                FieldRule::required("email", "Email").email(),
                FieldRule::required("subject", "Subject").max(200),
                FieldRule::required("message", "Message").min(10).max(1000),
            ],
        )
    }

    pub fn collaboration() -> Self {
        Self::new(
            FormKind::Collaboration,
            vec![
                FieldRule::required("name", "Name").max(100),
                FieldRule::required("email", "Email").email(),
                FieldRule::required("organization", "Organization").max(100),
                FieldRule::required("collaboration_type", "Collaboration type"),
                FieldRule::required("project_title", "Project title").max(200),
                FieldRule::required("description", "Description").min(20).max(2000),
                FieldRule::required("timeline", "Timeline"),
            ],
        )
    }

    pub fn member_registration() -> Self {
        Self::new(
            FormKind::MemberRegistration,
            vec![
                FieldRule::required("first_name", "First name").max(50),
                FieldRule::required("last_name", "Last name").max(50),
                FieldRule::required("email", "Email").email(),
                FieldRule::optional("linkedin", "LinkedIn URL").url(),
                FieldRule::required("current_role", "Current role"),
                FieldRule::required("experience", "Experience level"),
                FieldRule::required("interests", "Interests").max(500),
                FieldRule::required("background", "Background").min(20).max(1000),
            ],
        )
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Look up the rule for a field name
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|rule| rule.name)
    }
}
