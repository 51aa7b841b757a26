//! Logical field names to collector destination tokens

use super::TransportError;
use crate::forms::{FieldValues, FormSchema};
use std::collections::HashMap;
use tracing::warn;
use url::Url;

/// Fixed mapping from logical field name to opaque destination token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    tokens: HashMap<String, String>,
}

impl FieldMapping {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Destination token for a field
    pub fn token(&self, field: &str) -> Option<&str> {
        self.tokens.get(field).map(String::as_str)
    }

    /// Schema fields that have no (or a blank) destination token
    pub fn missing_fields(&self, schema: &FormSchema) -> Vec<&'static str> {
        schema
            .field_names()
            .filter(|name| self.token(name).map_or(true, |t| t.trim().is_empty()))
            .collect()
    }

    /// Translate sanitized fields into the collector's key/value payload.
    ///
    /// Empty values are skipped. Fields with no token are skipped and logged;
    /// the collector would ignore them anyway.
    pub fn build_payload(&self, fields: &FieldValues) -> Vec<(String, String)> {
        fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(name, value)| match self.token(name) {
                Some(token) => Some((token.to_string(), value.clone())),
                None => {
                    warn!("No destination token for field '{}', skipping", name);
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(field, token)| (field.into(), token.into()))
                .collect(),
        )
    }
}

/// Fixed submission target for one form kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEndpoint {
    url: Url,
    mapping: FieldMapping,
}

impl FormEndpoint {
    /// Build `{base_url}/forms/d/e/{form_id}/formResponse`
    pub fn new(base_url: &str, form_id: &str, mapping: FieldMapping) -> Result<Self, TransportError> {
        let raw = format!(
            "{}/forms/d/e/{}/formResponse",
            base_url.trim_end_matches('/'),
            form_id
        );
        let url = Url::parse(&raw)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", raw, e)))?;

        Ok(Self { url, mapping })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }
}
