//! Submission adapter: schema mapping plus fire-and-forget delivery

use super::{Delivery, FormEndpoint, FormTransport};
use crate::config::Config;
use crate::error::{IntakeError, Result};
use crate::forms::{FieldValues, FormKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How a completed POST is interpreted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AcknowledgmentPolicy {
    /// Any delivery without a transport error is success. The collector's
    /// status is never consulted, so a silent remote rejection reads as
    /// accepted.
    #[default]
    Optimistic,
    /// A non-2xx status from the collector is a remote rejection. Only
    /// meaningful for collectors whose responses are readable.
    Verified,
}

/// Result of handing a payload to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Accepted,
    RemoteRejected { status: u16 },
    NetworkFailure,
}

/// Maps sanitized fields onto each form's external schema and posts them
pub struct SubmissionAdapter {
    transport: Arc<dyn FormTransport>,
    endpoints: HashMap<FormKind, FormEndpoint>,
    acknowledgment: AcknowledgmentPolicy,
}

impl SubmissionAdapter {
    /// Create an adapter with no endpoints registered
    pub fn new(transport: Arc<dyn FormTransport>, acknowledgment: AcknowledgmentPolicy) -> Self {
        Self {
            transport,
            endpoints: HashMap::new(),
            acknowledgment,
        }
    }

    /// Register the endpoint for a form kind
    pub fn with_endpoint(mut self, kind: FormKind, endpoint: FormEndpoint) -> Self {
        self.endpoints.insert(kind, endpoint);
        self
    }

    /// Build an adapter with an endpoint for every form kind.
    ///
    /// A missing form or an incomplete field mapping is a configuration error
    /// and is reported here, before any submission is attempted.
    pub fn from_config(config: &Config, transport: Arc<dyn FormTransport>) -> Result<Self> {
        let mut adapter = Self::new(transport, config.collector.acknowledgment);

        for kind in FormKind::ALL {
            let form = config.form(kind).ok_or_else(|| {
                IntakeError::Config(format!("No collector configuration for form '{}'", kind))
            })?;

            let mapping = form.field_mapping();
            let missing = mapping.missing_fields(&kind.schema());
            if !missing.is_empty() {
                return Err(IntakeError::Config(format!(
                    "Form '{}' has no destination token for: {}",
                    kind,
                    missing.join(", ")
                )));
            }

            let endpoint = FormEndpoint::new(&config.collector.base_url, &form.form_id, mapping)?;
            debug!("Registered collector endpoint for {}: {}", kind, endpoint.url());
            adapter = adapter.with_endpoint(kind, endpoint);
        }

        info!(
            "Submission adapter ready with {} endpoint(s), acknowledgment={:?}",
            adapter.endpoints.len(),
            adapter.acknowledgment
        );
        Ok(adapter)
    }

    pub fn endpoint(&self, kind: FormKind) -> Option<&FormEndpoint> {
        self.endpoints.get(&kind)
    }

    pub fn acknowledgment(&self) -> AcknowledgmentPolicy {
        self.acknowledgment
    }

    /// Post a sanitized submission; `true` when it was handed off.
    ///
    /// Never fails: transport errors become `false`. A `true` result means the
    /// collector was reached, not that it accepted the data.
    pub async fn submit(&self, kind: FormKind, fields: &FieldValues) -> bool {
        self.dispatch(kind, fields).await == Dispatch::Accepted
    }

    /// Post a sanitized submission and report how delivery went
    pub async fn dispatch(&self, kind: FormKind, fields: &FieldValues) -> Dispatch {
        let Some(endpoint) = self.endpoints.get(&kind) else {
            error!("No collector endpoint registered for form '{}'", kind);
            return Dispatch::NetworkFailure;
        };

        let payload = endpoint.mapping().build_payload(fields);
        debug!("Dispatching {} field(s) for form '{}'", payload.len(), kind);

        match self.transport.post_form(endpoint.url(), &payload).await {
            Ok(delivery) => self.acknowledge(kind, delivery),
            Err(e) => {
                warn!("Submission for form '{}' failed: {}", kind, e);
                Dispatch::NetworkFailure
            }
        }
    }

    fn acknowledge(&self, kind: FormKind, delivery: Delivery) -> Dispatch {
        match (self.acknowledgment, delivery) {
            (AcknowledgmentPolicy::Verified, Delivery::Status(status))
                if !(200..300).contains(&status) =>
            {
                warn!("Collector rejected form '{}' with status {}", kind, status);
                Dispatch::RemoteRejected { status }
            }
            _ => {
                debug!("Form '{}' handed off to collector", kind);
                Dispatch::Accepted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{FieldMapping, TransportError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use url::Url;

    /// Records payloads and answers with a fixed result
    struct StubTransport {
        response: fn() -> std::result::Result<Delivery, TransportError>,
        posted: Mutex<Vec<(Url, Vec<(String, String)>)>>,
    }

    impl StubTransport {
        fn new(response: fn() -> std::result::Result<Delivery, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                posted: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl FormTransport for StubTransport {
        async fn post_form(
            &self,
            endpoint: &Url,
            payload: &[(String, String)],
        ) -> std::result::Result<Delivery, TransportError> {
            self.posted
                .lock()
                .unwrap()
                .push((endpoint.clone(), payload.to_vec()));
            (self.response)()
        }
    }

    fn adapter(transport: Arc<StubTransport>, acknowledgment: AcknowledgmentPolicy) -> SubmissionAdapter {
        let mapping: FieldMapping = [("name", "entry.1"), ("email", "entry.2")].into_iter().collect();
        let endpoint = FormEndpoint::new("https://collector.test", "contact-id", mapping).unwrap();
        SubmissionAdapter::new(transport, acknowledgment).with_endpoint(FormKind::Contact, endpoint)
    }

    fn fields() -> FieldValues {
        let mut fields = FieldValues::new();
        fields.insert("name".to_string(), "Ann".to_string());
        fields.insert("email".to_string(), "ann@x.com".to_string());
        fields
    }

    #[tokio::test]
    async fn test_submit_true_when_transport_returns() {
        let transport = StubTransport::new(|| Ok(Delivery::Opaque));
        let adapter = adapter(transport.clone(), AcknowledgmentPolicy::Optimistic);

        assert!(adapter.submit(FormKind::Contact, &fields()).await);

        let posted = transport.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(
            posted[0].0.as_str(),
            "https://collector.test/forms/d/e/contact-id/formResponse"
        );
        assert_eq!(
            posted[0].1,
            vec![
                ("entry.1".to_string(), "Ann".to_string()),
                ("entry.2".to_string(), "ann@x.com".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_ignores_response_content_when_optimistic() {
        // The collector rejecting the payload is invisible under this policy
        let transport = StubTransport::new(|| Ok(Delivery::Status(400)));
        let adapter = adapter(transport, AcknowledgmentPolicy::Optimistic);

        assert!(adapter.submit(FormKind::Contact, &fields()).await);
    }

    #[tokio::test]
    async fn test_submit_false_on_transport_error() {
        let transport =
            StubTransport::new(|| Err(TransportError::Connection("connection refused".to_string())));
        let adapter = adapter(transport, AcknowledgmentPolicy::Optimistic);

        assert!(!adapter.submit(FormKind::Contact, &fields()).await);
        assert_eq!(
            adapter.dispatch(FormKind::Contact, &fields()).await,
            Dispatch::NetworkFailure
        );
    }

    #[tokio::test]
    async fn test_verified_policy_reports_remote_rejection() {
        let transport = StubTransport::new(|| Ok(Delivery::Status(400)));
        let adapter = adapter(transport, AcknowledgmentPolicy::Verified);

        assert_eq!(
            adapter.dispatch(FormKind::Contact, &fields()).await,
            Dispatch::RemoteRejected { status: 400 }
        );
        assert!(!adapter.submit(FormKind::Contact, &fields()).await);
    }

    #[tokio::test]
    async fn test_verified_policy_accepts_opaque_delivery() {
        let transport = StubTransport::new(|| Ok(Delivery::Opaque));
        let adapter = adapter(transport, AcknowledgmentPolicy::Verified);

        assert!(adapter.submit(FormKind::Contact, &fields()).await);
    }

    #[tokio::test]
    async fn test_unregistered_form_is_failure() {
        let transport = StubTransport::new(|| Ok(Delivery::Opaque));
        let adapter = adapter(transport.clone(), AcknowledgmentPolicy::Optimistic);

        assert!(!adapter.submit(FormKind::Collaboration, &fields()).await);
        assert!(transport.posted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_config_requires_every_form() {
        let mut config = Config::default_config();
        config.forms.remove("collaboration");

        let transport = StubTransport::new(|| Ok(Delivery::Opaque));
        let err = SubmissionAdapter::from_config(&config, transport).err().unwrap();
        assert!(err.to_string().contains("collaboration"));
    }

    #[test]
    fn test_from_config_requires_complete_mapping() {
        let mut config = Config::default_config();
        config
            .forms
            .get_mut("contact")
            .unwrap()
            .fields
            .remove("message");

        let transport = StubTransport::new(|| Ok(Delivery::Opaque));
        let err = SubmissionAdapter::from_config(&config, transport).err().unwrap();
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn test_from_config_registers_all_endpoints() {
        let transport = StubTransport::new(|| Ok(Delivery::Opaque));
        let adapter = SubmissionAdapter::from_config(&Config::default_config(), transport).unwrap();

        for kind in FormKind::ALL {
            assert!(adapter.endpoint(kind).is_some(), "missing endpoint for {}", kind);
        }
    }
}
