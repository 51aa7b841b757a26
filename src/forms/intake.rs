//! One pipeline per form kind, built from configuration

use super::{FieldValues, FormKind, FormPipeline, SubmissionOutcome};
use crate::collector::{FormTransport, SubmissionAdapter};
use crate::config::Config;
use crate::error::{IntakeError, Result};
use crate::middleware::RateLimiter;
use crate::observability::MetricsCollector;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Entry point for submissions of every form kind.
///
/// All pipelines share one rate limiter and one adapter; rate-limit keys are
/// distinct per form kind, so forms never spend each other's budget.
pub struct FormIntake {
    pipelines: HashMap<FormKind, FormPipeline>,
    rate_limiter: Arc<RateLimiter>,
}

impl FormIntake {
    /// Build pipelines for every form kind.
    ///
    /// Fails if any form is missing from the configuration or its field
    /// mapping is incomplete.
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn FormTransport>,
        rate_limiter: Arc<RateLimiter>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<Self> {
        let adapter = Arc::new(SubmissionAdapter::from_config(config, transport)?);

        let pipelines = FormKind::ALL
            .into_iter()
            .map(|kind| {
                let policy = config.rate_limit_policy(kind);
                let pipeline =
                    FormPipeline::new(kind.schema(), policy, rate_limiter.clone(), adapter.clone());
                let pipeline = match &metrics {
                    Some(metrics) => pipeline.with_metrics(metrics.clone()),
                    None => pipeline,
                };

                info!(
                    "Form '{}' ready: {} attempts per {}s",
                    kind,
                    policy.max_attempts,
                    policy.window.as_secs()
                );
                (kind, pipeline)
            })
            .collect();

        Ok(Self {
            pipelines,
            rate_limiter,
        })
    }

    /// Pipeline for a form kind
    pub fn pipeline(&self, kind: FormKind) -> Result<&FormPipeline> {
        self.pipelines
            .get(&kind)
            .ok_or_else(|| IntakeError::Internal(format!("No pipeline for form '{}'", kind)))
    }

    /// Run a submission through the pipeline for `kind`
    pub async fn submit(
        &self,
        kind: FormKind,
        client: Option<&str>,
        fields: &FieldValues,
    ) -> Result<SubmissionOutcome> {
        Ok(self.pipeline(kind)?.process_for(client, fields).await)
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{Delivery, TransportError};
    use async_trait::async_trait;
    use url::Url;

    struct AcceptingTransport;

    #[async_trait]
    impl FormTransport for AcceptingTransport {
        async fn post_form(
            &self,
            _endpoint: &Url,
            _payload: &[(String, String)],
        ) -> std::result::Result<Delivery, TransportError> {
            Ok(Delivery::Opaque)
        }
    }

    fn intake(config: &Config) -> FormIntake {
        FormIntake::from_config(
            config,
            Arc::new(AcceptingTransport),
            Arc::new(RateLimiter::new()),
            None,
        )
        .unwrap()
    }

    fn collaboration_fields() -> FieldValues {
        [
            ("name", "Bo"),
            ("email", "bo@lab.org"),
            ("organization", "Lab"),
            ("collaboration_type", "research"),
            ("project_title", "Study"),
            ("description", "A twenty character plus description"),
            ("timeline", "Q3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_builds_pipeline_per_form() {
        let intake = intake(&Config::default_config());
        for kind in FormKind::ALL {
            assert_eq!(intake.pipeline(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_applies_configured_policy() {
        let mut config = Config::default_config();
        config.forms.get_mut("collaboration").unwrap().max_attempts = 7;

        let intake = intake(&config);
        let policy = intake.pipeline(FormKind::Collaboration).unwrap().policy();
        assert_eq!(policy.max_attempts, 7);
    }

    #[test]
    fn test_missing_form_fails_startup() {
        let mut config = Config::default_config();
        config.forms.remove("contact");

        let result = FormIntake::from_config(
            &config,
            Arc::new(AcceptingTransport),
            Arc::new(RateLimiter::new()),
            None,
        );
        assert!(matches!(result, Err(IntakeError::Config(_))));
    }

    #[tokio::test]
    async fn test_forms_are_limited_independently() {
        let intake = intake(&Config::default_config());
        let fields = collaboration_fields();

        for _ in 0..3 {
            let outcome = intake.submit(FormKind::Collaboration, None, &fields).await.unwrap();
            assert!(outcome.is_accepted());
        }
        let outcome = intake.submit(FormKind::Collaboration, None, &fields).await.unwrap();
        assert_eq!(outcome.label(), "rate_limited");

        // Contact still has its full budget
        let outcome = intake.submit(FormKind::Contact, None, &FieldValues::new()).await.unwrap();
        assert_eq!(outcome.label(), "validation_failed");
        assert_eq!(intake.rate_limiter().usage("contact-form").map(|(n, _)| n), Some(1));
    }
}
