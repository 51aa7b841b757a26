//! The four-stage submission pipeline shared by every form kind

use super::{FieldValues, FormKind, FormSchema, RejectReason, SubmissionOutcome};
use crate::collector::{Dispatch, SubmissionAdapter};
use crate::middleware::{sanitize_fields, InputValidator, RateLimitError, RateLimitPolicy, RateLimiter};
use crate::observability::MetricsCollector;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Rate limit, validate, sanitize, then dispatch one form kind.
///
/// Each stage short-circuits: a rejected submission never reaches the later
/// stages, so nothing is posted unless every guard passed.
pub struct FormPipeline {
    schema: FormSchema,
    policy: RateLimitPolicy,
    rate_limiter: Arc<RateLimiter>,
    adapter: Arc<SubmissionAdapter>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl FormPipeline {
    pub fn new(
        schema: FormSchema,
        policy: RateLimitPolicy,
        rate_limiter: Arc<RateLimiter>,
        adapter: Arc<SubmissionAdapter>,
    ) -> Self {
        Self {
            schema,
            policy,
            rate_limiter,
            adapter,
            metrics: None,
        }
    }

    /// Record outcomes and dispatch latency
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn kind(&self) -> FormKind {
        self.schema.kind()
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Rate-limit key for this form, optionally scoped to one client
    pub fn rate_limit_key(&self, client: Option<&str>) -> String {
        let identifier = self.kind().rate_limit_identifier();
        match client {
            Some(client) => format!("{}:{}", identifier, client),
            None => identifier.to_string(),
        }
    }

    /// Run a submission against the form-wide rate limit
    pub async fn process(&self, fields: &FieldValues) -> SubmissionOutcome {
        self.process_for(None, fields).await
    }

    /// Run a submission, scoping the rate limit to `client` when given
    pub async fn process_for(&self, client: Option<&str>, fields: &FieldValues) -> SubmissionOutcome {
        let span = info_span!(
            "submission",
            form = %self.kind(),
            submission_id = %Uuid::new_v4(),
        );

        let outcome = self.run(client, fields).instrument(span).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(&outcome);
        }
        outcome
    }

    async fn run(&self, client: Option<&str>, fields: &FieldValues) -> SubmissionOutcome {
        let key = self.rate_limit_key(client);
        if let Err(RateLimitError::LimitExceeded { retry_after, .. }) =
            self.rate_limiter.check(&key, self.policy)
        {
            info!(retry_after_secs = retry_after.as_secs(), "Submission rate limited");
            return SubmissionOutcome::Rejected(RejectReason::RateLimited { retry_after });
        }

        if let Err(errors) = InputValidator::validate_form(&self.schema, fields) {
            info!(invalid_fields = errors.len(), "Submission failed validation");
            return SubmissionOutcome::Rejected(RejectReason::ValidationFailed(errors));
        }

        let sanitized = sanitize_fields(&self.schema, fields);
        debug!("Sanitized {} field(s)", sanitized.len());

        let started = Instant::now();
        let dispatch = self.adapter.dispatch(self.kind(), &sanitized).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatch(started.elapsed());
        }

        match dispatch {
            Dispatch::Accepted => {
                info!("Submission handed off to collector");
                SubmissionOutcome::Accepted
            }
            Dispatch::NetworkFailure => {
                warn!("Submission could not be delivered");
                SubmissionOutcome::Rejected(RejectReason::NetworkFailure)
            }
            Dispatch::RemoteRejected { status } => {
                warn!(status, "Submission rejected by collector");
                SubmissionOutcome::Rejected(RejectReason::RemoteRejected { status })
            }
        }
    }
}
