//! API request handlers

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, warn};

use crate::forms::{FieldErrors, FieldValues, FormIntake, FormKind, RejectReason, SubmissionOutcome};
use crate::observability::MetricsCollector;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<FormIntake>,
    pub metrics: Arc<MetricsCollector>,
    /// Key rate limits by client address as well as form kind
    pub per_client_rate_limit: bool,
}

/// Body returned for every submission
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub status: &'static str,
    pub title: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<&SubmissionOutcome> for SubmissionResponse {
    fn from(outcome: &SubmissionOutcome) -> Self {
        let (errors, retry_after_secs) = match outcome.reason() {
            Some(RejectReason::ValidationFailed(errors)) => (Some(errors.clone()), None),
            Some(RejectReason::RateLimited { retry_after }) => {
                (None, Some(retry_after_header_secs(retry_after.as_secs_f64())))
            }
            _ => (None, None),
        };

        Self {
            status: outcome.label(),
            title: outcome.title(),
            message: outcome.user_message(),
            errors,
            retry_after_secs,
        }
    }
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Submit a form of the kind named in the path
pub async fn submit_form(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(fields): Json<FieldValues>,
) -> Response {
    let kind = match kind.parse::<FormKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!("{}", e);
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let client = if state.per_client_rate_limit {
        client_address(&headers, connect_info.map(|ConnectInfo(addr)| addr))
    } else {
        None
    };

    match state.intake.submit(kind, client.as_deref(), &fields).await {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => {
            error!("Submission for '{}' could not be processed: {}", kind, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Map a pipeline outcome onto status, headers and body
pub fn outcome_response(outcome: &SubmissionOutcome) -> Response {
    let body = SubmissionResponse::from(outcome);

    match outcome {
        SubmissionOutcome::Accepted => (StatusCode::ACCEPTED, Json(body)).into_response(),
        SubmissionOutcome::Rejected(RejectReason::RateLimited { .. }) => {
            let retry_after = body.retry_after_secs.unwrap_or(1).to_string();
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after)],
                Json(body),
            )
                .into_response()
        }
        SubmissionOutcome::Rejected(RejectReason::ValidationFailed(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        SubmissionOutcome::Rejected(_) => (StatusCode::BAD_GATEWAY, Json(body)).into_response(),
    }
}

/// Client address from `x-forwarded-for`, falling back to the peer address
fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Whole seconds for `Retry-After`, never zero
fn retry_after_header_secs(secs: f64) -> u64 {
    (secs.ceil() as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    #[test]
    fn test_client_address_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        assert_eq!(client_address(&headers, Some(peer)).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_address(&HeaderMap::new(), Some(peer)).as_deref(), Some("127.0.0.1"));
        assert_eq!(client_address(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_rate_limited_response_has_retry_after() {
        let outcome = SubmissionOutcome::Rejected(RejectReason::RateLimited {
            retry_after: Duration::from_millis(1500),
        });
        let response = outcome_response(&outcome);

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn test_outcome_status_codes() {
        assert_eq!(
            outcome_response(&SubmissionOutcome::Accepted).status(),
            StatusCode::ACCEPTED
        );
        assert_eq!(
            outcome_response(&SubmissionOutcome::Rejected(RejectReason::NetworkFailure)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            outcome_response(&SubmissionOutcome::Rejected(RejectReason::RemoteRejected {
                status: 400
            }))
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
