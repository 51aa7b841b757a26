//! API route configuration

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use super::handlers::{self, AppState};

/// Build the complete API router with middleware
pub fn build_router(app_state: AppState, max_body_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health/live", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(app_state.clone());

    let api_routes = Router::new()
        .route("/api/v1/forms/:kind", post(handlers::submit_form))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state);

    public_routes.merge(api_routes)
}

/// Root handler
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "Form Intake",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Liveness probe handler - always returns 200
async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "alive"})))
}

/// Metrics handler
async fn metrics_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let mut output = app_state.metrics.export_prometheus();

    let stats = app_state.intake.rate_limiter().stats();
    output.push_str(&format!(
        "\n# HELP form_intake_rate_limit_tracked_identifiers Rate-limit records held in memory\n\
         # TYPE form_intake_rate_limit_tracked_identifiers gauge\n\
         form_intake_rate_limit_tracked_identifiers {}\n",
        stats.tracked_identifiers
    ));

    output
}
