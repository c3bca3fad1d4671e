//! HTTP server for the plan-generation endpoint

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::planner::{PlanOutcome, StudyPlanService};

/// Maximum body size: 64 KiB
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Headers browsers may send on the plan request
pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

const HEALTH_ROUTE: &str = "/health";

/// Application state shared across handlers
pub struct AppState {
    pub service: StudyPlanService,
    /// Static bearer token required on POST, if configured
    pub auth_token: Option<String>,
}

impl AppState {
    pub fn new(service: StudyPlanService, auth_token: Option<String>) -> Self {
        Self { service, auth_token }
    }
}

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl IntoResponse for PlanOutcome {
    fn into_response(self) -> Response {
        match self {
            PlanOutcome::Plan { plan, .. } => (StatusCode::OK, Json(plan)).into_response(),
            PlanOutcome::Rejected { status, message } => (status, Json(ErrorBody::new(message))).into_response(),
        }
    }
}

/// Build the application router
///
/// Every response, including errors and preflight, carries the CORS headers.
pub fn router(state: AppState, route: &str) -> Router {
    Router::new()
        .route(route, post(generate_plan).options(preflight))
        .route(HEALTH_ROUTE, get(health))
        .with_state(Arc::new(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    if !config.route.starts_with('/') || config.route == HEALTH_ROUTE {
        return Err(eyre::eyre!(
            "Invalid server route '{}': must start with '/' and differ from {}",
            config.route,
            HEALTH_ROUTE
        ));
    }

    let app = router(state, &config.route);

    let listener = TcpListener::bind(config.bind.as_str())
        .await
        .context(format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}{}", listener.local_addr()?, config.route);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}

async fn generate_plan(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = Uuid::now_v7();
    let span = info_span!("plan_request", %request_id);

    async move {
        if !authorized(&headers, state.auth_token.as_deref()) {
            warn!("Rejecting plan request without a valid bearer token");
            return (StatusCode::UNAUTHORIZED, Json(ErrorBody::new("Unauthorized"))).into_response();
        }

        let outcome = state.service.handle_body(&body).await;
        info!(
            status = outcome.status().as_u16(),
            fallback = outcome.is_fallback(),
            "Plan request handled"
        );
        outcome.into_response()
    }
    .instrument(span)
    .await
}

async fn preflight() -> StatusCode {
    debug!("preflight: called");
    StatusCode::OK
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn authorized(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(auth) = auth {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        }
        headers
    }

    #[test]
    fn test_authorized_without_token_configured() {
        assert!(authorized(&headers(None), None));
        assert!(authorized(&headers(Some("Bearer anything")), None));
    }

    #[test]
    fn test_authorized_with_token_configured() {
        assert!(authorized(&headers(Some("Bearer s3cret")), Some("s3cret")));
        assert!(!authorized(&headers(Some("Bearer wrong")), Some("s3cret")));
        assert!(!authorized(&headers(Some("s3cret")), Some("s3cret")));
        assert!(!authorized(&headers(None), Some("s3cret")));
    }

    #[test]
    fn test_error_body_wire_format() {
        let json = serde_json::to_string(&ErrorBody::new("Missing required fields: subjects and examDate")).unwrap();
        assert_eq!(json, r#"{"error":"Missing required fields: subjects and examDate"}"#);
    }
}
