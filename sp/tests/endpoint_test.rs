//! Integration tests for the plan-generation endpoint
//!
//! The endpoint router is driven in-process; the completion gateway is a
//! small axum app bound to an ephemeral local port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use studyplan::client::{ClientError, PlanClient};
use studyplan::config::ResolvedGatewayConfig;
use studyplan::domain::{PlanRequest, StudyPlanResponse};
use studyplan::llm::create_client;
use studyplan::planner::StudyPlanService;
use studyplan::prompts::PromptLoader;
use studyplan::server::{AppState, router};

const ROUTE: &str = "/functions/v1/generate-study-plan";
const API_KEY: &str = "test-gateway-key";

// =============================================================================
// Fake gateway
// =============================================================================

/// What the fake gateway saw on its last request
#[derive(Default)]
struct Seen {
    authorization: Option<String>,
    body: Option<Value>,
}

#[derive(Clone)]
struct GatewayState {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Seen>>,
}

async fn fake_completions(State(state): State<GatewayState>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let mut seen = state.seen.lock().unwrap();
    seen.authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.body = Some(body);
    (state.status, Json(state.reply))
}

/// Start a fake gateway answering every completion with `status` and `reply`
async fn spawn_gateway(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let state = GatewayState {
        status,
        reply,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(fake_completions))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

/// Start a fake gateway that accepts requests but answers too late
async fn spawn_slow_gateway(delay: Duration) -> String {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move || async move {
            tokio::time::sleep(delay).await;
            StatusCode::OK
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on
async fn unreachable_gateway() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn plan_arguments() -> Value {
    json!({
        "overview": "Two weeks out: Physics gets the mornings, Math the evenings.",
        "weeklyPlan": [
            { "day": "Monday", "tasks": ["Kinematics problems", "Math review"], "studyHours": 4 },
            { "day": "Tuesday", "tasks": ["Dynamics"], "studyHours": 3.5 }
        ],
        "focusTips": ["Work in 50 minute blocks"],
        "burnoutWarnings": [],
        "motivation": "Every session counts."
    })
}

fn tool_call_reply(name: &str, arguments: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": name, "arguments": arguments }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 300 }
    })
}

// =============================================================================
// Helpers
// =============================================================================

fn app(gateway_url: &str, auth_token: Option<&str>) -> Router {
    app_with_timeout(gateway_url, auth_token, Duration::from_secs(5))
}

fn app_with_timeout(gateway_url: &str, auth_token: Option<&str>, timeout: Duration) -> Router {
    let config = ResolvedGatewayConfig {
        model: "google/gemini-3-flash-preview".to_string(),
        api_key: API_KEY.to_string(),
        base_url: gateway_url.to_string(),
        timeout,
        max_tokens: None,
    };
    let llm = create_client(&config).unwrap();
    let service = StudyPlanService::new(llm, PromptLoader::embedded_only());
    router(AppState::new(service, auth_token.map(str::to_string)), ROUTE)
}

fn post_plan(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(ROUTE)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn math_request() -> String {
    json!({
        "subjects": ["Math"],
        "examDate": "2099-01-01",
        "hoursPerDay": 4,
        "weakSubjects": [],
        "stressLevel": "medium"
    })
    .to_string()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

fn assert_cors(headers: &HeaderMap) {
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "authorization, x-client-info, apikey, content-type"
    );
}

// =============================================================================
// Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_preflight_returns_empty_200_with_cors() {
    let app = app(&unreachable_gateway().await, None);
    let request = Request::builder().method("OPTIONS").uri(ROUTE).body(Body::empty()).unwrap();

    let (status, headers, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_cors(&headers);
}

#[tokio::test]
async fn test_successful_generation() {
    let arguments = plan_arguments().to_string();
    let (url, seen) = spawn_gateway(StatusCode::OK, tool_call_reply("generate_study_plan", &arguments)).await;

    let (status, headers, body) = send(app(&url, None), post_plan(math_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);

    let plan: StudyPlanResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(plan.overview, "Two weeks out: Physics gets the mornings, Math the evenings.");
    assert_eq!(plan.weekly_plan.len(), 2);
    assert_eq!(plan.weekly_plan[1].study_hours, 3.5);
    assert!(plan.burnout_warnings.is_empty());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer test-gateway-key"));
    let sent = seen.body.as_ref().unwrap();
    assert_eq!(sent["model"], "google/gemini-3-flash-preview");
    assert_eq!(sent["tool_choice"]["function"]["name"], "generate_study_plan");
    assert_eq!(sent["tools"][0]["function"]["name"], "generate_study_plan");
    assert_eq!(sent["messages"][0]["role"], "system");
    let user = sent["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("Subjects: Math"));
    assert!(user.contains("Weak subjects that need extra attention: None specified"));
}

#[tokio::test]
async fn test_empty_subjects_is_400() {
    let app = app(&unreachable_gateway().await, None);
    let body = json!({ "subjects": [], "examDate": "2099-01-01" }).to_string();

    let (status, headers, body) = send(app, post_plan(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_cors(&headers);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        r#"{"error":"Missing required fields: subjects and examDate"}"#
    );
}

#[tokio::test]
async fn test_missing_exam_date_is_400() {
    let app = app(&unreachable_gateway().await, None);
    let body = json!({ "subjects": ["Math"] }).to_string();

    let (status, _, body) = send(app, post_plan(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Missing required fields: subjects and examDate");
}

#[tokio::test]
async fn test_unreachable_gateway_serves_fallback() {
    let app = app(&unreachable_gateway().await, None);

    let (status, headers, body) = send(app, post_plan(math_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);

    let plan: StudyPlanResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(plan, StudyPlanResponse::fallback());
    assert_eq!(
        plan.overview,
        "We encountered an issue generating your personalized plan. Here's a general study strategy to get you started."
    );
    assert_eq!(plan.weekly_plan.len(), 7);
    assert_eq!(plan.weekly_plan[0].day, "Monday");
    assert_eq!(
        plan.weekly_plan[0].tasks,
        vec!["Review notes from all subjects", "Create study flashcards"]
    );
    assert_eq!(plan.weekly_plan[0].study_hours, 4.0);
    assert_eq!(plan.weekly_plan[6].study_hours, 2.0);
}

#[tokio::test]
async fn test_fallback_body_bytes() {
    let app = app(&unreachable_gateway().await, None);

    let (status, _, body) = send(app, post_plan(math_request())).await;
    assert_eq!(status, StatusCode::OK);
    let body = String::from_utf8(body).unwrap();
    assert!(body.starts_with(
        r#"{"overview":"We encountered an issue generating your personalized plan. Here's a general study strategy to get you started.","weeklyPlan":[{"day":"Monday","tasks":["Review notes from all subjects","Create study flashcards"],"studyHours":4},"#
    ));
    assert!(body.contains(r#""studyHours":3},"#));
    assert!(body.contains(r#"{"day":"Sunday","tasks":["Rest and light review","Plan next week"],"studyHours":2}],"#));
    assert!(!body.contains("4.0"));
}

#[tokio::test]
async fn test_generated_whole_hours_stay_integers() {
    let arguments = plan_arguments().to_string();
    let (url, _) = spawn_gateway(StatusCode::OK, tool_call_reply("generate_study_plan", &arguments)).await;

    let (_, _, body) = send(app(&url, None), post_plan(math_request())).await;
    let body = String::from_utf8(body).unwrap();
    assert!(body.contains(r#""tasks":["Kinematics problems","Math review"],"studyHours":4}"#));
    assert!(body.contains(r#""studyHours":3.5}"#));
}

#[tokio::test]
async fn test_gateway_timeout_serves_fallback() {
    let url = spawn_slow_gateway(Duration::from_secs(2)).await;
    let app = app_with_timeout(&url, None, Duration::from_millis(100));

    let started = std::time::Instant::now();
    let (status, _, body) = send(app, post_plan(math_request())).await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(status, StatusCode::OK);
    let plan: StudyPlanResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(plan, StudyPlanResponse::fallback());
}

#[tokio::test]
async fn test_rate_limit_passes_through() {
    let (url, _) = spawn_gateway(StatusCode::TOO_MANY_REQUESTS, json!({ "error": "slow down" })).await;

    let (status, headers, body) = send(app(&url, None), post_plan(math_request())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_cors(&headers);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        r#"{"error":"Rate limit exceeded. Please try again in a moment."}"#
    );
}

#[tokio::test]
async fn test_payment_required_passes_through() {
    let (url, _) = spawn_gateway(StatusCode::PAYMENT_REQUIRED, json!({})).await;

    let (status, _, body) = send(app(&url, None), post_plan(math_request())).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        r#"{"error":"Service temporarily unavailable. Please try again later."}"#
    );
}

#[tokio::test]
async fn test_other_gateway_failures_serve_fallback() {
    let replies = vec![
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "upstream exploded" })),
        (StatusCode::SERVICE_UNAVAILABLE, json!({})),
        (StatusCode::OK, tool_call_reply("generate_study_plan", "{not json")),
        (StatusCode::OK, tool_call_reply("generate_study_plan", r#"{"overview":"only this"}"#)),
        (StatusCode::OK, tool_call_reply("some_other_tool", &plan_arguments().to_string())),
        (StatusCode::OK, json!({ "choices": [] })),
    ];

    for (gateway_status, reply) in replies {
        let (url, _) = spawn_gateway(gateway_status, reply).await;
        let (status, _, body) = send(app(&url, None), post_plan(math_request())).await;
        assert_eq!(status, StatusCode::OK, "gateway status {}", gateway_status);
        let plan: StudyPlanResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(plan, StudyPlanResponse::fallback(), "gateway status {}", gateway_status);
    }
}

#[tokio::test]
async fn test_undecodable_body_serves_fallback() {
    let app = app(&unreachable_gateway().await, None);

    let (status, _, body) = send(app, post_plan("{{{ definitely not json")).await;
    assert_eq!(status, StatusCode::OK);
    let plan: StudyPlanResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(plan, StudyPlanResponse::fallback());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = app(&unreachable_gateway().await, None);
    let huge = format!(r#"{{"subjects":["{}"],"examDate":"2099-01-01"}}"#, "x".repeat(70 * 1024));

    let (status, _, _) = send(app, post_plan(huge)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_bearer_token_required_when_configured() {
    let app_without = app(&unreachable_gateway().await, Some("s3cret"));
    let (status, headers, body) = send(app_without, post_plan(math_request())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_cors(&headers);
    assert_eq!(String::from_utf8(body).unwrap(), r#"{"error":"Unauthorized"}"#);

    let app_with = app(&unreachable_gateway().await, Some("s3cret"));
    let mut request = post_plan(math_request());
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    let (status, _, _) = send(app_with, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = app(&unreachable_gateway().await, None);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Client Tests
// =============================================================================

/// Serve the endpoint on an ephemeral port and return its base URL
async fn serve_app(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_input() -> studyplan::domain::StudyPlanInput {
    PlanRequest {
        subjects: Some(vec!["Math".to_string()]),
        exam_date: Some("2099-01-01".to_string()),
        hours_per_day: Some(4.0),
        weak_subjects: Some(vec![]),
        stress_level: Some("medium".to_string()),
    }
    .validate()
    .unwrap()
}

#[tokio::test]
async fn test_client_receives_plan() {
    let (gateway, _) = spawn_gateway(
        StatusCode::OK,
        tool_call_reply("generate_study_plan", &plan_arguments().to_string()),
    )
    .await;
    let base = serve_app(app(&gateway, None)).await;

    let client = PlanClient::new(&base, ROUTE, None);
    let plan = client.request_plan(&client_input()).await.unwrap();
    assert_eq!(plan.motivation, "Every session counts.");
}

#[tokio::test]
async fn test_client_surfaces_service_error_message() {
    let (gateway, _) = spawn_gateway(StatusCode::TOO_MANY_REQUESTS, json!({})).await;
    let base = serve_app(app(&gateway, None)).await;

    let client = PlanClient::new(&base, ROUTE, None);
    let err = client.request_plan(&client_input()).await.unwrap_err();
    assert!(matches!(err, ClientError::Service { status: 429, .. }));
    assert_eq!(err.to_string(), "Rate limit exceeded. Please try again in a moment.");
}

#[tokio::test]
async fn test_client_sends_public_key() {
    let base = serve_app(app(&unreachable_gateway().await, Some("pub-key"))).await;

    let anonymous = PlanClient::new(&base, ROUTE, None);
    let err = anonymous.request_plan(&client_input()).await.unwrap_err();
    assert_eq!(err.to_string(), "Unauthorized");

    let keyed = PlanClient::new(&base, ROUTE, Some("pub-key".to_string()));
    let plan = keyed.request_plan(&client_input()).await.unwrap();
    assert_eq!(plan, StudyPlanResponse::fallback());
}
