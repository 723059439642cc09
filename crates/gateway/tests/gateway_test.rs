use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use verdant_controller::{AgentRegistry, GenerationAgent, Orchestrator};
use verdant_core::mocks::{ScriptedGenerationBackend, StaticAgent};
use verdant_core::types::Capability;
use verdant_gateway::{GatewayConfig, GatewayServer};
use verdant_governance::ExecutionMetricsTracker;

fn app_with(backend: Arc<ScriptedGenerationBackend>) -> Router {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(Arc::new(StaticAgent::new(
        "gardener",
        &[
            Capability::Consultation,
            Capability::Analysis,
            Capability::TextGeneration,
            Capability::Gardening,
        ],
    )));
    registry.register(Arc::new(GenerationAgent::new(backend)));

    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        Arc::new(ExecutionMetricsTracker::new()),
    ));
    GatewayServer::new(GatewayConfig::default(), orchestrator).build_router()
}

fn app() -> Router {
    app_with(Arc::new(ScriptedGenerationBackend::producing(1)))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, json) = send(app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_dispatch_routes_consultation() {
    let (status, json) = send(
        app(),
        "POST",
        "/v1/dispatch",
        Some(json!({
            "intent": {"type": "consultation", "subtype": "plantCare", "confidence": 0.9},
            "context": {"userMessage": "My roses have black spots"}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isSuccess"], true);
    assert_eq!(json["agentId"], "gardener");
}

#[tokio::test]
async fn test_dispatch_generation_with_attachment() {
    let backend = Arc::new(ScriptedGenerationBackend::producing(1));
    let (status, json) = send(
        app_with(backend.clone()),
        "POST",
        "/v1/dispatch",
        Some(json!({
            "intent": {"type": "generation", "subtype": "imageGeneration", "confidence": 0.95},
            "context": {
                "userMessage": "Add a pond to this yard",
                "attachments": [
                    {"id": "photo-1", "name": "yard.jpg", "mimeType": "image/jpeg", "data": STANDARD.encode([1u8, 2, 3])}
                ]
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agentId"], "image_generator");
    assert_eq!(json["attachments"].as_array().unwrap().len(), 1);

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].images[0].as_ref(), &[1u8, 2, 3]);
}

#[tokio::test]
async fn test_dispatch_without_eligible_agent_is_not_found() {
    let registry = Arc::new(AgentRegistry::new());
    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        Arc::new(ExecutionMetricsTracker::new()),
    ));
    let app = GatewayServer::new(GatewayConfig::default(), orchestrator).build_router();

    let (status, json) = send(
        app,
        "POST",
        "/v1/dispatch",
        Some(json!({"intent": {"type": "analysis"}, "context": {"userMessage": "hi"}})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "no_eligible_agent");
    assert!(json["trace_id"].is_string());
}

#[tokio::test]
async fn test_dispatch_to_named_agent() {
    let (status, json) = send(
        app(),
        "POST",
        "/v1/dispatch",
        Some(json!({"intent": {"type": "unclear"}, "agentId": "gardener"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agentId"], "gardener");

    let (status, json) = send(
        app(),
        "POST",
        "/v1/dispatch",
        Some(json!({"intent": {}, "agentId": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "agent_not_found");
}

#[tokio::test]
async fn test_agents_listing() {
    let (status, json) = send(app(), "GET", "/v1/agents", None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["gardener", "image_generator"]);
}

#[tokio::test]
async fn test_metrics_reflect_dispatches() {
    let app = app();
    let dispatch = json!({
        "intent": {"type": "consultation", "confidence": 0.8},
        "context": {"userMessage": "When should I prune apple trees?"}
    });
    let (status, _) = send(app.clone(), "POST", "/v1/dispatch", Some(dispatch)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, summary) = send(app.clone(), "GET", "/v1/metrics", None).await;
    assert_eq!(summary["components"]["orchestrator"]["totalExecutions"], 1);
    assert_eq!(summary["components"]["agent:gardener"]["successCount"], 1);

    let (_, agents) = send(app, "GET", "/v1/metrics/agents", None).await;
    assert_eq!(agents["gardener"]["totalExecutions"], 1);
    assert_eq!(agents["image_generator"]["totalExecutions"], 0);
}
