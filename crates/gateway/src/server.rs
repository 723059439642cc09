//! Axum-based HTTP server for the gateway.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use verdant_controller::Orchestrator;
use verdant_core::{
    config::ServerConfig,
    types::{Intent, RequestContext},
    Error, Result,
};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for GatewayConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
            enable_tracing: true,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(config: GatewayConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            state: Arc::new(AppState { orchestrator }),
            metrics_handle: None,
        }
    }

    /// Set metrics handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/v1/dispatch", post(dispatch_handler))
            .route("/v1/agents", get(agents_handler))
            .route("/v1/metrics", get(metrics_summary_handler))
            .route("/v1/metrics/agents", get(agent_metrics_handler))
            .with_state(self.state.clone());

        if let Some(handle) = &self.metrics_handle {
            let handle = handle.clone();
            router = router.route("/metrics", get(move || async move { handle.render() }));
        }

        if self.config.enable_cors {
            router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any));
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, "Gateway server starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Dispatch request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    /// Classifier output, parsed leniently.
    #[serde(default)]
    pub intent: Value,
    #[serde(default)]
    pub context: RequestContext,
    /// Bypass routing and run this agent.
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Trace ID.
    pub trace_id: Option<String>,
}

impl ErrorResponse {
    fn from_error(err: &Error, trace_id: String) -> Response {
        let status = match err {
            Error::NoEligibleAgent(_) | Error::AgentNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidIntent(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                code: err.category().to_string(),
                message: err.to_string(),
                trace_id: Some(trace_id),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Dispatch handler.
async fn dispatch_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DispatchRequest>,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let intent = Intent::from_value(&payload.intent);

    tracing::info!(
        trace_id = %trace_id,
        intent_type = %intent.intent_type,
        message_len = payload.context.user_message.len(),
        history = payload.context.history.len(),
        "Processing dispatch request"
    );

    let outcome = match payload.agent_id.as_deref() {
        Some(agent_id) => {
            state
                .orchestrator
                .dispatch_to(agent_id, intent, payload.context)
                .await
        }
        None => state.orchestrator.handle(intent, payload.context).await,
    };

    match outcome {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::warn!(trace_id = %trace_id, error = %e, "Dispatch failed");
            ErrorResponse::from_error(&e, trace_id)
        }
    }
}

/// Registered agents.
async fn agents_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.registry().descriptors())
}

/// Tracker summary over every component.
async fn metrics_summary_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.metrics().summary())
}

/// Per-agent statistics from the registry.
async fn agent_metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.registry().all_metrics())
}
