//! HTTP presentation layer for chronofact.
//!
//! Exposes the `/graph/*` REST surface over the same `Services` container the
//! MCP and CLI presentation layers use, so all three speak to one core.

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use chronofact_core::prelude::*;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

mod handlers;
mod middleware;
mod models;

pub use models::*;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub bind_address: SocketAddr,
    pub enable_cors: bool,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".parse().unwrap(),
            enable_cors: true,
        }
    }
}

/// HTTP presentation adapter. Owns the `Services` container directly since
/// `PresentationAdapter::start`/`stop` take no service argument.
pub struct HttpServer {
    config: HttpServerConfig,
    services: Arc<Services>,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, services: Arc<Services>) -> Self {
        Self { config, services }
    }

    fn build_router(&self) -> Router {
        let app_state = AppState { services: self.services.clone() };

        let mut router = Router::new()
            .route("/health", get(handlers::health::health_check))
            .route("/graph/episodes", post(handlers::graph::add_episode))
            .route("/graph/search", post(handlers::graph::search))
            .route("/graph/episodes/:uuid", delete(handlers::graph::delete_episode))
            .route("/graph/facts/:uuid", patch(handlers::graph::update_fact))
            .route("/graph/analysis/causality-timeline", get(handlers::analysis::causality_timeline))
            .route("/graph/analysis/recurring-incidents", get(handlers::analysis::recurring_incidents))
            .route("/graph/analysis/component-impact", get(handlers::analysis::component_impact))
            .route("/graph/analysis/component-severity", get(handlers::analysis::component_severity))
            .route("/graph/analysis/flow-metrics", get(handlers::analysis::flow_metrics))
            .with_state(app_state);

        let service_builder = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(middleware::request_logging))
            .layer(axum::middleware::from_fn(middleware::request_timeout));

        if self.config.enable_cors {
            router = router.layer(CorsLayer::permissive());
        }

        router.layer(service_builder)
    }
}

#[async_trait]
impl PresentationAdapter for HttpServer {
    async fn start(&self) -> Result<(), PresentationError> {
        info!("starting HTTP server on {}", self.config.bind_address);

        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|e| PresentationError::StartupFailed(format!("failed to bind to {}: {e}", self.config.bind_address)))?;

        info!("HTTP server listening on {}", self.config.bind_address);

        axum::serve(listener, router)
            .await
            .map_err(|e| PresentationError::StartupFailed(format!("server error: {e}")))?;

        Ok(())
    }

    async fn stop(&self) -> Result<(), PresentationError> {
        info!("stopping HTTP server");
        Ok(())
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

/// Standard API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
impl<T: PartialEq> PartialEq for ApiResponse<T> {
    fn eq(&self, other: &Self) -> bool {
        self.success == other.success && self.data == other.data && self.error == other.error
    }
}

/// Maps domain errors onto HTTP status codes per the REST error table.
pub fn handle_core_error(error: CoreError) -> (StatusCode, Json<ApiResponse<()>>) {
    let (status, message) = match error {
        CoreError::Storage(GraphError::NodeNotFound(msg)) => (StatusCode::NOT_FOUND, format!("node not found: {msg}")),
        CoreError::Storage(GraphError::EdgeNotFound(msg)) => (StatusCode::NOT_FOUND, format!("edge not found: {msg}")),
        CoreError::Storage(GraphError::ConstraintViolation(msg)) => (StatusCode::CONFLICT, format!("constraint violation: {msg}")),
        CoreError::Storage(GraphError::Timeout(msg)) => (StatusCode::GATEWAY_TIMEOUT, format!("store timeout: {msg}")),
        CoreError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string()),
        CoreError::Llm(LlmError::Timeout) => (StatusCode::REQUEST_TIMEOUT, "LLM request timeout".to_string()),
        CoreError::Llm(_) => (StatusCode::BAD_GATEWAY, "LLM service error".to_string()),
        CoreError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        CoreError::Serialization(_) => (StatusCode::BAD_REQUEST, "invalid request format".to_string()),
        CoreError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, format!("configuration error: {msg}")),
        CoreError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {msg}")),
    };

    error!("API error: {} - {}", status, message);
    (status, Json(ApiResponse::<()>::error(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_port_8000() {
        let config = HttpServerConfig::default();
        assert_eq!(config.bind_address.port(), 8000);
        assert!(config.enable_cors);
    }

    #[test]
    fn api_response_success_wraps_data() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert!(response.error.is_none());
    }

    #[test]
    fn api_response_error_has_no_data() {
        let response = ApiResponse::<()>::error("test error");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("test error".to_string()));
    }

    #[test]
    fn node_not_found_maps_to_404() {
        let (status, _) = handle_core_error(CoreError::Storage(GraphError::NodeNotFound("x".into())));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn llm_timeout_maps_to_408() {
        let (status, _) = handle_core_error(CoreError::Llm(LlmError::Timeout));
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }
}
