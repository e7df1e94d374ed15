//! Health check endpoints
//!
//! - `/health`: "healthy" + version (for load balancers)
//! - `/health/detailed`: per-component status

use super::AppState;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use parley_core::Orchestrator;
use serde::Serialize;
use std::time::Instant;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health response with per-component checks
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub session_store: ComponentHealth,
    pub flows: ComponentHealth,
    pub inference: ComponentHealth,
}

/// Individual component health status
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: None,
        }
    }

    fn healthy_with_details(latency_ms: u64, details: serde_json::Value) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: Some(details),
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
            details: None,
        }
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn detailed_health_check(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let store = check_store(&state.orchestrator).await;
    let flows = check_flows(&state.orchestrator);
    // configuration only, no live probe
    let inference = ComponentHealth::healthy_with_details(
        0,
        serde_json::json!({ "base_url": state.inference_url }),
    );

    let overall_status = if store.status == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    Json(DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            session_store: store,
            flows,
            inference,
        },
    })
}

async fn check_store(orchestrator: &Orchestrator) -> ComponentHealth {
    let start = Instant::now();
    match orchestrator.ping().await {
        Ok(()) => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
        // category only
        Err(e) => ComponentHealth::unhealthy(error_category(&e).to_string()),
    }
}

fn error_category(error: &parley_core::Error) -> &'static str {
    match error {
        parley_core::Error::StoreClosed => "store closed",
        parley_core::Error::Storage(_) => "storage unreachable",
        _ => "unavailable",
    }
}

fn check_flows(orchestrator: &Orchestrator) -> ComponentHealth {
    ComponentHealth::healthy_with_details(
        0,
        serde_json::json!({
            "flows": orchestrator.registry().flow_ids(),
            "intents": orchestrator.intents().len(),
        }),
    )
}

/// Create health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::orchestrator;

    #[test]
    fn test_component_health_unhealthy() {
        let h = ComponentHealth::unhealthy("store closed".to_string());
        assert_eq!(h.status, "unhealthy");
        assert!(h.latency_ms.is_none());
        assert_eq!(h.error.as_deref(), Some("store closed"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_detailed_health() {
        let state = AppState::new(orchestrator(), "http://inference:8000");
        let response = detailed_health_check(State(state)).await;

        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.checks.session_store.status, "healthy");
        let flows = response.0.checks.flows.details.as_ref().unwrap();
        assert_eq!(flows["flows"].as_array().unwrap().len(), 4);
        assert_eq!(flows["intents"], 1);
    }

    #[tokio::test]
    async fn test_detailed_health_degraded_when_store_closed() {
        let orchestrator = orchestrator();
        orchestrator.store().close().await.unwrap();
        let state = AppState::new(orchestrator, "http://inference:8000");

        let response = detailed_health_check(State(state)).await;
        assert_eq!(response.0.status, "degraded");
        assert_eq!(
            response.0.checks.session_store.error.as_deref(),
            Some("store closed")
        );
    }
}
