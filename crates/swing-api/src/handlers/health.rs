//! Health check handlers.

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

const VISION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub active_sessions: usize,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub vision: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(provider: &str, latency_ms: u64) -> Self {
        Self {
            status: "ok".to_string(),
            provider: provider.to_string(),
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    fn error(provider: &str, msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            provider: provider.to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }
}

/// Readiness probe: is the vision provider reachable?
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let provider = state.vision.provider();
    let start = Instant::now();

    let vision = match tokio::time::timeout(VISION_CHECK_TIMEOUT, state.vision.health_check()).await {
        Ok(Ok(true)) => CheckStatus::ok(provider, start.elapsed().as_millis() as u64),
        Ok(Ok(false)) => CheckStatus::error(provider, "provider reported unhealthy"),
        Ok(Err(e)) => CheckStatus::error(provider, e.to_string()),
        Err(_) => CheckStatus::error(provider, "health check timed out"),
    };

    let all_ok = vision.status == "ok";
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        active_sessions: state.sessions.len().await,
        checks: ReadinessChecks { vision },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
