//! Rotation API
//!
//! HTTP surface over the rotation orchestrator: trigger a rotation, inspect
//! the proxy state and edit the stored settings.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use ip_rotation::{ConfigUpdate, RotationOrchestrator, RotationResponse};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RotationOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: RotationOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/device/refresh-ip", post(refresh_ip))
        .route("/api/device/status", get(device_status))
        .route("/api/device/check", get(check_connection))
        .route("/api/proxy/config", get(get_config).post(update_config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rotation-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Runs a full rotation cycle; the request stays open for the settle delay
async fn refresh_ip(State(state): State<AppState>) -> Json<RotationResponse> {
    info!("IP refresh requested");
    let result = state.orchestrator.rotate().await;
    Json(result.to_response())
}

async fn device_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.orchestrator.status().await;
    Json(serde_json::json!({
        "status": "ok",
        "proxy": status
    }))
}

async fn check_connection(State(state): State<AppState>) -> Json<serde_json::Value> {
    let check = state.orchestrator.check_connection().await;
    Json(serde_json::json!({
        "success": check.connected,
        "message": check.message,
        "ip": check.ip
    }))
}

async fn get_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "config": state.orchestrator.config_view().await
    }))
}

async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> Json<serde_json::Value> {
    match state.orchestrator.update_configuration(&update).await {
        Ok(config) => Json(serde_json::json!({
            "status": "updated",
            "config": config
        })),
        Err(e) => {
            error!(error = %e, "Failed to save configuration");
            Json(serde_json::json!({
                "status": "error",
                "message": e.to_string()
            }))
        }
    }
}
