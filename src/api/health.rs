//! Health check endpoints

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::app::AppState;
use crate::services::ServiceHealth;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub store: bool,
    pub backend: &'static str,
    pub services: HashMap<String, ServiceHealth>,
}

/// Health check - always returns OK if the server is running
async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check - verifies the store answers and started services are healthy
async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let store_ok = state.store.ping().await.is_ok();
    let services = state.services.health_all().await;
    let ready = store_ok && services.values().all(ServiceHealth::is_healthy);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadyResponse {
            ready,
            store: store_ok,
            backend: state.store.backend(),
            services,
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
