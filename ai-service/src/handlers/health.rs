use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::AppState;

pub const SERVICE_NAME: &str = "SnaKTox AI Service";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since startup.
    pub uptime: f64,
    pub version: String,
    pub services: BTreeMap<&'static str, &'static str>,
}

/// Service banner.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": state.config.version,
        "status": "operational",
        "docs": Value::Null,
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let external_apis = if state.config.has_credential() {
        "operational"
    } else {
        "mock"
    };

    let services = BTreeMap::from([
        ("snake_detection", "operational"),
        ("chatbot", "operational"),
        ("external_apis", external_apis),
    ]);

    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        version: state.config.version.clone(),
        services,
    })
}

/// Readiness check. No dependencies to wait on.
pub async fn readiness_check() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

pub async fn liveness_check() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}
