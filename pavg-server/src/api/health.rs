//! Health check and service index

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process is serving
    pub status: String,
    /// Local time of the check
    pub timestamp: String,
    /// Module name ("pavg-server")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// "available" when a text-generation credential was configured
    pub scene_generation: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = chrono::Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: pavg_common::time::now_iso(),
        module: "pavg-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        scene_generation: if state.composer.is_some() {
            "available"
        } else {
            "unavailable"
        }
        .to_string(),
    })
}

/// GET /
///
/// Service name, build identification and endpoint map.
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Photo Archive VR Gallery API",
        "version": env!("CARGO_PKG_VERSION"),
        "build": {
            "git_hash": env!("GIT_HASH"),
            "build_timestamp": env!("BUILD_TIMESTAMP"),
            "build_profile": env!("BUILD_PROFILE"),
        },
        "endpoints": {
            "/import": "Import photos from a folder",
            "/collections": "List all collections",
            "/collections/{name}": "Get or delete a collection",
            "/scenes/generate": "Generate A-Frame VR gallery scene",
            "/scenes": "List all generated scenes",
            "/health": "Health check",
        }
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}
