//! pavg-server library interface
//!
//! Exposes the services and router for the binary and integration tests.

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use services::{CollectionStore, SceneComposer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Collection repository under the archive root
    pub store: CollectionStore,
    /// Scene generator; `None` when no model credential was configured
    pub composer: Option<Arc<SceneComposer>>,
    /// Scene output root (listing works without a composer)
    pub scene_output_root: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: CollectionStore,
        scene_output_root: PathBuf,
        composer: Option<Arc<SceneComposer>>,
    ) -> Self {
        Self {
            store,
            composer,
            scene_output_root,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::import_routes())
        .merge(api::collection_routes())
        .merge(api::scene_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
