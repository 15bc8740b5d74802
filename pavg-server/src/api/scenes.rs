//! Scene generation and listing

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::{list_scenes, SceneRecord};
use crate::AppState;

/// POST /scenes/generate request body
#[derive(Debug, Deserialize)]
pub struct GenerateSceneRequest {
    pub collection_names: Vec<String>,
    #[serde(default)]
    pub scene_name: Option<String>,
}

/// GET /scenes response
#[derive(Debug, Serialize)]
pub struct SceneListResponse {
    pub total_scenes: usize,
    pub scenes: Vec<SceneRecord>,
}

/// POST /scenes/generate
///
/// 404 if any collection is missing, 503 if no generator credential was
/// configured at startup. Model failures are absorbed by the fallback scene.
pub async fn generate_scene(
    State(state): State<AppState>,
    Json(request): Json<GenerateSceneRequest>,
) -> ApiResult<Json<SceneRecord>> {
    let composer = state.composer.clone().ok_or_else(|| {
        ApiError::Unavailable(format!(
            "Scene generation is not configured ({} not set)",
            pavg_common::config::GEMINI_API_KEY_ENV
        ))
    })?;

    let record = composer
        .generate_scene(&request.collection_names, request.scene_name.as_deref())
        .await?;

    Ok(Json(record))
}

/// GET /scenes
pub async fn get_scenes(State(state): State<AppState>) -> ApiResult<Json<SceneListResponse>> {
    let root = state.scene_output_root.clone();
    let scenes = tokio::task::spawn_blocking(move || list_scenes(&root)).await??;

    Ok(Json(SceneListResponse {
        total_scenes: scenes.len(),
        scenes,
    }))
}

pub fn scene_routes() -> Router<AppState> {
    Router::new()
        .route("/scenes", get(get_scenes))
        .route("/scenes/generate", post(generate_scene))
}
