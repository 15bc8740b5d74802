//! Collection listing, detail and deletion

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::services::CollectionInfo;
use crate::AppState;

/// GET /collections response
#[derive(Debug, Serialize)]
pub struct CollectionListResponse {
    pub total_collections: usize,
    pub collections: Vec<CollectionInfo>,
}

/// DELETE /collections/:name response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// GET /collections
pub async fn list_collections(State(state): State<AppState>) -> ApiResult<Json<CollectionListResponse>> {
    let store = state.store.clone();
    let collections = tokio::task::spawn_blocking(move || {
        let mut infos = Vec::new();
        for name in store.list_collections()? {
            if let Some(info) = store.get_collection_info(&name)? {
                infos.push(info);
            }
        }
        Ok::<_, pavg_common::Error>(infos)
    })
    .await??;

    Ok(Json(CollectionListResponse {
        total_collections: collections.len(),
        collections,
    }))
}

/// GET /collections/:name
pub async fn get_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<CollectionInfo>> {
    let store = state.store.clone();
    let lookup = name.clone();
    let info = tokio::task::spawn_blocking(move || store.get_collection_info(&lookup)).await??;

    info.map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Collection not found: {}", name)))
}

/// DELETE /collections/:name
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let store = state.store.clone();
    let target = name.clone();
    // None: no such collection; Some(false): removal failed
    let deleted = tokio::task::spawn_blocking(move || {
        store
            .collection_exists(&target)
            .then(|| store.delete_collection(&target))
    })
    .await?;

    match deleted {
        None => return Err(ApiError::NotFound(format!("Collection not found: {}", name))),
        Some(false) => return Err(ApiError::Internal("Failed to delete collection".to_string())),
        Some(true) => {}
    }

    Ok(Json(DeleteResponse {
        message: format!("Collection '{}' deleted successfully", name),
    }))
}

pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/collections", get(list_collections))
        .route(
            "/collections/:name",
            get(get_collection).delete(delete_collection),
        )
}
