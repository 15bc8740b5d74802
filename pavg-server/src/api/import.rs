//! POST /import

use axum::{extract::State, routing::post, Json, Router};

use crate::error::ApiResult;
use crate::services::{import_folder, ImportReport, ImportRequest};
use crate::AppState;

/// POST /import
///
/// Transforms every supported image directly inside `source_folder` into the
/// named collection. Per-file failures are reported in `details`; only a
/// missing (404) or non-directory (400) source fails the whole call.
pub async fn import_photos(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<ImportReport>> {
    tracing::info!(
        source = %request.source_folder.display(),
        collection = %request.collection_name,
        "Import requested"
    );

    let store = state.store.clone();
    let report = tokio::task::spawn_blocking(move || import_folder(&store, &request)).await??;

    Ok(Json(report))
}

pub fn import_routes() -> Router<AppState> {
    Router::new().route("/import", post(import_photos))
}
