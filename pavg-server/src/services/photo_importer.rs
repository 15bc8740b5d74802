//! Folder import into a collection
//!
//! Walks the top level of a source folder (no recursion), pushes every
//! supported image through the transform, and records one outcome per file.
//! A failing file never aborts its siblings.

use pavg_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::collection_store::CollectionStore;
use super::image_transform::{image_info, is_supported_image, try_transform};

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_QUALITY: u8 = 85;

/// POST /import request body
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub source_folder: PathBuf,
    pub collection_name: String,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

impl ImportRequest {
    pub fn new(source_folder: impl Into<PathBuf>, collection_name: impl Into<String>) -> Self {
        Self {
            source_folder: source_folder.into(),
            collection_name: collection_name.into(),
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Outcome for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Success {
        filename: String,
        size_bytes: u64,
        width: u32,
        height: u32,
    },
    Failed { filename: String, error: String },
}

impl FileOutcome {
    pub fn filename(&self) -> &str {
        match self {
            FileOutcome::Success { filename, .. } | FileOutcome::Failed { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success { .. })
    }
}

/// POST /import response body
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub collection_name: String,
    pub imported_count: usize,
    pub failed_count: usize,
    pub collection_path: PathBuf,
    pub details: Vec<FileOutcome>,
}

/// Import every supported image directly inside `request.source_folder`
pub fn import_folder(store: &CollectionStore, request: &ImportRequest) -> Result<ImportReport> {
    let source = request.source_folder.as_path();
    if !source.exists() {
        return Err(Error::NotFound(format!(
            "Source folder not found: {}",
            source.display()
        )));
    }
    if !source.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Path is not a directory: {}",
            source.display()
        )));
    }
    if request.max_width == 0 || request.max_height == 0 {
        return Err(Error::InvalidInput(
            "max_width and max_height must be positive".to_string(),
        ));
    }
    if !(1..=100).contains(&request.quality) {
        return Err(Error::InvalidInput(format!(
            "quality must be between 1 and 100, got {}",
            request.quality
        )));
    }

    let collection_path = store.create_collection(&request.collection_name)?;

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(source)? {
        let path = entry?.path();
        if path.is_dir() || !is_supported_image(&path) {
            continue;
        }
        candidates.push(path);
    }
    candidates.sort();

    let details: Vec<FileOutcome> = candidates
        .iter()
        .map(|path| import_one(path, &collection_path, request))
        .collect();

    let imported_count = details.iter().filter(|d| d.is_success()).count();
    let failed_count = details.len() - imported_count;

    if imported_count > 0 {
        store.touch_collection(&request.collection_name)?;
    }

    tracing::info!(
        collection = %request.collection_name,
        source = %source.display(),
        imported = imported_count,
        failed = failed_count,
        "Import finished"
    );

    Ok(ImportReport {
        collection_name: request.collection_name.clone(),
        imported_count,
        failed_count,
        collection_path,
        details,
    })
}

fn import_one(path: &Path, collection_path: &Path, request: &ImportRequest) -> FileOutcome {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dest = collection_path.join(&filename);

    let written = try_transform(
        path,
        &dest,
        request.max_width,
        request.max_height,
        request.quality,
    )
    .map_err(|e| e.to_string())
    .and_then(|written| {
        image_info(&written)
            .ok_or_else(|| format!("Written file is unreadable: {}", written.display()))
    });

    match written {
        Ok(info) => FileOutcome::Success {
            filename,
            size_bytes: info.size_bytes,
            width: info.width,
            height: info.height,
        },
        Err(error) => {
            tracing::warn!(file = %filename, error = %error, "Photo import failed");
            FileOutcome::Failed { filename, error }
        }
    }
}
