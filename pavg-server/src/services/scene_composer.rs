//! VR gallery scene generation
//!
//! Output layout under the scene root:
//! - `<scene>.html`: the generated document
//! - `<scene>_metadata.json`: the [`SceneRecord`]
//! - `<scene>_assets/<collection folder>/<photo>`: full copies of the photos
//!
//! Collections are only read. Every requested collection is resolved before
//! anything is written, so an unknown name leaves the scene root untouched.

use pavg_common::{time, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::collection_store::{CollectionInfo, CollectionStore};
use super::scene_template::{build_prompt, fallback_document, strip_code_fence, ManifestEntry};
use super::text_generator::TextGenerator;

/// Suffix of scene metadata files in the output root
pub const SCENE_METADATA_SUFFIX: &str = "_metadata.json";

/// Persisted description of a generated scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub scene_name: String,
    /// Collection names as requested, in request order
    pub collections: Vec<String>,
    pub photo_count: usize,
    #[serde(default)]
    pub created_at: Option<String>,
    pub file_path: PathBuf,
    pub assets_directory: PathBuf,
}

/// Builds scenes from collections using an injected text generator
pub struct SceneComposer {
    output_root: PathBuf,
    store: CollectionStore,
    generator: Arc<dyn TextGenerator>,
}

impl SceneComposer {
    /// Create the composer, creating the output root if missing
    pub fn new(
        output_root: impl Into<PathBuf>,
        store: CollectionStore,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let output_root = output_root.into();
        std::fs::create_dir_all(&output_root)?;
        Ok(Self {
            output_root,
            store,
            generator,
        })
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Generate a scene for `collection_names`
    ///
    /// Fails with `NotFound` if any collection is missing and `InvalidInput`
    /// for an empty list or an unusable scene name. Generator failures never
    /// surface: the fallback document is written instead.
    pub async fn generate_scene(
        &self,
        collection_names: &[String],
        scene_name: Option<&str>,
    ) -> Result<SceneRecord> {
        if collection_names.is_empty() {
            return Err(Error::InvalidInput(
                "collection_names must not be empty".to_string(),
            ));
        }

        let scene_name = match scene_name.filter(|name| !name.is_empty()) {
            Some(name) => {
                validate_scene_name(name)?;
                name.to_string()
            }
            None => format!("gallery_{}", time::compact_stamp()),
        };

        let store = self.store.clone();
        let names = collection_names.to_vec();
        let output_root = self.output_root.clone();
        let scene = scene_name.clone();
        let (collections, manifest, assets_directory) = tokio::task::spawn_blocking(move || {
            let collections = resolve_collections(&store, &names)?;
            let (manifest, assets_directory) = copy_assets(&output_root, &scene, &collections)?;
            Ok::<_, Error>((collections, manifest, assets_directory))
        })
        .await
        .map_err(|e| Error::Internal(format!("Asset copy task failed: {}", e)))??;

        let display_names: Vec<String> = collections
            .iter()
            .map(|c| c.collection_name.clone())
            .collect();
        let document = self.render(&scene_name, &display_names, &manifest).await;

        let file_path = self.output_root.join(format!("{}.html", scene_name));
        tokio::fs::write(&file_path, document).await?;

        let record = SceneRecord {
            scene_name: scene_name.clone(),
            collections: collection_names.to_vec(),
            photo_count: manifest.len(),
            created_at: Some(time::now_iso()),
            file_path,
            assets_directory,
        };

        let metadata_path = self
            .output_root
            .join(format!("{}{}", scene_name, SCENE_METADATA_SUFFIX));
        tokio::fs::write(&metadata_path, serde_json::to_string_pretty(&record)?).await?;

        tracing::info!(
            scene = %record.scene_name,
            collections = ?record.collections,
            photos = record.photo_count,
            "Scene generated"
        );

        Ok(record)
    }

    /// All scene records in the output root, newest first
    pub fn list_scenes(&self) -> Result<Vec<SceneRecord>> {
        list_scenes(&self.output_root)
    }

    async fn render(
        &self,
        scene_name: &str,
        display_names: &[String],
        manifest: &[ManifestEntry],
    ) -> String {
        let prompt = build_prompt(display_names, manifest);

        match self.generator.generate(&prompt).await {
            Ok(text) => {
                let document = strip_code_fence(&text);
                if document.is_empty() {
                    tracing::warn!(scene = %scene_name, "Generator returned an empty document, using fallback");
                    fallback_document(manifest)
                } else {
                    document
                }
            }
            Err(e) => {
                tracing::warn!(
                    scene = %scene_name,
                    generator = %self.generator.name(),
                    error = %e,
                    "Scene generation failed, using fallback"
                );
                fallback_document(manifest)
            }
        }
    }
}

/// Read every `*_metadata.json` in `output_root`, newest `created_at` first
///
/// Records without `created_at` sort last; unparseable files are skipped.
pub fn list_scenes(output_root: &Path) -> Result<Vec<SceneRecord>> {
    if !output_root.exists() {
        return Ok(Vec::new());
    }

    let mut scenes = Vec::new();
    for entry in std::fs::read_dir(output_root)? {
        let path = entry?.path();
        let is_metadata = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(SCENE_METADATA_SUFFIX))
            .unwrap_or(false);
        if !is_metadata || !path.is_file() {
            continue;
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(Error::from)
            .and_then(|content| serde_json::from_str::<SceneRecord>(&content).map_err(Error::from));
        match parsed {
            Ok(record) => scenes.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable scene metadata");
            }
        }
    }

    scenes.sort_by(|a, b| {
        let a_key = a.created_at.as_deref().unwrap_or("");
        let b_key = b.created_at.as_deref().unwrap_or("");
        b_key.cmp(a_key)
    });
    Ok(scenes)
}

/// Scene names are used verbatim as file stems; they must not leave the root
fn validate_scene_name(name: &str) -> Result<()> {
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(Error::InvalidInput(format!(
            "scene_name must be a plain file name: {}",
            name
        )));
    }
    Ok(())
}

fn resolve_collections(store: &CollectionStore, names: &[String]) -> Result<Vec<CollectionInfo>> {
    names
        .iter()
        .map(|name| {
            store
                .get_collection_info(name)?
                .ok_or_else(|| Error::NotFound(format!("Collection not found: {}", name)))
        })
        .collect()
}

fn copy_assets(
    output_root: &Path,
    scene_name: &str,
    collections: &[CollectionInfo],
) -> Result<(Vec<ManifestEntry>, PathBuf)> {
    let assets_dir_name = format!("{}_assets", scene_name);
    let assets_directory = output_root.join(&assets_dir_name);
    std::fs::create_dir_all(&assets_directory)?;

    let mut manifest = Vec::new();
    for collection in collections {
        let collection_dir = assets_directory.join(&collection.folder_name);
        std::fs::create_dir_all(&collection_dir)?;

        for photo in &collection.photos {
            std::fs::copy(
                collection.path.join(&photo.filename),
                collection_dir.join(&photo.filename),
            )?;
            manifest.push(ManifestEntry {
                collection: collection.collection_name.clone(),
                filename: photo.filename.clone(),
                path: format!(
                    "{}/{}/{}",
                    assets_dir_name, collection.folder_name, photo.filename
                ),
            });
        }
    }

    Ok((manifest, assets_directory))
}
