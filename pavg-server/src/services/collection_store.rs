//! Filesystem-backed collection repository
//!
//! Layout: `<archive root>/<sanitized name>/{photos..., .metadata.json}`.
//! The directory is the record; the sidecar holds only what the filesystem
//! cannot tell us (display name and timestamps). Photo listings are derived
//! from the directory on every call.
//!
//! No locking: two concurrent imports into one collection may race on the
//! sidecar's read-modify-write and lose an `updated_at` refresh.

use pavg_common::{time, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sidecar metadata file name inside each collection directory
pub const METADATA_FILE: &str = ".metadata.json";

/// Contents of a collection's `.metadata.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One photo file in a collection, read from the filesystem at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEntry {
    pub filename: String,
    pub size_bytes: u64,
    pub modified_at: String,
}

/// Collection summary returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Display name from the sidecar (falls back to the requested name)
    pub collection_name: String,
    /// Sanitized directory name
    pub folder_name: String,
    pub path: PathBuf,
    pub photo_count: usize,
    pub total_size_bytes: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Sorted by filename
    pub photos: Vec<PhotoEntry>,
}

/// Make a collection name filesystem-safe
///
/// Alphanumerics, `-` and `_` pass through; every other character becomes
/// `_`. Lossy: "a b" and "a/b" both map to "a_b".
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Repository of collections under one archive root
#[derive(Debug, Clone)]
pub struct CollectionStore {
    root: PathBuf,
}

impl CollectionStore {
    /// Open the store, creating the archive root if missing
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_for(&self, name: &str) -> PathBuf {
        self.root.join(sanitize_name(name))
    }

    /// Create (or reuse) a collection directory and return its path
    ///
    /// The sidecar is written only if absent, so `created_at` survives
    /// repeated imports.
    pub fn create_collection(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir_for(name);
        std::fs::create_dir_all(&path)?;

        let metadata_path = path.join(METADATA_FILE);
        if !metadata_path.exists() {
            let now = time::now_iso();
            let metadata = CollectionMetadata {
                name: name.to_string(),
                created_at: now.clone(),
                updated_at: now,
            };
            write_metadata(&metadata_path, &metadata)?;
            tracing::info!(collection = %name, path = %path.display(), "Collection created");
        }

        Ok(path)
    }

    /// Sanitized names of all collections, sorted
    pub fn list_collections(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn collection_exists(&self, name: &str) -> bool {
        self.dir_for(name).is_dir()
    }

    /// Directory of an existing collection
    pub fn collection_path(&self, name: &str) -> Option<PathBuf> {
        let path = self.dir_for(name);
        path.is_dir().then_some(path)
    }

    /// Describe a collection; `None` if it does not exist
    pub fn get_collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let Some(path) = self.collection_path(name) else {
            return Ok(None);
        };

        let metadata = read_metadata(&path.join(METADATA_FILE));

        let mut photos = Vec::new();
        for entry in std::fs::read_dir(&path)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            if filename == METADATA_FILE {
                continue;
            }

            let file_meta = entry.metadata()?;
            if !file_meta.is_file() {
                continue;
            }

            let modified_at = file_meta
                .modified()
                .map(time::system_time_iso)
                .unwrap_or_default();

            photos.push(PhotoEntry {
                filename,
                size_bytes: file_meta.len(),
                modified_at,
            });
        }
        photos.sort_by(|a, b| a.filename.cmp(&b.filename));

        let (collection_name, created_at, updated_at) = match metadata {
            Some(m) => (m.name, Some(m.created_at), Some(m.updated_at)),
            None => (name.to_string(), None, None),
        };

        Ok(Some(CollectionInfo {
            collection_name,
            folder_name: sanitize_name(name),
            path,
            photo_count: photos.len(),
            total_size_bytes: photos.iter().map(|p| p.size_bytes).sum(),
            created_at,
            updated_at,
            photos,
        }))
    }

    /// Remove a collection and everything in it
    ///
    /// `false` when the collection is missing or removal fails; the reason is
    /// only logged.
    pub fn delete_collection(&self, name: &str) -> bool {
        let Some(path) = self.collection_path(name) else {
            return false;
        };

        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                tracing::info!(collection = %name, "Collection deleted");
                true
            }
            Err(e) => {
                tracing::error!(collection = %name, error = %e, "Failed to delete collection");
                false
            }
        }
    }

    /// Path of a photo inside a collection, if that file exists
    pub fn get_photo_path(&self, collection: &str, filename: &str) -> Option<PathBuf> {
        let path = self.collection_path(collection)?.join(filename);
        path.is_file().then_some(path)
    }

    /// Refresh `updated_at` in the sidecar
    ///
    /// A collection without a sidecar is left alone.
    pub fn touch_collection(&self, name: &str) -> Result<()> {
        let metadata_path = self.dir_for(name).join(METADATA_FILE);
        if let Some(mut metadata) = read_metadata(&metadata_path) {
            metadata.updated_at = time::now_iso();
            write_metadata(&metadata_path, &metadata)?;
        }
        Ok(())
    }
}

fn read_metadata(path: &Path) -> Option<CollectionMetadata> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable sidecar");
            None
        }
    }
}

fn write_metadata(path: &Path, metadata: &CollectionMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, CollectionStore) {
        let dir = tempdir().unwrap();
        let store = CollectionStore::new(dir.path().join("archive")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Summer 2024!"), "Summer_2024_");
        assert_eq!(sanitize_name("a--b__c"), "a--b__c");
        assert_eq!(sanitize_name("../etc"), "___etc");
        assert_eq!(sanitize_name("  "), "__");
        assert_eq!(sanitize_name("Café"), "Café");
    }

    #[test]
    fn test_sanitize_name_is_idempotent() {
        for name in ["Summer 2024!", "x/y\\z", "ok-name_1", "", "多 言語", "a.b.c"] {
            let once = sanitize_name(name);
            assert_eq!(sanitize_name(&once), once);
        }
    }

    #[test]
    fn test_new_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("archive");
        let store = CollectionStore::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_create_collection_twice_preserves_created_at() {
        let (_dir, store) = store();

        let path = store.create_collection("Trip 2024").unwrap();
        assert!(path.ends_with("Trip_2024"));
        std::fs::write(path.join("a.jpg"), b"x").unwrap();
        let first = store.get_collection_info("Trip 2024").unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let again = store.create_collection("Trip 2024").unwrap();
        assert_eq!(path, again);

        let second = store.get_collection_info("Trip 2024").unwrap().unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.photo_count, 1);
        assert_eq!(second.collection_name, "Trip 2024");
    }

    #[test]
    fn test_list_collections_sorted_and_ignores_files() {
        let (_dir, store) = store();
        store.create_collection("zebra").unwrap();
        store.create_collection("alpha").unwrap();
        std::fs::write(store.root().join("stray.txt"), b"x").unwrap();

        assert_eq!(store.list_collections().unwrap(), vec!["alpha", "zebra"]);
    }

    #[test]
    fn test_collection_exists_uses_sanitized_name() {
        let (_dir, store) = store();
        store.create_collection("my photos").unwrap();

        assert!(store.collection_exists("my photos"));
        assert!(store.collection_exists("my_photos"));
        assert!(store.collection_exists("my?photos"));
        assert!(!store.collection_exists("other"));
    }

    #[test]
    fn test_get_collection_info_lists_photos_sorted() {
        let (_dir, store) = store();
        let path = store.create_collection("c").unwrap();
        std::fs::write(path.join("b.jpg"), vec![0u8; 10]).unwrap();
        std::fs::write(path.join("a.jpg"), vec![0u8; 5]).unwrap();
        std::fs::create_dir(path.join("subdir")).unwrap();

        let info = store.get_collection_info("c").unwrap().unwrap();
        assert_eq!(info.folder_name, "c");
        assert_eq!(info.photo_count, 2);
        assert_eq!(info.total_size_bytes, 15);
        let names: Vec<_> = info.photos.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
        assert!(info.photos.iter().all(|p| !p.modified_at.is_empty()));
        assert!(info.created_at.is_some());
    }

    #[test]
    fn test_get_collection_info_without_sidecar_uses_input_name() {
        let (_dir, store) = store();
        std::fs::create_dir(store.root().join("bare")).unwrap();

        let info = store.get_collection_info("bare").unwrap().unwrap();
        assert_eq!(info.collection_name, "bare");
        assert_eq!(info.created_at, None);
        assert_eq!(info.photo_count, 0);
    }

    #[test]
    fn test_get_collection_info_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.get_collection_info("ghost").unwrap().is_none());
    }

    #[test]
    fn test_delete_collection() {
        let (_dir, store) = store();
        let path = store.create_collection("gone").unwrap();
        std::fs::write(path.join("p.jpg"), b"x").unwrap();

        assert!(store.delete_collection("gone"));
        assert!(!path.exists());
        assert!(!store.delete_collection("gone"));
    }

    #[test]
    fn test_delete_nonexistent_returns_false() {
        let (_dir, store) = store();
        assert!(!store.delete_collection("never-existed"));
    }

    #[test]
    fn test_get_photo_path() {
        let (_dir, store) = store();
        let path = store.create_collection("c").unwrap();
        std::fs::write(path.join("p.jpg"), b"x").unwrap();

        assert_eq!(store.get_photo_path("c", "p.jpg"), Some(path.join("p.jpg")));
        assert_eq!(store.get_photo_path("c", "missing.jpg"), None);
        assert_eq!(store.get_photo_path("nope", "p.jpg"), None);
    }

    #[test]
    fn test_touch_collection_updates_only_updated_at() {
        let (_dir, store) = store();
        store.create_collection("c").unwrap();
        let before = store.get_collection_info("c").unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.touch_collection("c").unwrap();

        let after = store.get_collection_info("c").unwrap().unwrap();
        assert_eq!(before.created_at, after.created_at);
        assert!(after.updated_at > before.updated_at);
    }
}
