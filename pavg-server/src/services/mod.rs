//! Core services: photo transform, collection storage, import, scene generation

pub mod collection_store;
pub mod gemini_client;
pub mod image_transform;
pub mod photo_importer;
pub mod scene_composer;
pub mod scene_template;
pub mod text_generator;

pub use collection_store::{sanitize_name, CollectionInfo, CollectionStore, PhotoEntry};
pub use gemini_client::GeminiClient;
pub use photo_importer::{import_folder, FileOutcome, ImportReport, ImportRequest};
pub use scene_composer::{list_scenes, SceneComposer, SceneRecord};
pub use text_generator::{GenerationError, TextGenerator};
