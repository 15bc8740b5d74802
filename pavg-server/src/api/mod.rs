//! HTTP API handlers for pavg-server

pub mod collections;
pub mod health;
pub mod import;
pub mod scenes;

pub use collections::collection_routes;
pub use health::health_routes;
pub use import::import_routes;
pub use scenes::scene_routes;
