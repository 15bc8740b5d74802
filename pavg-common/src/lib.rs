//! # PAVG Common Library
//!
//! Shared code for the PAVG (Photo Archive VR Gallery) services including:
//! - Error taxonomy shared by the storage and scene layers
//! - Configuration loading (CLI/ENV → TOML → compiled defaults)
//! - Timestamp formatting used in sidecar and scene metadata

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
