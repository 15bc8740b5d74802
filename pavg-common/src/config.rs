//! Configuration loading and storage-root resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error; a malformed one is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the collection archive root
pub const ARCHIVE_PATH_ENV: &str = "ARCHIVE_PATH";
/// Environment variable naming the scene output root
pub const SCENE_OUTPUT_PATH_ENV: &str = "SCENE_OUTPUT_PATH";
/// Environment variable holding the Gemini API credential
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_API_BASE_ENV: &str = "GEMINI_API_BASE";
pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";
pub const GEMINI_TIMEOUT_ENV: &str = "GEMINI_TIMEOUT_SECS";

pub const DEFAULT_ARCHIVE_PATH: &str = "./photo_archive";
pub const DEFAULT_SCENE_OUTPUT_PATH: &str = "./sceneOutput";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 120;

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Collection archive root
    #[serde(default)]
    pub archive_path: Option<PathBuf>,
    /// Scene output root
    #[serde(default)]
    pub scene_output_path: Option<PathBuf>,
    /// `[gemini]` table
    #[serde(default)]
    pub gemini: GeminiToml,
}

/// `[gemini]` table of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeminiToml {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Resolved settings for the external text-generation client
///
/// `api_key` stays `None` when no source provides a usable credential; the
/// client constructor is what rejects that.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Resolve Gemini settings from ENV → TOML → defaults
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        let gemini = &toml_config.gemini;

        let api_key = resolve_secret(GEMINI_API_KEY_ENV, gemini.api_key.as_deref());
        let api_base = non_blank_env(GEMINI_API_BASE_ENV)
            .or_else(|| gemini.api_base.clone().filter(|v| is_valid_key(v)))
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());
        let model = non_blank_env(GEMINI_MODEL_ENV)
            .or_else(|| gemini.model.clone().filter(|v| is_valid_key(v)))
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let timeout_secs = match non_blank_env(GEMINI_TIMEOUT_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    warn!("Ignoring invalid {}={:?}", GEMINI_TIMEOUT_ENV, raw);
                    gemini.timeout_secs.unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS)
                }
            },
            None => gemini.timeout_secs.unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS),
        };

        Self {
            api_key,
            api_base,
            model,
            timeout_secs,
        }
    }
}

/// Default location of `config.toml` (`~/.config/pavg/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pavg").join("config.toml"))
}

/// Load a TOML config file
///
/// Missing file → defaults with a log line. Unreadable or malformed file →
/// `Error::Config`.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// Resolve a storage root following CLI → ENV → TOML → default
pub fn resolve_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
    default: &str,
) -> PathBuf {
    if let Some(path) = cli_arg {
        debug!(env = env_var_name, "Path taken from command line");
        return path.to_path_buf();
    }

    if let Some(path) = non_blank_env(env_var_name) {
        debug!(env = env_var_name, "Path taken from environment");
        return PathBuf::from(path);
    }

    if let Some(path) = toml_value {
        debug!(env = env_var_name, "Path taken from config file");
        return path.to_path_buf();
    }

    PathBuf::from(default)
}

/// Resolve a credential from ENV → TOML, ignoring blank values
pub fn resolve_secret(env_var_name: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = non_blank_env(env_var_name);
    let toml_value = toml_value.filter(|v| is_valid_key(v)).map(str::to_string);

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} set in both environment and config file; using environment",
            env_var_name
        );
    }

    env_value.or(toml_value)
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_key(v))
}
