//! Configuration resolution tests
//!
//! Covers the CLI → ENV → TOML → default priority order for storage roots,
//! credential resolution, and graceful handling of missing config files.
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate ARCHIVE_PATH or GEMINI_* are marked with #[serial].

use pavg_common::config::{
    load_toml_config, resolve_path, resolve_secret, GeminiConfig, TomlConfig,
    DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_TIMEOUT_SECS,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

const TEST_ENV: &str = "PAVG_TEST_ROOT_PATH";

fn clear_gemini_env() {
    for name in [
        "GEMINI_API_KEY",
        "GEMINI_API_BASE",
        "GEMINI_MODEL",
        "GEMINI_TIMEOUT_SECS",
    ] {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_resolve_path_cli_wins() {
    env::set_var(TEST_ENV, "/tmp/from-env");

    let resolved = resolve_path(
        Some(Path::new("/tmp/from-cli")),
        TEST_ENV,
        Some(Path::new("/tmp/from-toml")),
        "./default",
    );
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));

    env::remove_var(TEST_ENV);
}

#[test]
#[serial]
fn test_resolve_path_env_beats_toml() {
    env::set_var(TEST_ENV, "/tmp/from-env");

    let resolved = resolve_path(None, TEST_ENV, Some(Path::new("/tmp/from-toml")), "./default");
    assert_eq!(resolved, PathBuf::from("/tmp/from-env"));

    env::remove_var(TEST_ENV);
}

#[test]
#[serial]
fn test_resolve_path_falls_back_to_toml_then_default() {
    env::remove_var(TEST_ENV);

    let from_toml = resolve_path(None, TEST_ENV, Some(Path::new("/tmp/from-toml")), "./default");
    assert_eq!(from_toml, PathBuf::from("/tmp/from-toml"));

    let from_default = resolve_path(None, TEST_ENV, None, "./default");
    assert_eq!(from_default, PathBuf::from("./default"));
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    env::set_var(TEST_ENV, "   ");

    let resolved = resolve_path(None, TEST_ENV, None, "./default");
    assert_eq!(resolved, PathBuf::from("./default"));

    env::remove_var(TEST_ENV);
}

#[test]
#[serial]
fn test_resolve_secret_priority() {
    env::remove_var(TEST_ENV);
    assert_eq!(resolve_secret(TEST_ENV, Some("toml-key")).as_deref(), Some("toml-key"));
    assert_eq!(resolve_secret(TEST_ENV, Some("  ")), None);
    assert_eq!(resolve_secret(TEST_ENV, None), None);

    env::set_var(TEST_ENV, "env-key");
    assert_eq!(resolve_secret(TEST_ENV, Some("toml-key")).as_deref(), Some("env-key"));
    env::remove_var(TEST_ENV);
}

#[test]
#[serial]
fn test_gemini_config_defaults_without_sources() {
    clear_gemini_env();

    let config = GeminiConfig::resolve(&TomlConfig::default());
    assert_eq!(config.api_key, None);
    assert_eq!(config.api_base, DEFAULT_GEMINI_API_BASE);
    assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
    assert_eq!(config.timeout_secs, DEFAULT_GEMINI_TIMEOUT_SECS);
}

#[test]
#[serial]
fn test_gemini_config_env_overrides() {
    clear_gemini_env();
    env::set_var("GEMINI_API_KEY", "secret");
    env::set_var("GEMINI_API_BASE", "http://localhost:9999/v1/");
    env::set_var("GEMINI_TIMEOUT_SECS", "5");

    let config = GeminiConfig::resolve(&TomlConfig::default());
    assert_eq!(config.api_key.as_deref(), Some("secret"));
    assert_eq!(config.api_base, "http://localhost:9999/v1");
    assert_eq!(config.timeout_secs, 5);

    clear_gemini_env();
}

#[test]
#[serial]
fn test_gemini_config_invalid_timeout_uses_toml() {
    clear_gemini_env();
    env::set_var("GEMINI_TIMEOUT_SECS", "soon");

    let mut toml_config = TomlConfig::default();
    toml_config.gemini.timeout_secs = Some(30);

    let config = GeminiConfig::resolve(&toml_config);
    assert_eq!(config.timeout_secs, 30);

    clear_gemini_env();
}

#[test]
fn test_missing_toml_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_toml_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "archive_path = [not valid").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, pavg_common::Error::Config(_)));
}

#[test]
fn test_toml_file_round_trip_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "scene_output_path = \"/srv/scenes\"\n[gemini]\napi_key = \"k\"\ntimeout_secs = 45\n",
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.scene_output_path, Some(PathBuf::from("/srv/scenes")));
    assert_eq!(config.gemini.api_key.as_deref(), Some("k"));
    assert_eq!(config.gemini.timeout_secs, Some(45));
}
