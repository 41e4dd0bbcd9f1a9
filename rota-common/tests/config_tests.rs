//! Integration tests for bootstrap configuration
//!
//! Covers:
//! - Missing TOML files do not cause termination (warning + defaults)
//! - Malformed TOML is a configuration error
//! - Root folder priority: CLI → ROTA_ROOT_FOLDER → ROTA_ROOT → TOML → default
//! - Config file location: CLI → ROTA_CONFIG → config dir
//!
//! Tests that touch ROTA_* environment variables are marked `#[serial]` so
//! they never run concurrently.

use rota_common::config::{
    load_toml_config, resolve_config_path, CompiledDefaults, LoggingConfig, RootFolderInitializer,
    RootFolderResolver, CONFIG_ENV_VAR, ROOT_ENV_VAR, ROOT_FOLDER_ENV_VAR,
};
use rota_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug, Deserialize, PartialEq)]
struct SampleConfig {
    root_folder: Option<PathBuf>,
    #[serde(default)]
    logging: LoggingConfig,
}

fn clear_env() {
    env::remove_var(ROOT_FOLDER_ENV_VAR);
    env::remove_var(ROOT_ENV_VAR);
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.to_string_lossy().contains("rota"));
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.log_file.is_none());
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    clear_env();

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_env_beats_toml_value() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV_VAR, "/tmp/rota-env");

    let root_folder = RootFolderResolver::new("test-module")
        .with_toml_value(Some(PathBuf::from("/tmp/rota-toml")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/rota-env"));

    clear_env();
}

#[test]
#[serial]
fn test_primary_env_var_beats_short_alias() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV_VAR, "/tmp/rota-primary");
    env::set_var(ROOT_ENV_VAR, "/tmp/rota-short");

    assert_eq!(
        RootFolderResolver::new("test-module").resolve(),
        PathBuf::from("/tmp/rota-primary")
    );

    env::remove_var(ROOT_FOLDER_ENV_VAR);
    assert_eq!(
        RootFolderResolver::new("test-module").resolve(),
        PathBuf::from("/tmp/rota-short")
    );

    clear_env();
}

#[test]
#[serial]
fn test_cli_arg_beats_env() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV_VAR, "/tmp/rota-env");

    let root_folder = RootFolderResolver::new("test-module")
        .with_cli_arg(Some(PathBuf::from("/tmp/rota-cli")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/rota-cli"));

    clear_env();
}

#[test]
#[serial]
fn test_toml_value_used_when_env_empty() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV_VAR, "   ");

    let root_folder = RootFolderResolver::new("test-module")
        .with_toml_value(Some(PathBuf::from("/tmp/rota-toml")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/rota-toml"));

    clear_env();
}

#[test]
#[serial]
fn test_config_path_priority() {
    clear_env();

    let cli = resolve_config_path(Some(Path::new("/etc/rota/cli.toml")), "rota-ingest");
    assert_eq!(cli, Some(PathBuf::from("/etc/rota/cli.toml")));

    env::set_var(CONFIG_ENV_VAR, "/etc/rota/env.toml");
    let from_env = resolve_config_path(None, "rota-ingest");
    assert_eq!(from_env, Some(PathBuf::from("/etc/rota/env.toml")));
    clear_env();

    if let Some(default) = resolve_config_path(None, "rota-ingest") {
        assert!(default.ends_with(Path::new("rota").join("rota-ingest.toml")));
    }
}

#[test]
fn test_missing_toml_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let loaded: Option<SampleConfig> =
        load_toml_config(&dir.path().join("absent.toml")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_toml_with_partial_logging_section() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rota-ingest.toml");
    std::fs::write(
        &path,
        "root_folder = \"/srv/rota\"\n[logging]\nfile = \"/var/log/rota.log\"\n",
    )
    .unwrap();

    let loaded: SampleConfig = load_toml_config(&path).unwrap().unwrap();
    assert_eq!(loaded.root_folder, Some(PathBuf::from("/srv/rota")));
    assert_eq!(loaded.logging.level, "info");
    assert_eq!(loaded.logging.file, Some(PathBuf::from("/var/log/rota.log")));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "root_folder = [unterminated").unwrap();

    let result: rota_common::Result<Option<SampleConfig>> = load_toml_config(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_initializer_creates_nested_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b");

    let init = RootFolderInitializer::new(root.clone());
    init.ensure_directory_exists().unwrap();
    assert!(root.is_dir());

    // Idempotent
    init.ensure_directory_exists().unwrap();
}
