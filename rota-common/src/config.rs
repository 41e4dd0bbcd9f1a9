//! Bootstrap configuration loading and root folder resolution
//!
//! Resolution priority for every setting handled here:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is never fatal: a warning is logged and compiled
//! defaults apply. A TOML file that exists but does not parse is fatal.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "ROTA_CONFIG";

/// Primary environment variable for the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "ROTA_ROOT_FOLDER";

/// Secondary (short) environment variable for the root folder
pub const ROOT_ENV_VAR: &str = "ROTA_ROOT";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Root folder resolver
///
/// Walks the priority chain once per call to [`RootFolderResolver::resolve`].
/// `ROTA_ROOT_FOLDER` takes precedence over `ROTA_ROOT`.
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_value: None,
        }
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Root folder read from the TOML config file
    pub fn with_toml_value(mut self, path: Option<PathBuf>) -> Self {
        self.toml_value = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV_VAR, ROOT_ENV_VAR] {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    debug!(module = %self.module_name, env = var, "Root folder from environment");
                    return PathBuf::from(value);
                }
            }
        }

        if let Some(path) = &self.toml_value {
            debug!(module = %self.module_name, "Root folder from TOML config");
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder on startup and resolves paths relative to it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder (and parents) if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder).map_err(|e| {
                Error::Config(format!(
                    "Failed to create root folder {}: {}",
                    self.root_folder.display(),
                    e
                ))
            })?;
            info!(path = %self.root_folder.display(), "Created root folder");
        }
        Ok(())
    }

    /// Absolute paths pass through; relative paths are joined to the root folder
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_folder.join(path)
        }
    }
}

/// Locate the TOML config file for a module
///
/// Command-line path first, then `ROTA_CONFIG`, then
/// `<config_dir>/rota/<module_name>.toml`. Returns `None` when no
/// candidate is known; the returned path is not checked for existence.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
        if !value.trim().is_empty() {
            return Some(PathBuf::from(value));
        }
    }

    dirs::config_dir().map(|d| d.join("rota").join(format!("{}.toml", module_name)))
}

/// Load and parse a TOML config file
///
/// Returns `Ok(None)` (with a warning) when the file does not exist.
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using compiled defaults"
        );
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(Some(config))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/rota (or /var/lib/rota for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("rota"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/rota"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("rota"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/rota"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("rota"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\rota"))
    } else {
        PathBuf::from("./rota_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert!(logging.file.is_none());
    }

    #[test]
    fn test_cli_arg_wins_over_everything() {
        let resolver = RootFolderResolver::new("test-module")
            .with_cli_arg(Some(PathBuf::from("/tmp/cli-root")))
            .with_toml_value(Some(PathBuf::from("/tmp/toml-root")));
        assert_eq!(resolver.resolve(), PathBuf::from("/tmp/cli-root"));
    }

    #[test]
    fn test_resolve_path_keeps_absolute() {
        let init = RootFolderInitializer::new(PathBuf::from("/srv/rota"));
        assert_eq!(
            init.resolve_path(Path::new("/data/raw.json")),
            PathBuf::from("/data/raw.json")
        );
        assert_eq!(
            init.resolve_path(Path::new("raw.json")),
            PathBuf::from("/srv/rota/raw.json")
        );
    }
}
