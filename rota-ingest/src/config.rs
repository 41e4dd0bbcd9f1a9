//! Configuration for rota-ingest
//!
//! **Priority:** command line → environment → TOML file → compiled defaults
//!
//! The TOML file is located by [`rota_common::config::resolve_config_path`].
//! A missing file falls back to defaults; a malformed one is fatal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use rota_common::config::{
    load_toml_config, resolve_config_path, LoggingConfig, RootFolderInitializer,
    RootFolderResolver,
};
use rota_common::{Error, Result};

use crate::column_map::ColumnMap;
use crate::pipeline::PipelineConfig;
use crate::services::CleaningConfig;
use crate::sources::{CellRange, SourceLocation};

/// Module name used for the TOML file name and root-folder logging
pub const MODULE_NAME: &str = "rota-ingest";

// ============================================================================
// TOML Schema
// ============================================================================

/// Contents of `rota-ingest.toml`; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub source: SourceSection,
    pub aliases: AliasSection,
    pub output: OutputSection,
    pub state: StateSection,
    pub cleaning: CleaningConfig,
    /// Canonical field name → raw header override
    pub columns: BTreeMap<String, String>,
    pub report: ReportSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub path: String,
    pub range: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            path: "raw_schedule.json".to_string(),
            range: "A1:AC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasSection {
    pub path: String,
    pub range: String,
}

impl Default for AliasSection {
    fn default() -> Self {
        Self {
            path: "aliases.json".to_string(),
            range: "A1:C".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub canonical_path: String,
    pub views_dir: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            canonical_path: "canonical.json".to_string(),
            views_dir: "views".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSection {
    pub path: String,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: "pipeline_state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Issues included in the run summary
    pub max_issues: usize,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self { max_issues: 20 }
    }
}

/// Locate and load the TOML file, or defaults when there is none
pub fn load_config(cli_config: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_config, MODULE_NAME) {
        Some(path) => Ok(load_toml_config(&path)?.unwrap_or_default()),
        None => Ok(TomlConfig::default()),
    }
}

// ============================================================================
// Resolved Settings
// ============================================================================

/// Fully resolved, validated settings for one service instance
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub root_folder: PathBuf,
    pub source: SourceLocation,
    pub aliases: SourceLocation,
    /// Canonical dataset target (absolute path)
    pub canonical_target: String,
    /// Domain views directory (absolute path)
    pub views_target: String,
    pub state_path: PathBuf,
    pub pipeline: PipelineConfig,
    pub max_issues: usize,
}

impl IngestSettings {
    /// Resolve the root folder and build settings from a loaded TOML config
    pub fn resolve(config: &TomlConfig, cli_root_folder: Option<PathBuf>) -> Result<Self> {
        let root_folder = RootFolderResolver::new(MODULE_NAME)
            .with_cli_arg(cli_root_folder)
            .with_toml_value(config.root_folder.clone())
            .resolve();
        Self::from_toml(config, &root_folder)
    }

    /// Build settings with every relative path joined to `root_folder`
    ///
    /// Malformed values (unknown column field, bad cell range, empty date
    /// format list) are rejected here rather than during a run.
    pub fn from_toml(config: &TomlConfig, root_folder: &Path) -> Result<Self> {
        let root = RootFolderInitializer::new(root_folder.to_path_buf());
        let resolve = |p: &str| root.resolve_path(Path::new(p)).to_string_lossy().to_string();

        let column_map = ColumnMap::from_overrides(config.columns.iter())?;

        if config.cleaning.date_formats.is_empty() {
            return Err(Error::Config(
                "cleaning.date_formats must list at least one format".to_string(),
            ));
        }

        let source = location(&resolve(&config.source.path), &config.source.range, "source")?;
        let aliases = location(&resolve(&config.aliases.path), &config.aliases.range, "aliases")?;

        let settings = Self {
            root_folder: root_folder.to_path_buf(),
            source,
            aliases,
            canonical_target: resolve(&config.output.canonical_path),
            views_target: resolve(&config.output.views_dir),
            state_path: root.resolve_path(Path::new(&config.state.path)),
            pipeline: PipelineConfig {
                column_map,
                cleaning: config.cleaning.clone(),
            },
            max_issues: config.report.max_issues,
        };

        info!(
            root_folder = %settings.root_folder.display(),
            source = %settings.source,
            aliases = %settings.aliases,
            "Ingest settings resolved"
        );
        Ok(settings)
    }

    /// Root folder helper for directory creation
    pub fn root(&self) -> RootFolderInitializer {
        RootFolderInitializer::new(self.root_folder.clone())
    }
}

fn location(path: &str, range: &str, section: &str) -> Result<SourceLocation> {
    let loc = SourceLocation::new(path).with_range(range);
    if let Some(r) = &loc.range {
        r.parse::<CellRange>()
            .map_err(|e| Error::Config(format!("[{}] range: {}", section, e)))?;
    }
    Ok(loc)
}
