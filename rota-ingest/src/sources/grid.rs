//! Spreadsheet-shaped JSON grid reader
//!
//! Reads the raw schedule and the alias table from JSON documents shaped like
//! a spreadsheet values response:
//!
//! ```json
//! {"range": "Roster!A1:AC", "values": [["主日日期", "讲员"], ["2025/10/05", "张牧师"]]}
//! ```
//!
//! A bare 2-D array is accepted too. Non-string cells (numbers, booleans)
//! are converted to their JSON text; `null` becomes an empty cell.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use rota_common::{Error, Result};

use super::range::CellRange;
use super::{AliasSource, RawSource, SourceLocation};
use crate::models::{PersonAlias, RawDataset, RawRow};

#[derive(Deserialize)]
#[serde(untagged)]
enum GridDocument {
    Bare(Vec<Vec<serde_json::Value>>),
    Values { values: Vec<Vec<serde_json::Value>> },
}

impl GridDocument {
    fn into_cells(self) -> Vec<Vec<String>> {
        let rows = match self {
            GridDocument::Bare(values) => values,
            GridDocument::Values { values } => values,
        };
        rows.into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// File-backed reader for raw rows and the alias table
///
/// Relative locations are resolved against `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct GridFileSource {
    base_dir: Option<PathBuf>,
}

impl GridFileSource {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn path_for(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Read the grid and cut it to the location's range
    async fn read_grid(&self, location: &SourceLocation) -> std::result::Result<Vec<Vec<String>>, String> {
        let range = match &location.range {
            Some(r) => r.parse::<CellRange>().map_err(|e| e.to_string())?,
            None => CellRange::all(),
        };

        let path = self.path_for(&location.location);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let document: GridDocument = serde_json::from_str(&content)
            .map_err(|e| format!("Malformed grid JSON in {}: {}", path.display(), e))?;

        Ok(range.apply(&document.into_cells()))
    }
}

#[async_trait::async_trait]
impl RawSource for GridFileSource {
    async fn read_rows(&self, location: &SourceLocation) -> Result<RawDataset> {
        let mut grid = self.read_grid(location).await.map_err(Error::Source)?;

        if grid.is_empty() {
            warn!(location = %location, "Raw source range holds no header row");
            return Ok(RawDataset::default());
        }

        let headers: Vec<String> = grid.remove(0);
        let total = grid.len();
        let rows: Vec<RawRow> = grid
            .iter()
            .enumerate()
            .map(|(i, values)| RawRow::from_parallel(i + 1, &headers, values))
            .filter(|row| !row.is_blank())
            .collect();

        info!(
            location = %location,
            columns = headers.len(),
            rows = rows.len(),
            blank_rows_skipped = total - rows.len(),
            "Raw rows loaded"
        );

        Ok(RawDataset::new(headers, rows))
    }
}

#[async_trait::async_trait]
impl AliasSource for GridFileSource {
    async fn read_aliases(&self, location: &SourceLocation) -> Result<Vec<PersonAlias>> {
        let grid = self.read_grid(location).await.map_err(Error::AliasSource)?;

        let mut aliases = Vec::new();
        // First row is the header
        for (i, row) in grid.iter().enumerate().skip(1) {
            let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");
            let (alias_text, person_id, display_name) = (cell(0), cell(1), cell(2));

            if alias_text.is_empty() && person_id.is_empty() && display_name.is_empty() {
                continue;
            }
            if alias_text.is_empty() || person_id.is_empty() {
                warn!(
                    row = i + 1,
                    alias = %alias_text,
                    person_id = %person_id,
                    "Alias row missing alias or person id, ignored"
                );
                continue;
            }

            let display_name = if display_name.is_empty() {
                alias_text
            } else {
                display_name
            };
            aliases.push(PersonAlias::new(alias_text, person_id, display_name));
        }

        debug!(location = %location, aliases = aliases.len(), "Alias table loaded");
        Ok(aliases)
    }
}
