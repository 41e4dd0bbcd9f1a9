//! File-backed output sink
//!
//! - Canonical dataset: one grid document, header row = the fixed field order
//! - Domain views: `<views_dir>/<view>/<partition>.json`, one envelope each
//!
//! Every file is written to a temporary sibling and renamed into place, so a
//! reader never observes a half-written target.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use rota_common::{Error, Result};

use super::OutputSink;
use crate::models::{CanonicalRecord, FIELD_ORDER};
use crate::services::ViewDocument;

#[derive(Serialize)]
struct CanonicalGrid<'a> {
    generated_at: &'a str,
    values: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct JsonFileSink {
    base_dir: Option<PathBuf>,
}

impl JsonFileSink {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn path_for(&self, target: &str) -> PathBuf {
        let path = Path::new(target);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Path a view partition is written to
    pub fn view_path(&self, target: &str, view_name: &str, partition: &str) -> PathBuf {
        self.path_for(target)
            .join(view_name)
            .join(format!("{}.json", partition))
    }
}

/// Serialize and atomically replace `path`
async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| sink_error(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &body)
        .await
        .map_err(|e| sink_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| sink_error(path, e))?;

    debug!(path = %path.display(), bytes = body.len(), "Output written");
    Ok(())
}

fn sink_error(path: &Path, e: std::io::Error) -> Error {
    Error::Sink(format!("Failed to write {}: {}", path.display(), e))
}

#[async_trait::async_trait]
impl OutputSink for JsonFileSink {
    async fn write_canonical(&self, target: &str, records: &[CanonicalRecord]) -> Result<()> {
        let path = self.path_for(target);

        let mut values = Vec::with_capacity(records.len() + 1);
        values.push(FIELD_ORDER.iter().map(|f| f.to_string()).collect());
        values.extend(records.iter().map(CanonicalRecord::to_row));

        let stamp = rota_common::time::to_rfc3339(&rota_common::time::now());
        let grid = CanonicalGrid {
            generated_at: &stamp,
            values,
        };
        write_json_atomic(&path, &grid).await?;

        info!(path = %path.display(), records = records.len(), "Canonical dataset written");
        Ok(())
    }

    async fn write_view(
        &self,
        target: &str,
        view_name: &str,
        partition: &str,
        document: &ViewDocument,
    ) -> Result<()> {
        let path = self.view_path(target, view_name, partition);
        write_json_atomic(&path, document).await?;

        debug!(
            view = view_name,
            partition = partition,
            records = document.record_count,
            "View partition written"
        );
        Ok(())
    }

    async fn prune_views(
        &self,
        target: &str,
        view_name: &str,
        keep: &[String],
    ) -> Result<Vec<String>> {
        let dir = self.path_for(target).join(view_name);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(sink_error(&dir, e)),
        };

        let mut removed = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| sink_error(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(partition) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if keep.iter().any(|k| k == partition) {
                continue;
            }

            let partition = partition.to_string();
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| sink_error(&path, e))?;
            info!(view = view_name, partition = %partition, "Stale view partition removed");
            removed.push(partition);
        }
        removed.sort();
        Ok(removed)
    }
}
