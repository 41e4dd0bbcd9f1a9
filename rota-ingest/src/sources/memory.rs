//! In-memory adapters
//!
//! Used by tests and by preview runs that must not touch external storage.

use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use rota_common::{Error, Result};

use super::{AliasSource, OutputSink, RawSource, SourceLocation, StateStore};
use crate::models::{CanonicalRecord, PersonAlias, PipelineRunState, RawDataset};
use crate::services::ViewDocument;

// ============================================================================
// Source
// ============================================================================

/// Serves a fixed dataset and alias table regardless of location
///
/// `failing()` builds a source whose every read fails, for fatal-path tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    dataset: RwLock<RawDataset>,
    aliases: RwLock<Vec<PersonAlias>>,
    fail: bool,
}

impl MemorySource {
    pub fn new(dataset: RawDataset, aliases: Vec<PersonAlias>) -> Self {
        Self {
            dataset: RwLock::new(dataset),
            aliases: RwLock::new(aliases),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Replace the served dataset (simulates an edit of the source sheet)
    pub async fn set_dataset(&self, dataset: RawDataset) {
        *self.dataset.write().await = dataset;
    }

    pub async fn set_aliases(&self, aliases: Vec<PersonAlias>) {
        *self.aliases.write().await = aliases;
    }
}

#[async_trait::async_trait]
impl RawSource for MemorySource {
    async fn read_rows(&self, location: &SourceLocation) -> Result<RawDataset> {
        if self.fail {
            return Err(Error::Source(format!("Source unavailable: {}", location)));
        }
        Ok(self.dataset.read().await.clone())
    }
}

#[async_trait::async_trait]
impl AliasSource for MemorySource {
    async fn read_aliases(&self, location: &SourceLocation) -> Result<Vec<PersonAlias>> {
        if self.fail {
            return Err(Error::AliasSource(format!("Alias source unavailable: {}", location)));
        }
        Ok(self.aliases.read().await.clone())
    }
}

// ============================================================================
// Sink
// ============================================================================

/// Keeps the last write to each target
#[derive(Debug, Default)]
pub struct MemorySink {
    canonical: RwLock<HashMap<String, Vec<CanonicalRecord>>>,
    views: RwLock<BTreeMap<(String, String, String), ViewDocument>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn canonical(&self, target: &str) -> Option<Vec<CanonicalRecord>> {
        self.canonical.read().await.get(target).cloned()
    }

    pub async fn view(&self, target: &str, view_name: &str, partition: &str) -> Option<ViewDocument> {
        self.views
            .read()
            .await
            .get(&(target.to_string(), view_name.to_string(), partition.to_string()))
            .cloned()
    }

    /// Number of view partitions currently held
    pub async fn view_count(&self) -> usize {
        self.views.read().await.len()
    }

    /// True when nothing has been written
    pub async fn is_empty(&self) -> bool {
        self.canonical.read().await.is_empty() && self.views.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl OutputSink for MemorySink {
    async fn write_canonical(&self, target: &str, records: &[CanonicalRecord]) -> Result<()> {
        self.canonical
            .write()
            .await
            .insert(target.to_string(), records.to_vec());
        Ok(())
    }

    async fn write_view(
        &self,
        target: &str,
        view_name: &str,
        partition: &str,
        document: &ViewDocument,
    ) -> Result<()> {
        self.views.write().await.insert(
            (target.to_string(), view_name.to_string(), partition.to_string()),
            document.clone(),
        );
        Ok(())
    }

    async fn prune_views(
        &self,
        target: &str,
        view_name: &str,
        keep: &[String],
    ) -> Result<Vec<String>> {
        let mut views = self.views.write().await;
        let stale: Vec<(String, String, String)> = views
            .keys()
            .filter(|(t, v, p)| t == target && v == view_name && !keep.contains(p))
            .cloned()
            .collect();
        for key in &stale {
            views.remove(key);
        }
        Ok(stale.into_iter().map(|(_, _, p)| p).collect())
    }
}

// ============================================================================
// State Store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<String, PipelineRunState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<PipelineRunState>> {
        Ok(self.states.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, state: &PipelineRunState) -> Result<()> {
        self.states
            .write()
            .await
            .insert(key.to_string(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_overwrites_target() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);

        sink.write_canonical("c", &[CanonicalRecord::new(1), CanonicalRecord::new(2)])
            .await
            .unwrap();
        sink.write_canonical("c", &[CanonicalRecord::new(3)]).await.unwrap();

        let stored = sink.canonical("c").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].source_row, 3);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = MemorySource::failing();
        let loc = SourceLocation::new("sheet");
        assert!(matches!(source.read_rows(&loc).await, Err(Error::Source(_))));
        assert!(matches!(source.read_aliases(&loc).await, Err(Error::AliasSource(_))));
    }
}
