//! Run state persisted in a single JSON file
//!
//! The file holds a map of state key → [`PipelineRunState`]. A missing file
//! reads as "no previous state"; a corrupt one is a `StateStore` error, since
//! silently treating it as a first run would hide the corruption.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

use rota_common::{Error, Result};

use super::StateStore;
use crate::models::PipelineRunState;

type StateMap = BTreeMap<String, PipelineRunState>;

pub struct JsonStateStore {
    path: PathBuf,
    /// Serializes read-modify-write of the file within this process
    lock: Mutex<()>,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn load(&self) -> Result<StateMap> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::StateStore(format!("Corrupt state file {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateMap::new()),
            Err(e) => Err(Error::StateStore(format!(
                "Failed to read state file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn store(&self, states: &StateMap) -> Result<()> {
        let body = serde_json::to_vec_pretty(states)?;
        let write_err = |e: std::io::Error| {
            Error::StateStore(format!(
                "Failed to write state file {}: {}",
                self.path.display(),
                e
            ))
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, &body).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for JsonStateStore {
    async fn get(&self, key: &str) -> Result<Option<PipelineRunState>> {
        let _guard = self.lock.lock().await;
        let mut states = self.load().await?;
        Ok(states.remove(key))
    }

    async fn set(&self, key: &str, state: &PipelineRunState) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut states = self.load().await?;
        states.insert(key.to_string(), state.clone());
        self.store(&states).await?;

        debug!(path = %self.path.display(), key = key, "Run state saved");
        Ok(())
    }
}
