//! Boundary traits for everything outside the engine
//!
//! The engine reads raw rows and the alias table, writes the canonical
//! dataset and domain views, and persists one piece of run state. Each of
//! these is an injected trait object so file-backed and in-memory
//! implementations are interchangeable.
//!
//! # Implementations
//! - [`grid::GridFileSource`]: spreadsheet-shaped JSON grids (raw rows + aliases)
//! - [`json_sink::JsonFileSink`]: canonical grid + view documents on disk
//! - [`state_file::JsonStateStore`]: run state in one JSON file
//! - [`memory`]: in-memory versions of all four, for tests and previews

pub mod grid;
pub mod json_sink;
pub mod memory;
pub mod range;
pub mod state_file;

pub use grid::GridFileSource;
pub use json_sink::JsonFileSink;
pub use memory::{MemorySink, MemorySource, MemoryStateStore};
pub use range::CellRange;
pub use state_file::JsonStateStore;

use std::fmt;

use rota_common::Result;

use crate::models::{CanonicalRecord, PersonAlias, PipelineRunState, RawDataset};
use crate::services::ViewDocument;

// ============================================================================
// Location Descriptor
// ============================================================================

/// Where to read from: a location plus an optional A1 cell range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub location: String,
    pub range: Option<String>,
}

impl SourceLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        let range = range.into();
        self.range = if range.trim().is_empty() {
            None
        } else {
            Some(range)
        };
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{}!{}", self.location, range),
            None => write!(f, "{}", self.location),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Raw schedule reader (read-only)
///
/// Any failure is fatal for the run and must be reported as `Error::Source`.
#[async_trait::async_trait]
pub trait RawSource: Send + Sync {
    async fn read_rows(&self, location: &SourceLocation) -> Result<RawDataset>;
}

/// Alias table reader (read-only); failures are `Error::AliasSource`
#[async_trait::async_trait]
pub trait AliasSource: Send + Sync {
    async fn read_aliases(&self, location: &SourceLocation) -> Result<Vec<PersonAlias>>;
}

/// Output writer
///
/// Every write replaces the target entirely; nothing is appended.
#[async_trait::async_trait]
pub trait OutputSink: Send + Sync {
    async fn write_canonical(&self, target: &str, records: &[CanonicalRecord]) -> Result<()>;

    async fn write_view(
        &self,
        target: &str,
        view_name: &str,
        partition: &str,
        document: &ViewDocument,
    ) -> Result<()>;

    /// Remove partitions of `view_name` not listed in `keep`
    ///
    /// Returns the removed partition names. A view with nothing written yet
    /// is not an error.
    async fn prune_views(&self, target: &str, view_name: &str, keep: &[String])
        -> Result<Vec<String>>;
}

/// Keyed get/set of the persisted run state
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<PipelineRunState>>;

    async fn set(&self, key: &str, state: &PipelineRunState) -> Result<()>;
}
