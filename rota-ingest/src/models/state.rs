//! Persisted pipeline run state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key under which the singleton run state is stored
pub const PIPELINE_STATE_KEY: &str = "normalization_pipeline";

/// Singleton state shared across runs
///
/// Read at the start of every run; written only after a successful write-back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunState {
    /// SHA-256 (hex) of the canonical raw-dataset serialization
    pub content_fingerprint: String,

    /// Non-blank raw rows seen by the last run
    pub row_count: usize,

    pub last_run_timestamp: DateTime<Utc>,

    /// Number of completed (written) runs
    pub run_counter: u64,
}
