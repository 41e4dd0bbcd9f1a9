//! Change Detection and Skip Logic
//!
//! Decides whether the normalization pipeline needs to run at all by
//! comparing a content fingerprint of the raw dataset against the one stored
//! by the last successful run.
//!
//! # Fingerprint
//! SHA-256 over a canonical serialization of the dataset:
//! - rows in source order
//! - within a row, `(header, value)` pairs sorted by header
//! - values trimmed; empty cells omitted
//! - every string length-prefixed so concatenations cannot collide
//!
//! Column reordering and whitespace padding therefore do not change the
//! fingerprint; any added, removed or edited cell does.
//!
//! Skipping is an optimization only. A skip never returns a report, so stale
//! validation results are never presented as current.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

use rota_common::Result;

use crate::models::{PipelineRunState, RawDataset, PIPELINE_STATE_KEY};
use crate::sources::StateStore;

// ============================================================================
// Decision Types
// ============================================================================

/// Fingerprint plus the row count it was computed over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFingerprint {
    pub hash: String,
    pub row_count: usize,
}

/// Reason attached to a run/skip decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunReason {
    /// No stored state
    FirstRun,
    RowsAdded,
    RowsRemoved,
    /// Same row count, different content
    RowsModified,
    /// Fingerprint identical to the stored one
    NoChange,
    /// Comparison bypassed by the caller
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "reason", rename_all = "snake_case")]
pub enum RunDecision {
    Run(RunReason),
    Skip(RunReason),
}

impl RunDecision {
    pub fn should_run(&self) -> bool {
        matches!(self, RunDecision::Run(_))
    }

    pub fn reason(&self) -> RunReason {
        match self {
            RunDecision::Run(r) | RunDecision::Skip(r) => *r,
        }
    }
}

// ============================================================================
// Pure Functions
// ============================================================================

/// Compute the content fingerprint of a raw dataset
pub fn fingerprint(dataset: &RawDataset) -> DatasetFingerprint {
    let mut hasher = Sha256::new();
    let mut row_count = 0usize;

    for row in dataset.rows.iter().filter(|r| !r.is_blank()) {
        row_count += 1;

        let mut cells: Vec<(&str, &str)> = row
            .cells()
            .iter()
            .map(|(h, v)| (h.trim(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        cells.sort();

        hasher.update(b"R");
        hasher.update((cells.len() as u64).to_le_bytes());
        for (header, value) in cells {
            update_str(&mut hasher, header);
            update_str(&mut hasher, value);
        }
    }

    DatasetFingerprint {
        hash: format!("{:x}", hasher.finalize()),
        row_count,
    }
}

fn update_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Compare a fingerprint with the previous run state
pub fn should_run(
    current: &DatasetFingerprint,
    previous: Option<&PipelineRunState>,
    force: bool,
) -> RunDecision {
    if force {
        return RunDecision::Run(RunReason::Forced);
    }

    let Some(previous) = previous else {
        return RunDecision::Run(RunReason::FirstRun);
    };

    if previous.content_fingerprint == current.hash {
        return RunDecision::Skip(RunReason::NoChange);
    }

    let reason = if current.row_count > previous.row_count {
        RunReason::RowsAdded
    } else if current.row_count < previous.row_count {
        RunReason::RowsRemoved
    } else {
        RunReason::RowsModified
    };
    RunDecision::Run(reason)
}

// ============================================================================
// Change Detector
// ============================================================================

/// Fingerprint comparison against an injected state store
pub struct ChangeDetector {
    store: Arc<dyn StateStore>,
    state_key: String,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            state_key: PIPELINE_STATE_KEY.to_string(),
        }
    }

    pub fn with_state_key(store: Arc<dyn StateStore>, state_key: impl Into<String>) -> Self {
        Self {
            store,
            state_key: state_key.into(),
        }
    }

    /// Fingerprint the dataset and decide whether to run
    pub async fn evaluate(
        &self,
        dataset: &RawDataset,
        force: bool,
    ) -> Result<(DatasetFingerprint, RunDecision)> {
        let current = fingerprint(dataset);
        let previous = self.store.get(&self.state_key).await?;
        let decision = should_run(&current, previous.as_ref(), force);

        match decision {
            RunDecision::Run(reason) => info!(
                fingerprint = %current.hash,
                rows = current.row_count,
                reason = ?reason,
                "Change detected: pipeline will run"
            ),
            RunDecision::Skip(reason) => info!(
                fingerprint = %current.hash,
                rows = current.row_count,
                reason = ?reason,
                "Skip: raw dataset unchanged since last run"
            ),
        }

        Ok((current, decision))
    }

    /// Persist state after a successful write-back
    pub async fn record_success(&self, current: &DatasetFingerprint) -> Result<PipelineRunState> {
        let previous = self.store.get(&self.state_key).await?;
        let state = PipelineRunState {
            content_fingerprint: current.hash.clone(),
            row_count: current.row_count,
            last_run_timestamp: rota_common::time::now(),
            run_counter: previous.map(|p| p.run_counter).unwrap_or(0) + 1,
        };
        self.store.set(&self.state_key, &state).await?;

        debug!(
            run_counter = state.run_counter,
            fingerprint = %state.content_fingerprint,
            "Pipeline run state updated"
        );
        Ok(state)
    }
}

// ============================================================================
// Tests
// ============================================================================
