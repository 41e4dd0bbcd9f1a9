//! Pipeline run state machine
//!
//! A run progresses strictly forward through:
//! LOADED → MAPPED → CLEANED → RESOLVED → VALIDATED → {WRITTEN | PREVIEWED}
//!
//! There is no retry within a run and no backwards transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rota_common::{Error, Result};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineStage {
    /// Raw rows read from the source
    Loaded,
    /// Raw headers mapped to canonical fields
    Mapped,
    /// Field cleaning rules applied
    Cleaned,
    /// Name-bearing fields resolved through the alias table
    Resolved,
    /// Validator run, report assembled
    Validated,
    /// Canonical dataset persisted to the sink
    Written,
    /// Dry run: dataset materialized in memory only
    Previewed,
}

impl PipelineStage {
    /// Stages reachable from `self` in one step
    pub fn successors(self) -> &'static [PipelineStage] {
        match self {
            PipelineStage::Loaded => &[PipelineStage::Mapped],
            PipelineStage::Mapped => &[PipelineStage::Cleaned],
            PipelineStage::Cleaned => &[PipelineStage::Resolved],
            PipelineStage::Resolved => &[PipelineStage::Validated],
            PipelineStage::Validated => &[PipelineStage::Written, PipelineStage::Previewed],
            PipelineStage::Written | PipelineStage::Previewed => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub run_id: Uuid,
    pub old_stage: PipelineStage,
    pub new_stage: PipelineStage,
    pub transitioned_at: DateTime<Utc>,
}

/// One pipeline run (in-memory state)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSession {
    pub run_id: Uuid,
    pub stage: PipelineStage,
    pub transitions: Vec<StageTransition>,
    pub started_at: DateTime<Utc>,
    /// Set on reaching a terminal stage
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineSession {
    /// Start a session at LOADED
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4())
    }

    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            stage: PipelineStage::Loaded,
            transitions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Advance to `new_stage`; rejects anything but an immediate successor
    pub fn transition_to(&mut self, new_stage: PipelineStage) -> Result<StageTransition> {
        if !self.stage.successors().contains(&new_stage) {
            return Err(Error::Internal(format!(
                "Illegal pipeline transition {:?} -> {:?}",
                self.stage, new_stage
            )));
        }

        let transition = StageTransition {
            run_id: self.run_id,
            old_stage: self.stage,
            new_stage,
            transitioned_at: Utc::now(),
        };
        self.stage = new_stage;
        if new_stage.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        tracing::info!(
            run_id = %self.run_id,
            from = ?transition.old_stage,
            to = ?new_stage,
            "Pipeline stage transition"
        );

        self.transitions.push(transition.clone());
        Ok(transition)
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new()
    }
}
