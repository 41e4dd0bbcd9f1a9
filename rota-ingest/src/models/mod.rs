//! Data models for rota-ingest

pub mod canonical;
pub mod person;
pub mod raw;
pub mod report;
pub mod session;
pub mod state;

pub use canonical::{CanonicalRecord, Role, FIELD_ORDER, LIST_SEPARATOR};
pub use person::{Person, PersonAlias};
pub use raw::{RawDataset, RawRow};
pub use report::{Severity, ValidationIssue, ValidationReport, DATASET_ROW};
pub use session::{PipelineSession, PipelineStage, StageTransition};
pub use state::{PipelineRunState, PIPELINE_STATE_KEY};
