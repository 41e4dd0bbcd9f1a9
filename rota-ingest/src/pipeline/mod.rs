//! Normalization Pipeline
//!
//! Drives one raw dataset through
//! `LOADED → MAPPED → CLEANED → RESOLVED → VALIDATED`, leaving the terminal
//! `WRITTEN`/`PREVIEWED` step to the caller that owns the sink.
//!
//! # Error Handling
//! - Row isolation: a row that fails cleaning or resolution keeps going with
//!   empty values and its issues attached; it never aborts the batch
//! - Only an illegal stage transition is returned as `Err`
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(PipelineConfig::default(), AliasResolver::new(aliases));
//! let output = pipeline.process(&dataset, PipelineSession::new())?;
//! let rows_to_write = output.accepted();
//! ```

pub mod stages;

use std::collections::BTreeSet;
use tracing::{debug, info};

use rota_common::Result;

use crate::column_map::ColumnMap;
use crate::models::{
    CanonicalRecord, PipelineSession, PipelineStage, RawDataset, ValidationIssue, ValidationReport,
};
use crate::services::{AliasResolver, CleaningConfig, Validator};

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub column_map: ColumnMap,
    pub cleaning: CleaningConfig,
}

/// A row excluded from write-back, with every issue recorded for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub record: CanonicalRecord,
    pub issues: Vec<ValidationIssue>,
}

/// Per-row outcome: the record when it carries no errors
pub type RowOutcome = std::result::Result<CanonicalRecord, RejectedRow>;

/// Everything one pipeline pass produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Session, left at `VALIDATED`
    pub session: PipelineSession,
    /// One outcome per non-blank raw row, in source order
    pub outcomes: Vec<RowOutcome>,
    pub report: ValidationReport,
}

impl PipelineOutput {
    /// Records with zero errors (warnings allowed)
    pub fn accepted(&self) -> Vec<CanonicalRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| o.as_ref().ok().cloned())
            .collect()
    }

    pub fn rejected(&self) -> Vec<&RejectedRow> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err()).collect()
    }

    /// Every assembled record, accepted or not
    pub fn records(&self) -> Vec<&CanonicalRecord> {
        self.outcomes
            .iter()
            .map(|o| match o {
                Ok(record) => record,
                Err(rejected) => &rejected.record,
            })
            .collect()
    }
}

/// Pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    resolver: AliasResolver,
    validator: Validator,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, resolver: AliasResolver) -> Self {
        Self {
            config,
            resolver,
            validator: Validator::new(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Run every stage up to `VALIDATED`
    ///
    /// `session` must be at `LOADED`, i.e. the dataset has already been read.
    pub fn process(&self, dataset: &RawDataset, mut session: PipelineSession) -> Result<PipelineOutput> {
        // MAPPED
        let binding = stages::bind_headers(&self.config.column_map, &dataset.headers);
        let mapped = stages::map_dataset(&binding, dataset);
        session.transition_to(PipelineStage::Mapped)?;
        debug!(
            rows = mapped.len(),
            missing_columns = binding.issues.len(),
            "Columns mapped"
        );

        // CLEANED
        let cleaned: Vec<_> = mapped
            .iter()
            .map(|row| stages::clean_row(row, &self.config.cleaning))
            .collect();
        session.transition_to(PipelineStage::Cleaned)?;

        // RESOLVED
        let (records, row_issues): (Vec<CanonicalRecord>, Vec<Vec<ValidationIssue>>) = cleaned
            .into_iter()
            .map(|row| stages::resolve_row(row, &self.resolver))
            .unzip();
        session.transition_to(PipelineStage::Resolved)?;

        // VALIDATED
        let mut issues = binding.issues;
        issues.extend(row_issues.into_iter().flatten());
        issues.extend(self.validator.check(&records));
        let report = ValidationReport::from_issues(records.len(), issues);
        session.transition_to(PipelineStage::Validated)?;

        let error_rows: BTreeSet<usize> = report.rows_with_errors();
        let outcomes: Vec<RowOutcome> = records
            .into_iter()
            .map(|record| {
                if error_rows.contains(&record.source_row) {
                    let issues = report
                        .issues_for_row(record.source_row)
                        .into_iter()
                        .cloned()
                        .collect();
                    Err(RejectedRow { record, issues })
                } else {
                    Ok(record)
                }
            })
            .collect();

        info!(
            run_id = %session.run_id,
            total = report.total_rows,
            success = report.success_rows,
            warnings = report.warning_rows,
            errors = report.error_rows,
            "Pipeline validated dataset"
        );

        Ok(PipelineOutput {
            session,
            outcomes,
            report,
        })
    }
}
