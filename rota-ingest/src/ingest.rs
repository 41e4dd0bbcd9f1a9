//! Ingest service
//!
//! One call = one run:
//! 1. Read the raw dataset (fatal on failure)
//! 2. Fingerprint it and decide run/skip
//! 3. Read the alias table (fatal on failure)
//! 4. Normalize and validate
//! 5. Dry run → `PREVIEWED`; otherwise write canonical rows and domain
//!    views, reach `WRITTEN`, then record the new run state
//!
//! A skip returns before step 3 with an empty report: stale results are
//! never presented as current.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use rota_common::Result;

use crate::config::IngestSettings;
use crate::models::{
    CanonicalRecord, PipelineSession, PipelineStage, ValidationIssue, ValidationReport,
};
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::services::{
    transform, AliasResolver, ChangeDetector, DatasetFingerprint, DomainViews, RunDecision,
    PREACHING_VIEW, ROSTER_VIEW,
};
use crate::sources::{
    AliasSource, GridFileSource, JsonFileSink, JsonStateStore, OutputSink, RawSource, StateStore,
};

/// Caller-selected run mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Transform and validate, but write nothing (terminal stage `PREVIEWED`)
    pub dry_run: bool,
    /// Bypass the fingerprint comparison
    pub force: bool,
}

/// Compact run result returned to CLI callers
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub decision: RunDecision,
    /// `None` when the run was skipped
    pub stage: Option<PipelineStage>,
    pub dry_run: bool,
    pub fingerprint: String,
    pub total_rows: usize,
    pub success_rows: usize,
    pub warning_rows: usize,
    pub error_rows: usize,
    /// Total issues, of which at most `max_issues` are listed
    pub issue_count: usize,
    pub issues: Vec<ValidationIssue>,
    /// Canonical records produced (written, or that would be written)
    pub dataset_size: usize,
    /// View partitions written (0 for dry runs)
    pub views_written: usize,
}

/// Full result of one run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub summary: RunSummary,
    /// Full report; `None` when skipped
    pub report: Option<ValidationReport>,
    /// Accepted canonical records
    pub records: Vec<CanonicalRecord>,
    pub views: Option<DomainViews>,
}

/// Result of a change check without running the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub fingerprint: DatasetFingerprint,
    pub decision: RunDecision,
}

pub struct IngestService {
    settings: IngestSettings,
    raw_source: Arc<dyn RawSource>,
    alias_source: Arc<dyn AliasSource>,
    sink: Arc<dyn OutputSink>,
    detector: ChangeDetector,
}

impl IngestService {
    pub fn new(
        settings: IngestSettings,
        raw_source: Arc<dyn RawSource>,
        alias_source: Arc<dyn AliasSource>,
        sink: Arc<dyn OutputSink>,
        state_store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            settings,
            raw_source,
            alias_source,
            sink,
            detector: ChangeDetector::new(state_store),
        }
    }

    /// File-backed adapters for every boundary
    pub fn from_settings(settings: IngestSettings) -> Self {
        let grid = Arc::new(GridFileSource::new());
        let state = Arc::new(JsonStateStore::new(settings.state_path.clone()));
        Self::new(
            settings,
            grid.clone(),
            grid,
            Arc::new(JsonFileSink::new()),
            state,
        )
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Fingerprint the raw dataset and report the decision; nothing else runs
    pub async fn check(&self, force: bool) -> Result<CheckResult> {
        let dataset = self.raw_source.read_rows(&self.settings.source).await?;
        let (fingerprint, decision) = self.detector.evaluate(&dataset, force).await?;
        Ok(CheckResult {
            fingerprint,
            decision,
        })
    }

    /// Full pipeline in preview mode regardless of change state
    pub async fn validate(&self) -> Result<RunResult> {
        self.run(RunOptions {
            dry_run: true,
            force: true,
        })
        .await
    }

    pub async fn run(&self, options: RunOptions) -> Result<RunResult> {
        let session = PipelineSession::new();
        let run_id = session.run_id;
        info!(
            run_id = %run_id,
            dry_run = options.dry_run,
            force = options.force,
            source = %self.settings.source,
            "Starting normalization run"
        );

        let dataset = self.raw_source.read_rows(&self.settings.source).await?;
        let (fingerprint, decision) = self.detector.evaluate(&dataset, options.force).await?;

        if !decision.should_run() {
            return Ok(RunResult {
                summary: RunSummary {
                    run_id,
                    decision,
                    stage: None,
                    dry_run: options.dry_run,
                    fingerprint: fingerprint.hash,
                    total_rows: 0,
                    success_rows: 0,
                    warning_rows: 0,
                    error_rows: 0,
                    issue_count: 0,
                    issues: Vec::new(),
                    dataset_size: 0,
                    views_written: 0,
                },
                report: None,
                records: Vec::new(),
                views: None,
            });
        }

        let aliases = self.alias_source.read_aliases(&self.settings.aliases).await?;
        let resolver = AliasResolver::with_placeholders(
            aliases,
            self.settings.pipeline.cleaning.placeholders.clone(),
        );
        info!(
            aliases = resolver.alias_count(),
            persons = resolver.person_count(),
            "Alias table ready"
        );

        let pipeline = Pipeline::new(self.settings.pipeline.clone(), resolver);
        let PipelineOutput {
            mut session,
            outcomes,
            report,
        } = pipeline.process(&dataset, session)?;

        let records: Vec<CanonicalRecord> = outcomes.into_iter().filter_map(|o| o.ok()).collect();
        let views = transform(&records);

        let views_written = if options.dry_run {
            session.transition_to(PipelineStage::Previewed)?;
            0
        } else {
            let written = self.write_back(&records, &views).await?;
            session.transition_to(PipelineStage::Written)?;
            self.detector.record_success(&fingerprint).await?;
            written
        };

        if report.error_rows > 0 {
            warn!(
                run_id = %run_id,
                error_rows = report.error_rows,
                "Rows with errors were excluded from output"
            );
        }

        let summary = RunSummary {
            run_id,
            decision,
            stage: Some(session.stage),
            dry_run: options.dry_run,
            fingerprint: fingerprint.hash,
            total_rows: report.total_rows,
            success_rows: report.success_rows,
            warning_rows: report.warning_rows,
            error_rows: report.error_rows,
            issue_count: report.issues.len(),
            issues: report.summary(self.settings.max_issues).issues,
            dataset_size: records.len(),
            views_written,
        };

        info!(
            run_id = %run_id,
            stage = ?session.stage,
            dataset_size = summary.dataset_size,
            views_written = views_written,
            "Normalization run complete"
        );

        Ok(RunResult {
            summary,
            report: Some(report),
            records,
            views: Some(views),
        })
    }

    /// Overwrite the canonical target and every view partition
    ///
    /// Year partitions left over from earlier runs (a year no longer present
    /// in the source) are removed afterwards.
    async fn write_back(&self, records: &[CanonicalRecord], views: &DomainViews) -> Result<usize> {
        self.sink
            .write_canonical(&self.settings.canonical_target, records)
            .await?;

        let documents = views.documents(&rota_common::time::now())?;
        for doc in &documents {
            self.sink
                .write_view(&self.settings.views_target, &doc.view, &doc.partition, doc)
                .await?;
        }

        for view in [PREACHING_VIEW, ROSTER_VIEW] {
            let keep: Vec<String> = documents
                .iter()
                .filter(|d| d.view == view)
                .map(|d| d.partition.clone())
                .collect();
            self.sink
                .prune_views(&self.settings.views_target, view, &keep)
                .await?;
        }
        Ok(documents.len())
    }
}
