//! Ingest service runs against file-backed and in-memory adapters
//!
//! Covers write-back layout, skip/dry-run state policy and fatal errors.

use std::path::Path;
use std::sync::Arc;

use rota_ingest::column_map::SourceField;
use rota_ingest::models::{PersonAlias, PipelineStage, RawDataset, PIPELINE_STATE_KEY};
use rota_ingest::services::{RunDecision, RunReason};
use rota_ingest::sources::{MemorySink, MemorySource, MemoryStateStore, StateStore};
use rota_ingest::{Error, IngestService, IngestSettings, RunOptions, TomlConfig};
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

fn headers() -> Vec<String> {
    SourceField::ALL
        .iter()
        .map(|f| f.default_header().to_string())
        .collect()
}

/// Row with date, preacher and audio; remaining cells empty
fn raw_row(date: &str, preacher: &str, audio: &str) -> Vec<String> {
    SourceField::ALL
        .iter()
        .map(|f| match f {
            SourceField::ServiceDate => date.to_string(),
            SourceField::Preacher => preacher.to_string(),
            SourceField::Audio => audio.to_string(),
            _ => String::new(),
        })
        .collect()
}

fn raw_rows() -> Vec<Vec<String>> {
    vec![
        raw_row("2024/01/07", "张牧师", "陈明"),
        raw_row("2025/01/05", "Pastor Zhang", "林芳"),
        raw_row("", "张牧师", ""),
    ]
}

fn alias_table() -> Vec<PersonAlias> {
    vec![
        PersonAlias::new("张牧师", "preacher_zhang", "张牧师"),
        PersonAlias::new("Pastor Zhang", "preacher_zhang", "张牧师"),
        PersonAlias::new("陈明", "person_chenming", "陈明"),
        PersonAlias::new("林芳", "person_linfang", "林芳"),
    ]
}

fn write_json(path: &Path, value: &serde_json::Value) {
    std::fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
}

/// Root folder with raw + alias grids at the default locations
fn file_fixture() -> (TempDir, IngestSettings) {
    let dir = TempDir::new().unwrap();

    let mut grid = vec![headers()];
    grid.extend(raw_rows());
    write_json(&dir.path().join("raw_schedule.json"), &json!({ "values": grid }));

    let mut aliases = vec![vec![
        "alias".to_string(),
        "person_id".to_string(),
        "display_name".to_string(),
    ]];
    aliases.extend(
        alias_table()
            .into_iter()
            .map(|a| vec![a.alias_text, a.person_id, a.display_name]),
    );
    write_json(&dir.path().join("aliases.json"), &json!({ "values": aliases }));

    let settings = IngestSettings::from_toml(&TomlConfig::default(), dir.path()).unwrap();
    (dir, settings)
}

fn memory_service(
    source: Arc<MemorySource>,
    sink: Arc<MemorySink>,
    state: Arc<MemoryStateStore>,
) -> IngestService {
    let settings = IngestSettings::from_toml(&TomlConfig::default(), Path::new("/rota")).unwrap();
    IngestService::new(settings, source.clone(), source, sink, state)
}

fn memory_source() -> Arc<MemorySource> {
    Arc::new(MemorySource::new(
        RawDataset::from_grid(headers(), raw_rows()),
        alias_table(),
    ))
}

// ============================================================================
// File-backed runs
// ============================================================================

#[tokio::test]
async fn test_full_run_writes_canonical_views_and_state() {
    let (dir, settings) = file_fixture();
    let service = IngestService::from_settings(settings);

    let result = service.run(RunOptions::default()).await.unwrap();
    let summary = &result.summary;

    assert_eq!(summary.decision, RunDecision::Run(RunReason::FirstRun));
    assert_eq!(summary.stage, Some(PipelineStage::Written));
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.success_rows, 2);
    assert_eq!(summary.error_rows, 1);
    assert_eq!(summary.dataset_size, 2);
    // latest + 2024 + 2025, for both views
    assert_eq!(summary.views_written, 6);

    // Canonical grid: header + success rows only
    let canonical: serde_json::Value = serde_json::from_slice(
        &std::fs::read(dir.path().join("canonical.json")).unwrap(),
    )
    .unwrap();
    let values = canonical["values"].as_array().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[1][0], "2024-01-07");
    assert_eq!(values[2][9], "张牧师");

    // Views
    let views = dir.path().join("views");
    for view in ["preaching", "roster"] {
        for partition in ["latest", "2024", "2025"] {
            assert!(views.join(view).join(format!("{}.json", partition)).exists());
        }
    }
    let roster_2025: serde_json::Value = serde_json::from_slice(
        &std::fs::read(views.join("roster").join("2025.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(roster_2025["record_count"], 1);
    assert_eq!(
        roster_2025["records"][0]["technical"]["audio"]["id"],
        "person_linfang"
    );

    // State
    assert!(dir.path().join("pipeline_state.json").exists());
}

#[tokio::test]
async fn test_second_run_skips_with_empty_report() {
    let (_dir, settings) = file_fixture();
    let service = IngestService::from_settings(settings);

    service.run(RunOptions::default()).await.unwrap();
    let second = service.run(RunOptions::default()).await.unwrap();

    assert_eq!(second.summary.decision, RunDecision::Skip(RunReason::NoChange));
    assert_eq!(second.summary.stage, None);
    assert!(second.summary.issues.is_empty());
    assert_eq!(second.summary.error_rows, 0);
    assert!(second.report.is_none());
}

#[tokio::test]
async fn test_validate_runs_even_when_unchanged() {
    let (_dir, settings) = file_fixture();
    let service = IngestService::from_settings(settings);
    service.run(RunOptions::default()).await.unwrap();

    let result = service.validate().await.unwrap();
    assert_eq!(result.summary.stage, Some(PipelineStage::Previewed));
    assert_eq!(result.report.unwrap().error_rows, 1);
}

#[tokio::test]
async fn test_year_dropped_from_source_removes_its_partitions() {
    let (dir, settings) = file_fixture();
    let service = IngestService::from_settings(settings);
    service.run(RunOptions::default()).await.unwrap();

    let views = dir.path().join("views");
    assert!(views.join("preaching").join("2024.json").exists());

    // Given: every 2024 row removed from the source
    let mut grid = vec![headers()];
    grid.extend(raw_rows().into_iter().skip(1));
    write_json(&dir.path().join("raw_schedule.json"), &json!({ "values": grid }));

    // When
    let rerun = service.run(RunOptions::default()).await.unwrap();

    // Then: only latest + 2025 remain for both views
    assert_eq!(rerun.summary.decision, RunDecision::Run(RunReason::RowsRemoved));
    assert_eq!(rerun.summary.views_written, 4);
    for view in ["preaching", "roster"] {
        assert!(!views.join(view).join("2024.json").exists());
        assert!(views.join(view).join("2025.json").exists());
        assert!(views.join(view).join("latest.json").exists());
    }
}

#[tokio::test]
async fn test_missing_raw_file_is_fatal() {
    let (dir, settings) = file_fixture();
    std::fs::remove_file(dir.path().join("raw_schedule.json")).unwrap();

    let err = IngestService::from_settings(settings)
        .run(RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Source(_)));
    assert!(!dir.path().join("canonical.json").exists());
}

#[tokio::test]
async fn test_missing_alias_file_is_fatal_and_writes_nothing() {
    let (dir, settings) = file_fixture();
    std::fs::remove_file(dir.path().join("aliases.json")).unwrap();

    let err = IngestService::from_settings(settings)
        .run(RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AliasSource(_)));
    assert!(!dir.path().join("canonical.json").exists());
    assert!(!dir.path().join("pipeline_state.json").exists());
}

// ============================================================================
// In-memory runs
// ============================================================================

#[tokio::test]
async fn test_dry_run_writes_nothing_and_keeps_state() {
    let sink = Arc::new(MemorySink::new());
    let state = Arc::new(MemoryStateStore::new());
    let service = memory_service(memory_source(), sink.clone(), state.clone());

    let result = service
        .run(RunOptions {
            dry_run: true,
            force: false,
        })
        .await
        .unwrap();

    assert_eq!(result.summary.stage, Some(PipelineStage::Previewed));
    assert_eq!(result.summary.views_written, 0);
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.views.unwrap().preaching.latest.len(), 2);
    assert!(sink.is_empty().await);
    assert!(state.get(PIPELINE_STATE_KEY).await.unwrap().is_none());

    // A later real run still sees a first run
    let real = service.run(RunOptions::default()).await.unwrap();
    assert_eq!(real.summary.decision, RunDecision::Run(RunReason::FirstRun));
}

#[tokio::test]
async fn test_edit_after_write_triggers_rerun() {
    let source = memory_source();
    let sink = Arc::new(MemorySink::new());
    let service = memory_service(source.clone(), sink.clone(), Arc::new(MemoryStateStore::new()));

    service.run(RunOptions::default()).await.unwrap();

    let mut rows = raw_rows();
    rows[2] = raw_row("2025/01/12", "张牧师", "");
    source.set_dataset(RawDataset::from_grid(headers(), rows)).await;

    let rerun = service.run(RunOptions::default()).await.unwrap();
    assert_eq!(rerun.summary.decision, RunDecision::Run(RunReason::RowsModified));
    assert_eq!(rerun.summary.error_rows, 0);

    let written = sink.canonical("/rota/canonical.json").await.unwrap();
    assert_eq!(written.len(), 3);
    let latest = sink.view("/rota/views", "preaching", "latest").await.unwrap();
    assert_eq!(latest.record_count, 3);
}

#[tokio::test]
async fn test_summary_issue_list_is_capped() {
    let rows: Vec<Vec<String>> = (0..30).map(|_| raw_row("", "Unknown Person", "")).collect();
    let source = Arc::new(MemorySource::new(
        RawDataset::from_grid(headers(), rows),
        alias_table(),
    ));
    let service = memory_service(source, Arc::new(MemorySink::new()), Arc::new(MemoryStateStore::new()));

    let result = service.validate().await.unwrap();
    // One required-field error + one unresolved-alias warning per row
    assert_eq!(result.summary.issue_count, 60);
    assert_eq!(result.summary.issues.len(), 20);
    assert_eq!(result.summary.error_rows, 30);
}

#[tokio::test]
async fn test_unreadable_source_is_fatal() {
    let service = memory_service(
        Arc::new(MemorySource::failing()),
        Arc::new(MemorySink::new()),
        Arc::new(MemoryStateStore::new()),
    );
    assert!(matches!(
        service.check(false).await,
        Err(Error::Source(_))
    ));
}
