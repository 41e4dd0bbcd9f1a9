//! Per-stage row transforms
//!
//! Each stage is a pure function over one row. Row problems are collected as
//! issues on the row itself and never abort the batch.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::column_map::{ColumnMap, SourceField};
use crate::models::{CanonicalRecord, RawDataset, RawRow, Role, ValidationIssue, DATASET_ROW};
use crate::services::alias_resolver::AliasResolver;
use crate::services::field_cleaner::{
    self, clean_date, clean_text, format_scripture, merge_columns, split_songs, CleaningConfig,
    CANONICAL_DATE_FORMAT,
};

pub const MSG_COLUMN_MISSING: &str = "column not found in source";
pub const MSG_UNPARSEABLE_DATE: &str = "unparseable date";
pub const MSG_UNRESOLVED_ALIAS: &str = "unresolved alias";

/// Field name used for worship team issues
pub const WORSHIP_TEAM_FIELD: &str = "worship_team";

/// Source column feeding each single-occupant role
pub fn role_source(role: Role) -> SourceField {
    match role {
        Role::Preacher => SourceField::Preacher,
        Role::WorshipLead => SourceField::WorshipLead,
        Role::Pianist => SourceField::Pianist,
        Role::Audio => SourceField::Audio,
        Role::Video => SourceField::Video,
        Role::ProPresenterPlay => SourceField::ProPresenterPlay,
        Role::ProPresenterUpdate => SourceField::ProPresenterUpdate,
        Role::VideoEditor => SourceField::VideoEditor,
    }
}

// ============================================================================
// MAP
// ============================================================================

/// Raw row with cells keyed by canonical source field
#[derive(Debug, Clone)]
pub struct MappedRow {
    pub position: usize,
    values: BTreeMap<SourceField, String>,
}

impl MappedRow {
    /// Cell text; unmapped fields read as empty
    pub fn value(&self, field: SourceField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Header resolution result for a dataset
#[derive(Debug, Clone)]
pub struct HeaderBinding {
    /// Canonical field → actual header text in the source
    bound: BTreeMap<SourceField, String>,
    /// Dataset-level warnings for configured headers absent from the source
    pub issues: Vec<ValidationIssue>,
}

impl HeaderBinding {
    pub fn is_bound(&self, field: SourceField) -> bool {
        self.bound.contains_key(&field)
    }
}

/// Match configured headers against the source header row
///
/// Comparison is whitespace-normalized so stray padding in the sheet header
/// does not break the mapping.
pub fn bind_headers(column_map: &ColumnMap, headers: &[String]) -> HeaderBinding {
    let normalized: Vec<(String, &String)> = headers
        .iter()
        .map(|h| (field_cleaner::normalize_whitespace(h), h))
        .collect();

    let mut bound = BTreeMap::new();
    let mut issues = Vec::new();
    for (field, configured) in column_map.fields() {
        let wanted = field_cleaner::normalize_whitespace(configured);
        match normalized.iter().find(|(n, _)| *n == wanted) {
            Some((_, actual)) => {
                bound.insert(field, (*actual).clone());
            }
            None => issues.push(ValidationIssue::warning(
                DATASET_ROW,
                field.as_str(),
                MSG_COLUMN_MISSING,
                configured,
            )),
        }
    }

    HeaderBinding { bound, issues }
}

pub fn map_row(binding: &HeaderBinding, row: &RawRow) -> MappedRow {
    let values = binding
        .bound
        .iter()
        .map(|(field, header)| (*field, row.get(header).unwrap_or("").to_string()))
        .collect();
    MappedRow {
        position: row.position,
        values,
    }
}

/// Non-blank rows of the dataset, mapped
pub fn map_dataset(binding: &HeaderBinding, dataset: &RawDataset) -> Vec<MappedRow> {
    dataset
        .rows
        .iter()
        .filter(|row| !row.is_blank())
        .map(|row| map_row(binding, row))
        .collect()
}

// ============================================================================
// CLEAN
// ============================================================================

/// Row after the cleaning rules; names are still free text
#[derive(Debug, Clone, Default)]
pub struct CleanedRow {
    pub position: usize,
    pub service_date: String,
    pub service_slot: String,
    pub sermon_title: String,
    pub series: String,
    pub scripture: String,
    pub catechism: String,
    pub reading: String,
    pub notes: String,
    pub songs: Vec<String>,
    pub role_names: BTreeMap<Role, String>,
    pub worship_team_names: Vec<String>,
    pub issues: Vec<ValidationIssue>,
}

pub fn clean_row(row: &MappedRow, config: &CleaningConfig) -> CleanedRow {
    let text = |field: SourceField| clean_text(row.value(field), &config.placeholders);
    let mut issues = Vec::new();

    let service_date = match clean_date(
        row.value(SourceField::ServiceDate),
        &config.date_formats,
        &config.placeholders,
    ) {
        Ok(date) => date,
        Err(e) => {
            debug!(row = row.position, value = %e.input, "Date did not match any configured format");
            issues.push(ValidationIssue::error(
                row.position,
                SourceField::ServiceDate.as_str(),
                MSG_UNPARSEABLE_DATE,
                e.input,
            ));
            String::new()
        }
    };

    let role_names = Role::ALL
        .iter()
        .map(|role| (*role, text(role_source(*role))))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let worship_team_names = merge_columns(
        [
            row.value(SourceField::WorshipTeam1),
            row.value(SourceField::WorshipTeam2),
        ],
        &config.name_delimiters,
        &config.placeholders,
    );

    CleanedRow {
        position: row.position,
        service_date,
        service_slot: text(SourceField::ServiceSlot),
        sermon_title: text(SourceField::SermonTitle),
        series: text(SourceField::Series),
        scripture: format_scripture(row.value(SourceField::Scripture), &config.placeholders),
        catechism: text(SourceField::Catechism),
        reading: format_scripture(row.value(SourceField::Reading), &config.placeholders),
        notes: text(SourceField::Notes),
        songs: split_songs(row.value(SourceField::Songs), config),
        role_names,
        worship_team_names,
        issues,
    }
}

// ============================================================================
// RESOLVE + ASSEMBLE
// ============================================================================

/// Resolve every name-bearing field and build the canonical record
///
/// Fallback identities add a warning per name; the record is still built.
pub fn resolve_row(row: CleanedRow, resolver: &AliasResolver) -> (CanonicalRecord, Vec<ValidationIssue>) {
    let mut issues = row.issues;
    let mut record = CanonicalRecord::new(row.position);

    for (role, name) in &row.role_names {
        let resolution = resolver.resolve(name);
        if let Some(res) = &resolution {
            if res.is_fallback() {
                issues.push(ValidationIssue::warning(
                    row.position,
                    role.field_prefix(),
                    MSG_UNRESOLVED_ALIAS,
                    res.cleaned_input.clone(),
                ));
            }
        }
        record.set_role(*role, resolution.map(|r| r.person));
    }

    let team = resolver.resolve_list(&row.worship_team_names);
    for res in team.iter().filter(|r| r.is_fallback()) {
        issues.push(ValidationIssue::warning(
            row.position,
            WORSHIP_TEAM_FIELD,
            MSG_UNRESOLVED_ALIAS,
            res.cleaned_input.clone(),
        ));
    }
    record.worship_team = team.into_iter().map(|r| r.person).collect();

    record.service_week = iso_week(&row.service_date);
    record.service_date = row.service_date;
    record.service_slot = row.service_slot;
    record.sermon_title = row.sermon_title;
    record.series = row.series;
    record.scripture = row.scripture;
    record.catechism = row.catechism;
    record.reading = row.reading;
    record.songs = row.songs;
    record.notes = row.notes;

    (record, issues)
}

/// ISO week number of a canonical date; `None` for empty or invalid input
pub fn iso_week(service_date: &str) -> Option<u32> {
    NaiveDate::parse_from_str(service_date, CANONICAL_DATE_FORMAT)
        .ok()
        .map(|d| d.iso_week().week())
}
