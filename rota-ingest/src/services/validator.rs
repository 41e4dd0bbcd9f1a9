//! Record Validator
//!
//! Independent, non-short-circuiting checks over cleaned canonical records:
//! - Required-field presence → error
//! - Date format conformance (`YYYY-MM-DD` exactly) → error
//! - Duplicate `(service_date, service_slot)` → warning on every occurrence
//!   after the first
//!
//! Every check runs for every record even when an earlier check failed.

use std::collections::HashSet;
use tracing::debug;

use rota_common::{Error, Result};

use crate::models::{CanonicalRecord, ValidationIssue, ValidationReport, FIELD_ORDER};
use crate::services::field_cleaner::is_canonical_date;

/// Fields that must be non-empty on every record
pub const REQUIRED_FIELDS: &[&str] = &["service_date"];

pub const MSG_REQUIRED_MISSING: &str = "required field missing";
pub const MSG_INVALID_DATE: &str = "invalid date format (expected YYYY-MM-DD)";
pub const MSG_DUPLICATE: &str = "duplicate service_date/service_slot";

pub struct Validator {
    required_fields: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            required_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Custom required fields; each must be a canonical field name
    pub fn with_required_fields(required_fields: Vec<String>) -> Result<Self> {
        if let Some(unknown) = required_fields
            .iter()
            .find(|f| !FIELD_ORDER.contains(&f.as_str()))
        {
            return Err(Error::Config(format!(
                "unknown required field '{}'",
                unknown
            )));
        }
        Ok(Self { required_fields })
    }

    /// Validate records and build a report over them alone
    pub fn validate(&self, records: &[CanonicalRecord]) -> ValidationReport {
        ValidationReport::from_issues(records.len(), self.check(records))
    }

    /// Run all checks, returning the raw issue list
    pub fn check(&self, records: &[CanonicalRecord]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut seen_keys: HashSet<(&str, &str)> = HashSet::new();

        for record in records {
            self.check_required(record, &mut issues);
            check_date_format(record, &mut issues);
            check_duplicate(record, &mut seen_keys, &mut issues);
        }

        debug!(
            records = records.len(),
            issues = issues.len(),
            "Validation checks complete"
        );
        issues
    }

    fn check_required(&self, record: &CanonicalRecord, issues: &mut Vec<ValidationIssue>) {
        for field in &self.required_fields {
            let value = record.field_text(field).unwrap_or_default();
            if value.trim().is_empty() {
                issues.push(ValidationIssue::error(
                    record.source_row,
                    field.as_str(),
                    MSG_REQUIRED_MISSING,
                    "",
                ));
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Empty dates are left to the required-field check
fn check_date_format(record: &CanonicalRecord, issues: &mut Vec<ValidationIssue>) {
    if !record.service_date.is_empty() && !is_canonical_date(&record.service_date) {
        issues.push(ValidationIssue::error(
            record.source_row,
            "service_date",
            MSG_INVALID_DATE,
            record.service_date.clone(),
        ));
    }
}

/// Records without a date cannot collide; they already fail the required check
fn check_duplicate<'a>(
    record: &'a CanonicalRecord,
    seen_keys: &mut HashSet<(&'a str, &'a str)>,
    issues: &mut Vec<ValidationIssue>,
) {
    if record.service_date.is_empty() {
        return;
    }
    if !seen_keys.insert(record.key()) {
        let offending = if record.service_slot.is_empty() {
            record.service_date.clone()
        } else {
            format!("{} / {}", record.service_date, record.service_slot)
        };
        issues.push(ValidationIssue::warning(
            record.source_row,
            "service_date",
            MSG_DUPLICATE,
            offending,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn record(row: usize, date: &str, slot: &str) -> CanonicalRecord {
        let mut r = CanonicalRecord::new(row);
        r.service_date = date.to_string();
        r.service_slot = slot.to_string();
        r
    }

    #[test]
    fn test_clean_records_produce_no_issues() {
        let records = vec![record(1, "2025-10-05", ""), record(2, "2025-10-12", "")];
        let report = Validator::new().validate(&records);
        assert!(report.issues.is_empty());
        assert_eq!(report.success_rows, 2);
    }

    #[test]
    fn test_missing_date_is_exactly_one_error() {
        let records = vec![record(1, "", ""), record(2, "2025-10-12", "")];
        let report = Validator::new().validate(&records);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].row_number, 1);
        assert_eq!(report.issues[0].message, MSG_REQUIRED_MISSING);
        assert_eq!(report.success_rows, 1);
        assert_eq!(report.error_rows, 1);
    }

    #[test]
    fn test_non_canonical_date_is_error() {
        let records = vec![record(1, "2025/10/05", "")];
        let issues = Validator::new().check(&records);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].offending_value, "2025/10/05");
    }

    #[test]
    fn test_duplicates_flag_only_later_occurrences() {
        let records = vec![
            record(1, "2025-10-05", ""),
            record(2, "2025-10-05", ""),
            record(3, "2025-10-05", ""),
            record(4, "2025-10-05", "2"),
        ];
        let issues = Validator::new().check(&records);
        let flagged: Vec<usize> = issues.iter().map(|i| i.row_number).collect();
        assert_eq!(flagged, vec![2, 3]);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn test_checks_do_not_short_circuit() {
        let mut records = vec![record(1, "2025-10-05", ""), record(2, "2025-13-01", "")];
        records.push(record(3, "2025-13-01", ""));
        let issues = Validator::new().check(&records);
        // Row 3: invalid format AND duplicate of row 2
        let row3: Vec<&ValidationIssue> = issues.iter().filter(|i| i.row_number == 3).collect();
        assert_eq!(row3.len(), 2);
    }

    #[test]
    fn test_custom_required_fields() {
        let validator = Validator::with_required_fields(vec![
            "service_date".to_string(),
            "preacher_id".to_string(),
        ])
        .unwrap();
        let issues = validator.check(&[record(1, "2025-10-05", "")]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field_name, "preacher_id");
    }

    #[test]
    fn test_unknown_required_field_is_rejected() {
        let result = Validator::with_required_fields(vec![
            "service_date".to_string(),
            "preacher".to_string(),
        ]);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("preacher")));
    }
}
