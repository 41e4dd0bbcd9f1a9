//! Validation issues and the per-run report
//!
//! Issues are produced during cleaning, resolution and validation, aggregated
//! into one [`ValidationReport`] per run, then discarded after logging.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Row must be excluded from write-back
    Error,
    /// Informational; row is still written
    Warning,
}

/// Row number used for dataset-level issues (e.g. a missing column)
pub const DATASET_ROW: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 1-based source row, or [`DATASET_ROW`]
    pub row_number: usize,
    pub field_name: String,
    pub severity: Severity,
    pub message: String,
    pub offending_value: String,
}

impl ValidationIssue {
    pub fn error(
        row_number: usize,
        field_name: impl Into<String>,
        message: impl Into<String>,
        offending_value: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            field_name: field_name.into(),
            severity: Severity::Error,
            message: message.into(),
            offending_value: offending_value.into(),
        }
    }

    pub fn warning(
        row_number: usize,
        field_name: impl Into<String>,
        message: impl Into<String>,
        offending_value: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            field_name: field_name.into(),
            severity: Severity::Warning,
            message: message.into(),
            offending_value: offending_value.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Aggregated outcome of one run
///
/// - `error_rows`: rows with at least one error
/// - `warning_rows`: rows with warnings but no errors
/// - `success_rows`: rows with zero errors (warnings allowed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub success_rows: usize,
    pub warning_rows: usize,
    pub error_rows: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Build the report for `total_rows` rows from the full issue list
    pub fn from_issues(total_rows: usize, mut issues: Vec<ValidationIssue>) -> Self {
        // Stable: dataset-level issues first, then by row, preserving discovery order within a row
        issues.sort_by_key(|i| i.row_number);

        let mut per_row: BTreeMap<usize, (bool, bool)> = BTreeMap::new();
        for issue in issues.iter().filter(|i| i.row_number != DATASET_ROW) {
            let entry = per_row.entry(issue.row_number).or_insert((false, false));
            match issue.severity {
                Severity::Error => entry.0 = true,
                Severity::Warning => entry.1 = true,
            }
        }

        let error_rows = per_row.values().filter(|(err, _)| *err).count();
        let warning_rows = per_row.values().filter(|(err, warn)| !*err && *warn).count();

        Self {
            total_rows,
            success_rows: total_rows.saturating_sub(error_rows),
            warning_rows,
            error_rows,
            issues,
        }
    }

    /// Rows that carry at least one error
    pub fn rows_with_errors(&self) -> BTreeSet<usize> {
        self.issues
            .iter()
            .filter(|i| i.is_error() && i.row_number != DATASET_ROW)
            .map(|i| i.row_number)
            .collect()
    }

    pub fn issues_for_row(&self, row_number: usize) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.row_number == row_number)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    /// Copy of the report with the issue list truncated to `limit`
    pub fn summary(&self, limit: usize) -> ValidationReport {
        ValidationReport {
            issues: self.issues.iter().take(limit).cloned().collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_rows_not_issues() {
        let issues = vec![
            ValidationIssue::error(2, "service_date", "required field missing", ""),
            ValidationIssue::error(2, "service_date", "invalid date format", "x"),
            ValidationIssue::warning(3, "preacher", "unresolved alias", "Bob"),
            ValidationIssue::warning(2, "preacher", "unresolved alias", "Ann"),
        ];
        let report = ValidationReport::from_issues(4, issues);

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.error_rows, 1);
        assert_eq!(report.warning_rows, 1);
        assert_eq!(report.success_rows, 3);
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 2);
    }

    #[test]
    fn test_dataset_level_issues_do_not_count_as_rows() {
        let issues = vec![ValidationIssue::warning(DATASET_ROW, "notes", "column missing", "备注")];
        let report = ValidationReport::from_issues(2, issues);
        assert_eq!(report.warning_rows, 0);
        assert_eq!(report.success_rows, 2);
        assert_eq!(report.issues[0].row_number, DATASET_ROW);
    }

    #[test]
    fn test_summary_truncates_issue_list_only() {
        let issues = (1..=5)
            .map(|r| ValidationIssue::warning(r, "songs", "w", ""))
            .collect();
        let report = ValidationReport::from_issues(5, issues);
        let summary = report.summary(2);
        assert_eq!(summary.issues.len(), 2);
        assert_eq!(summary.warning_rows, 5);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
