//! Raw tabular rows as supplied by the source reader
//!
//! Rows are ephemeral: they exist for one pipeline run only.

use serde::{Deserialize, Serialize};

/// One source row: ordered column header → cell text, plus its 1-based position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based position among the data rows of the source range
    pub position: usize,

    /// Cells in source column order
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(position: usize, cells: Vec<(String, String)>) -> Self {
        Self { position, cells }
    }

    /// Build a row from parallel header/value slices (missing values become empty)
    pub fn from_parallel(position: usize, headers: &[String], values: &[String]) -> Self {
        let cells = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { position, cells }
    }

    /// Cell text for a column header (exact match)
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    /// True when every cell is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

/// Full extracted dataset: header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDataset {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawDataset {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    /// Build from a header row and value rows; positions are assigned 1..=n
    pub fn from_grid(headers: Vec<String>, values: Vec<Vec<String>>) -> Self {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| RawRow::from_parallel(i + 1, &headers, v))
            .collect();
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        vec!["date".to_string(), "preacher".to_string()]
    }

    #[test]
    fn test_short_rows_are_padded() {
        let row = RawRow::from_parallel(3, &headers(), &["2025/10/05".to_string()]);
        assert_eq!(row.position, 3);
        assert_eq!(row.get("date"), Some("2025/10/05"));
        assert_eq!(row.get("preacher"), Some(""));
        assert_eq!(row.get("songs"), None);
    }

    #[test]
    fn test_from_grid_assigns_positions() {
        let dataset = RawDataset::from_grid(
            headers(),
            vec![
                vec!["2025/10/05".to_string(), "A".to_string()],
                vec!["2025/10/12".to_string(), "B".to_string()],
            ],
        );
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.rows[1].position, 2);
        assert_eq!(dataset.rows[1].get("preacher"), Some("B"));
    }

    #[test]
    fn test_blank_row_detection() {
        let row = RawRow::from_parallel(1, &headers(), &[" ".to_string(), String::new()]);
        assert!(row.is_blank());
    }
}
