//! A1-notation cell ranges
//!
//! Accepted forms: `A1:AC` (open-ended rows), `B2:D40`, `A:C` (whole
//! columns), `C5` (single cell), each optionally prefixed with a sheet name
//! (`Roster!A1:AC`). The sheet name is ignored by file-backed sources.

use std::fmt;
use std::str::FromStr;

use rota_common::{Error, Result};

/// Zero-based, inclusive bounds; `None` end means "to the edge of the data"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: Option<usize>,
    pub end_row: Option<usize>,
}

impl CellRange {
    /// Range covering the whole grid
    pub fn all() -> Self {
        Self {
            start_col: 0,
            start_row: 0,
            end_col: None,
            end_row: None,
        }
    }

    /// Cut the range out of a row-major grid
    ///
    /// Rows past the end of the grid are absent; cells past the end of a
    /// short row are absent too (callers pad).
    pub fn apply(&self, grid: &[Vec<String>]) -> Vec<Vec<String>> {
        let row_end = self
            .end_row
            .map(|r| (r + 1).min(grid.len()))
            .unwrap_or(grid.len());
        if self.start_row >= row_end {
            return Vec::new();
        }

        grid[self.start_row..row_end]
            .iter()
            .map(|row| {
                let col_end = self
                    .end_col
                    .map(|c| (c + 1).min(row.len()))
                    .unwrap_or(row.len());
                if self.start_col >= col_end {
                    Vec::new()
                } else {
                    row[self.start_col..col_end].to_vec()
                }
            })
            .collect()
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let cells = match trimmed.rsplit_once('!') {
            Some((_sheet, cells)) => cells,
            None => trimmed,
        };
        if cells.is_empty() {
            return Err(invalid(s, "empty range"));
        }

        let (start, end) = match cells.split_once(':') {
            Some((a, b)) => (parse_ref(a, s)?, Some(parse_ref(b, s)?)),
            None => (parse_ref(cells, s)?, None),
        };

        let range = match end {
            Some(end) => CellRange {
                start_col: start.col.unwrap_or(0),
                start_row: start.row.unwrap_or(0),
                end_col: end.col,
                end_row: end.row,
            },
            // Single reference: one cell, or a whole column/row
            None => CellRange {
                start_col: start.col.unwrap_or(0),
                start_row: start.row.unwrap_or(0),
                end_col: start.col,
                end_row: start.row,
            },
        };

        if matches!(range.end_col, Some(c) if c < range.start_col)
            || matches!(range.end_row, Some(r) if r < range.start_row)
        {
            return Err(invalid(s, "range end precedes start"));
        }
        Ok(range)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:", column_letters(self.start_col), self.start_row + 1)?;
        if let Some(col) = self.end_col {
            write!(f, "{}", column_letters(col))?;
        }
        if let Some(row) = self.end_row {
            write!(f, "{}", row + 1)?;
        }
        Ok(())
    }
}

struct CellRef {
    col: Option<usize>,
    row: Option<usize>,
}

fn parse_ref(part: &str, whole: &str) -> Result<CellRef> {
    let part = part.trim();
    let split = part
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(part.len());
    let (letters, digits) = part.split_at(split);

    if letters.is_empty() && digits.is_empty() {
        return Err(invalid(whole, "empty cell reference"));
    }

    let col = if letters.is_empty() {
        None
    } else {
        Some(column_index(letters))
    };

    let row = if digits.is_empty() {
        None
    } else {
        let n: usize = digits
            .parse()
            .map_err(|_| invalid(whole, "row must be a positive number"))?;
        if n == 0 {
            return Err(invalid(whole, "rows are 1-based"));
        }
        Some(n - 1)
    };

    Ok(CellRef { col, row })
}

/// `A` → 0, `Z` → 25, `AA` → 26, `AC` → 28
fn column_index(letters: &str) -> usize {
    letters
        .chars()
        .fold(0usize, |acc, c| {
            acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1)
        })
        - 1
}

fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

fn invalid(range: &str, reason: &str) -> Error {
    Error::InvalidInput(format!("Invalid cell range '{}': {}", range, reason))
}
