//! Field Cleaning Rules
//!
//! Stateless, total functions applied to raw cell text:
//! - Text clean (whitespace normalization + placeholder removal)
//! - Date clean (priority-ordered input formats → `YYYY-MM-DD`)
//! - Scripture reference spacing
//! - List splitting (songs, multi-name cells) with order-preserving dedup
//! - Column merge for multi-column roles
//!
//! # Date ambiguity
//! `01/02/2025` matches both `%m/%d/%Y` and `%d/%m/%Y`. The first pattern in
//! the configured list that parses wins; no locale heuristic is applied.
//! Operators control the interpretation by ordering `date_formats`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// The single fixed output date format
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Four-digit years only; chrono's `%Y` also accepts one to three digits
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1000..=9999;

/// Cleaning configuration (loaded from `[cleaning]` in TOML)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Tokens meaning "no value" (compared case-insensitively after trimming)
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,

    /// chrono input formats in priority order
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// Delimiters for the song list column
    #[serde(default = "default_song_delimiters")]
    pub song_delimiters: Vec<String>,

    /// Delimiters for cells holding several names
    #[serde(default = "default_name_delimiters")]
    pub name_delimiters: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            placeholders: default_placeholders(),
            date_formats: default_date_formats(),
            song_delimiters: default_song_delimiters(),
            name_delimiters: default_name_delimiters(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn default_placeholders() -> Vec<String> {
    to_strings(&["-", "--", "—", "–", "N/A", "TBD", "无", "待定", "/"])
}

pub fn default_date_formats() -> Vec<String> {
    to_strings(&[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%Y.%m.%d",
        "%Y年%m月%d日",
        "%m/%d/%Y",
        "%d.%m.%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ])
}

pub fn default_song_delimiters() -> Vec<String> {
    to_strings(&[",", "，", "、", "/", ";", "；", "|", "\n"])
}

pub fn default_name_delimiters() -> Vec<String> {
    to_strings(&[",", "，", "、", "/", ";", "；", "&", "\n"])
}

/// Date input that matched none of the configured formats
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized date '{input}' (tried {tried} formats)")]
pub struct DateCleanError {
    pub input: String,
    pub tried: usize,
}

// ============================================================================
// Text
// ============================================================================

/// Whitespace per Unicode plus zero-width characters spreadsheets tend to carry
fn is_space(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

/// Trim (ASCII + full-width) and collapse internal whitespace runs to one space
pub fn normalize_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars() {
        if is_space(c) {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

pub fn is_placeholder(cleaned: &str, placeholders: &[String]) -> bool {
    placeholders
        .iter()
        .any(|p| p.trim().to_lowercase() == cleaned.to_lowercase())
}

/// Normalized text, or empty when the cell holds only a placeholder token
pub fn clean_text(raw: &str, placeholders: &[String]) -> String {
    let cleaned = normalize_whitespace(raw);
    if cleaned.is_empty() || is_placeholder(&cleaned, placeholders) {
        String::new()
    } else {
        cleaned
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Normalize a date cell to `YYYY-MM-DD`
///
/// Empty (or placeholder) input yields `Ok("")`. Input that no format parses
/// yields `Err`; callers record it as a row error and carry an empty value.
/// A parse whose year is not four digits (`10/5/25` read as year 10) does
/// not count as a match.
pub fn clean_date(
    raw: &str,
    formats: &[String],
    placeholders: &[String],
) -> Result<String, DateCleanError> {
    let cleaned = clean_text(raw, placeholders);
    if cleaned.is_empty() {
        return Ok(String::new());
    }

    formats
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(&cleaned, fmt)
                .ok()
                .filter(|date| YEAR_RANGE.contains(&date.year()))
        })
        .map(|date| date.format(CANONICAL_DATE_FORMAT).to_string())
        .ok_or(DateCleanError {
            input: cleaned,
            tried: formats.len(),
        })
}

/// True when `value` is exactly in the canonical output format
pub fn is_canonical_date(value: &str) -> bool {
    value.len() == 10
        && NaiveDate::parse_from_str(value, CANONICAL_DATE_FORMAT)
            .map(|d| {
                YEAR_RANGE.contains(&d.year())
                    && d.format(CANONICAL_DATE_FORMAT).to_string() == value
            })
            .unwrap_or(false)
}

// ============================================================================
// Scripture
// ============================================================================

/// Insert a space between a leading book-name token and its chapter numeral
///
/// `约翰福音3:16` → `约翰福音 3:16`, `John3:16; Rom5:8` → `John 3:16; Rom 5:8`.
/// Only the first letter→digit boundary of each `;`-separated reference is
/// considered, and only when the numeral is not followed by more text, so
/// `诗篇第23篇` is left alone. A numeric book prefix (`1John3:16`) stays
/// attached to its book name. Idempotent.
pub fn format_scripture(raw: &str, placeholders: &[String]) -> String {
    let cleaned = clean_text(raw, placeholders);
    let chars: Vec<char> = cleaned.chars().collect();
    let mut out = String::with_capacity(cleaned.len() + 4);

    // Reset at each reference; set once the book token has been passed
    let mut in_book = false;
    let mut boundary_seen = false;

    for (i, &c) in chars.iter().enumerate() {
        if c == ';' || c == '；' {
            in_book = false;
            boundary_seen = false;
        } else if c.is_ascii_digit() {
            if in_book && !boundary_seen {
                boundary_seen = true;
                let prev_is_letter = i > 0 && chars[i - 1].is_alphabetic();
                if prev_is_letter && !numeral_followed_by_text(&chars[i..]) {
                    out.push(' ');
                }
            }
        } else if c.is_alphabetic() {
            in_book = true;
        }
        out.push(c);
    }
    out
}

/// True when the digit run at the start of `rest` runs straight into letters
fn numeral_followed_by_text(rest: &[char]) -> bool {
    rest.iter()
        .find(|c| !c.is_ascii_digit())
        .is_some_and(|c| c.is_alphabetic())
}

// ============================================================================
// Lists
// ============================================================================

/// Split on any delimiter, clean each token, drop empties, dedup in order
///
/// A cell that is a placeholder as a whole (`N/A`) yields nothing, even when
/// the placeholder itself contains a delimiter.
pub fn split_list(raw: &str, delimiters: &[String], placeholders: &[String]) -> Vec<String> {
    const SENTINEL: char = '\u{1F}';

    if clean_text(raw, placeholders).is_empty() {
        return Vec::new();
    }

    let mut joined = raw.to_string();
    for delimiter in delimiters.iter().filter(|d| !d.is_empty()) {
        joined = joined.replace(delimiter.as_str(), &SENTINEL.to_string());
    }

    dedup_preserving_order(
        joined
            .split(SENTINEL)
            .map(|token| clean_text(token, placeholders))
            .filter(|token| !token.is_empty()),
    )
}

/// Song-list split
pub fn split_songs(raw: &str, config: &CleaningConfig) -> Vec<String> {
    split_list(raw, &config.song_delimiters, &config.placeholders)
}

/// Merge several source cells into one ordered, deduplicated, non-empty list
///
/// Each cell is split on `delimiters` first, so one cell may contribute
/// several entries.
pub fn merge_columns<'a, I>(cells: I, delimiters: &[String], placeholders: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    dedup_preserving_order(
        cells
            .into_iter()
            .flat_map(|cell| split_list(cell, delimiters, placeholders)),
    )
}

fn dedup_preserving_order<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
