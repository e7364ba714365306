//! Domain models shared by the pipelines.
//!
//! - [`Table`] - In-memory wide table (headers + raw string cells)
//! - [`LongRow`] - One tidy output row (metadata, group, value)
//! - [`LongTable`] - Long-format result with its declared column order
//!
//! Numeric cells are coerced with [`coerce_numeric`], which maps anything
//! that is not a finite-or-infinite float to `None` ("missing"). Missing is
//! never the same as zero.

use serde::{Deserialize, Serialize};

// =============================================================================
// Table
// =============================================================================

/// A rectangular table of raw string cells with one header row.
///
/// Rows are padded with empty cells (or truncated) to the header width on
/// construction, so every cell lookup by column index is in bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column names, in file order.
    pub headers: Vec<String>,
    /// Data rows, in file order.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Index of the column named exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Raw cell text; empty for out-of-range lookups.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `limit` headers, for error messages.
    pub fn header_preview(&self, limit: usize) -> Vec<String> {
        self.headers.iter().take(limit).cloned().collect()
    }
}

// =============================================================================
// Long-format rows
// =============================================================================

/// One tidy output row: the source row's metadata, a group name and the
/// aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    /// Metadata values, in the order of the dataset's metadata columns.
    pub metadata: Vec<String>,
    /// Bucket name (e.g. "0-4").
    pub group: String,
    /// Aggregated value.
    pub value: f64,
}

impl LongRow {
    /// Cells in output order: metadata, group, formatted value.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = self.metadata.clone();
        record.push(self.group.clone());
        record.push(format_number(self.value));
        record
    }
}

/// A long-format result with its declared column order.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    /// Metadata columns, then the group column, then the value column.
    pub columns: Vec<String>,
    pub rows: Vec<LongRow>,
}

impl LongTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuild a wide [`Table`] with one column for `group`, as the
    /// reshaper would have seen it. Used to melt a result again.
    pub fn to_wide_for_group(&self, group: &str) -> Table {
        let meta_len = self.columns.len().saturating_sub(2);
        let mut headers: Vec<String> = self.columns[..meta_len].to_vec();
        headers.push(group.to_string());

        let rows = self
            .rows
            .iter()
            .filter(|r| r.group == group)
            .map(|r| {
                let mut cells = r.metadata.clone();
                cells.push(format_number(r.value));
                cells
            })
            .collect();

        Table::new(headers, rows)
    }
}

// =============================================================================
// Numeric coercion
// =============================================================================

/// Parse a raw cell as a number.
///
/// Whitespace and surrounding double quotes are ignored. Empty cells,
/// unparseable text and NaN all become `None`.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) if !v.is_nan() => Some(v),
        _ => None,
    }
}

/// Sum the present values; `None` when every value is missing.
///
/// Missing values are an additive identity only when at least one sibling
/// value is present.
pub fn sum_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Format a number for CSV output.
///
/// Integral values are written without a fractional part ("15" rather than
/// "15.0"); everything else uses the shortest round-trip representation.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
