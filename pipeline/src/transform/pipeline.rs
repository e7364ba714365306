//! High-level reshape API: file in, long CSV out.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use tidyload::{reshape_file, ReshapeOptions};
//!
//! let summary = reshape_file(Path::new("MiddleEastDeath.csv"), &ReshapeOptions::default())?;
//! println!("{} long rows written to {}", summary.long_rows, summary.output.display());
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{LongTable, Table};
use crate::parser::{parse_file_auto, ParseResult};
use crate::writer::write_long_table;

use super::reshaper::{melt, WideAggregate};
use super::spec::DatasetSpec;

/// Suffix appended to the input stem for the default output path.
pub const OUTPUT_SUFFIX: &str = "_long_format.csv";

/// Options for the reshape pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReshapeOptions {
    /// Built-in preset to use when no spec file is given
    pub preset: String,

    /// Use a dataset spec file instead of a preset
    pub spec_path: Option<PathBuf>,

    /// Output path (default: next to the input, see [`default_output_path`])
    pub output: Option<PathBuf>,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        Self {
            preset: "deaths".to_string(),
            spec_path: None,
            output: None,
        }
    }
}

impl ReshapeOptions {
    /// Load the dataset spec these options select.
    pub fn dataset_spec(&self) -> PipelineResult<DatasetSpec> {
        match &self.spec_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| {
                    crate::error::InputError::Unreadable {
                        path: path.clone(),
                        source,
                    }
                })?;
                Ok(DatasetSpec::from_json(&content)?)
            }
            None => DatasetSpec::preset(&self.preset)
                .ok_or_else(|| PipelineError::UnknownPreset(self.preset.clone())),
        }
    }
}

/// Input file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: Option<char>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl CsvInfo {
    fn from_parse(result: &ParseResult) -> Self {
        Self {
            encoding: result.encoding.clone(),
            delimiter: result.delimiter,
            headers: result.table.headers.clone(),
            row_count: result.table.len(),
        }
    }
}

/// Result of a reshape run
#[derive(Debug, Clone, Serialize)]
pub struct ReshapeSummary {
    /// Input file information
    pub csv_info: CsvInfo,
    /// Buckets present in the aggregate
    pub buckets: Vec<String>,
    /// (row, bucket) pairs before dropping missing values
    pub pairs: usize,
    /// Rows written
    pub long_rows: usize,
    /// Pairs dropped because their value was missing
    pub dropped: usize,
    /// Where the output was written
    pub output: PathBuf,
}

/// `<dir>/<stem>_long_format.csv` for an input path.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}{}", stem, OUTPUT_SUFFIX))
}

/// Reshape an already loaded table with a dataset spec.
///
/// Returns the intermediate aggregate alongside the long result.
pub fn reshape_table(table: &Table, spec: &DatasetSpec) -> PipelineResult<(WideAggregate, LongTable)> {
    let reshaper = spec.reshaper_for(table);
    let wide = reshaper.aggregate(table)?;
    let long = melt(&wide, &spec.group_column, &spec.value_column);
    Ok((wide, long))
}

/// Reshape a wide file into a long CSV.
///
/// 1. Parses the input with auto-detection
/// 2. Resolves the dataset spec (file or preset)
/// 3. Aggregates buckets and melts to long rows
/// 4. Writes the result
pub fn reshape_file(path: &Path, options: &ReshapeOptions) -> PipelineResult<ReshapeSummary> {
    log_info(format!("📖 Reading {}", path.display()));
    let parsed = parse_file_auto(path)?;
    let csv_info = CsvInfo::from_parse(&parsed);
    log_success(format!("Detected encoding: {}", csv_info.encoding));
    if let Some(d) = csv_info.delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(d)));
    }
    log_success(format!("Read {} rows, {} columns", csv_info.row_count, csv_info.headers.len()));

    let spec = options.dataset_spec()?;
    log_info(format!("Dataset spec: {}", spec.description));

    let (wide, long) = reshape_table(&parsed.table, &spec)?;
    log_success(format!("Step 1: {} buckets merged", wide.buckets.len()));
    log_info_indent(format!("Grouped shape: ({}, {})", wide.rows.len(), wide.metadata_columns.len() + wide.buckets.len()), 1);

    let pairs = wide.cell_count();
    let dropped = pairs - long.len();
    log_success(format!("Step 2: converted to long format, {} rows", long.len()));
    if dropped > 0 {
        log_warning(format!("{} (row, bucket) pairs had no numeric value and were dropped", dropped));
    }

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(path));
    write_long_table(&output, &long)?;
    log_success(format!("Converted {} rows to {} rows → {}", wide.rows.len(), long.len(), output.display()));

    Ok(ReshapeSummary {
        csv_info,
        buckets: wide.buckets,
        pairs,
        long_rows: long.len(),
        dropped,
        output,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
