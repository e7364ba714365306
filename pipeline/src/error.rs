//! Error types for the tidyload pipelines.
//!
//! - [`InputError`] - Unreadable, undecodable or malformed input files
//! - [`SchemaError`] - Required metadata columns missing after normalization
//! - [`EventError`] - Event aggregator options (cutoff date)
//! - [`GeoError`] - GeoJSON filter failures
//! - [`OutputError`] - Failures writing CSV/JSON output
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Every error is terminal: the batch stops with a descriptive message.
//! Values that fail numeric coercion are never errors, they are dropped.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Input Errors
// =============================================================================

/// Errors while reading and decoding an input table.
#[derive(Debug, Error)]
pub enum InputError {
    /// File could not be opened or read.
    #[error("Cannot read '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File has no header row.
    #[error("Input is empty, no header row found")]
    Empty,

    /// Detected encoding is not one we can decode.
    #[error("Cannot decode input: unsupported encoding '{0}'")]
    Encoding(String),

    /// A record could not be parsed.
    #[error("Malformed input at line {line}: {message}")]
    Malformed { line: u64, message: String },

    /// Spreadsheet could not be opened or has no usable sheet.
    #[error("Spreadsheet error: {0}")]
    Sheet(String),

    /// A WEEK value could not be parsed as a date.
    #[error("Invalid WEEK value '{value}' at line {line}")]
    InvalidWeek { line: u64, value: String },

    /// Any of the above, raised while loading a named file.
    #[error("'{path}': {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<InputError>,
    },
}

impl InputError {
    /// Attach the file the error came from, unless it already names one.
    pub fn in_file(self, path: &std::path::Path) -> Self {
        match self {
            err @ (InputError::Unreadable { .. } | InputError::InFile { .. }) => err,
            other => InputError::InFile {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, without file context.
    pub fn root(&self) -> &InputError {
        match self {
            InputError::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised when the table does not carry the required columns.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required metadata column is still missing after normalization.
    #[error("Expected metadata column '{column}' not found. Found columns: {found:?} ...")]
    MissingColumn { column: String, found: Vec<String> },

    /// A source column is claimed by two buckets.
    #[error("Column '{column}' belongs to both bucket '{first}' and bucket '{second}'")]
    OverlappingBuckets {
        column: String,
        first: String,
        second: String,
    },

    /// Two buckets share a name.
    #[error("Bucket '{name}' is declared more than once")]
    DuplicateBucket { name: String },

    /// A metadata column is also listed as a bucket source.
    #[error("Metadata column '{column}' cannot feed bucket '{bucket}'")]
    MetadataInBucket { column: String, bucket: String },
}

// =============================================================================
// Event Errors
// =============================================================================

/// Errors specific to the event-log aggregator.
#[derive(Debug, Error)]
pub enum EventError {
    /// The cutoff date given by the caller is not a date.
    #[error("Invalid cutoff date '{0}', expected YYYY-MM-DD")]
    InvalidCutoff(String),
}

// =============================================================================
// GeoJSON Errors
// =============================================================================

/// Errors from the GeoJSON country filter.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Input is not valid JSON.
    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No country names were given.
    #[error("At least one country name is required")]
    NoCountries,
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error.
    #[error("Output IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by the file-level entry points
/// ([`crate::transform::pipeline::reshape_file`],
/// [`crate::events::aggregate_file`]). It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Event log error.
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// GeoJSON error.
    #[error("GeoJSON error: {0}")]
    Geo(#[from] GeoError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Dataset spec could not be parsed.
    #[error("Invalid dataset spec: {0}")]
    InvalidSpec(#[from] serde_json::Error),

    /// Unknown preset name.
    #[error("Unknown preset '{0}' (available: deaths, population)")]
    UnknownPreset(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input operations.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // InputError -> PipelineError
        let input_err = InputError::Empty;
        let pipeline_err: PipelineError = input_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // SchemaError -> PipelineError
        let schema_err = SchemaError::MissingColumn {
            column: "Sex".into(),
            found: vec!["Country".into(), "Year".into()],
        };
        let pipeline_err: PipelineError = schema_err.into();
        assert!(pipeline_err.to_string().contains("Sex"));
    }

    #[test]
    fn test_schema_error_lists_found_columns() {
        let err = SchemaError::MissingColumn {
            column: "Year".into(),
            found: vec!["Sex".into(), "Country".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'Year'"));
        assert!(msg.contains("\"Sex\""));
        assert!(msg.contains("\"Country\""));
    }

    #[test]
    fn test_unreadable_names_the_file() {
        let err = InputError::Unreadable {
            path: PathBuf::from("data/missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("data/missing.csv"));
    }

    #[test]
    fn test_in_file_wraps_once() {
        let path = PathBuf::from("data/MiddleEastDeath.csv");
        let err = InputError::Empty.in_file(&path).in_file(&path);

        assert_eq!(err.to_string(), "'data/MiddleEastDeath.csv': Input is empty, no header row found");
        assert!(matches!(err.root(), InputError::Empty));
    }
}
