//! # Tidyload - wide-to-long reshaping and event-log aggregation
//!
//! Tidyload turns wide demographic tables (one column per single age) into
//! long, analysis-ready CSV, and condenses weekly conflict-event exports into
//! a set of chart-ready projections.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / XLSX │────▶│   Parser    │────▶│  Reshaper   │────▶│  Long CSV   │
//! │  (any enc.) │     │  (auto-enc) │     │  (buckets)  │     │             │
//! └─────────────┘     └──────┬──────┘     └─────────────┘     └─────────────┘
//!                            │            ┌─────────────┐     ┌─────────────┐
//!                            └───────────▶│ Aggregator  │────▶│ Projections │
//!                                         │  (events)   │     │   (CSVs)    │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use tidyload::{reshape_file, ReshapeOptions};
//!
//! let summary = reshape_file(Path::new("MiddleEastDeath.csv"), &ReshapeOptions::default())?;
//! println!("Wrote {} rows", summary.long_rows);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Tables, long rows and numeric coercion
//! - [`logs`] - Console progress log
//! - [`parser`] - CSV and spreadsheet parsing with auto-detection
//! - [`transform`] - Buckets, reshaper, dataset specs and pipeline
//! - [`events`] - Event-log projections
//! - [`geo`] - GeoJSON country filter
//! - [`writer`] - CSV output

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Reshaping
pub mod transform;

// Event aggregation
pub mod events;

// GeoJSON
pub mod geo;

// Output
pub mod writer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    EventError,
    GeoError,
    InputError,
    OutputError,
    PipelineError,
    PipelineResult,
    SchemaError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{coerce_numeric, format_number, sum_present, LongRow, LongTable, Table};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_file_auto,
    parse_table,
    ParseResult,
};

// =============================================================================
// Re-exports - Reshaping
// =============================================================================

pub use transform::{
    melt,
    reshape,
    reshape_file,
    reshape_table,
    Bucket,
    BucketSpec,
    ColumnNaming,
    DatasetSpec,
    EmptyBucketPolicy,
    Reshaper,
    ReshapeOptions,
    ReshapeSummary,
    WideAggregate,
};

// =============================================================================
// Re-exports - Events
// =============================================================================

pub use events::{
    aggregate,
    aggregate_file,
    events_from_table,
    parse_cutoff,
    AggregateOptions,
    AggregateSummary,
    EventRecord,
    Projection,
};

// =============================================================================
// Re-exports - GeoJSON and output
// =============================================================================

pub use geo::{filter_features, filter_file};
pub use writer::{convert_spreadsheet, write_csv, write_long_table};
