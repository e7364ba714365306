//! Wide-to-long reshape pipeline.
//!
//! - Columns: header cleaning and metadata synonym resolution
//! - Buckets: which raw columns feed which output group
//! - Reshaper: aggregation and melting
//! - Spec: serializable dataset configurations and presets
//! - Pipeline: file in, long CSV out

pub mod buckets;
pub mod columns;
pub mod pipeline;
pub mod reshaper;
pub mod spec;

pub use buckets::{Bucket, BucketSpec, ColumnNaming, EmptyBucketPolicy, ResolvedBucket};
pub use columns::{default_synonyms, normalize_columns, ColumnSynonym, NormalizedColumns};
pub use pipeline::{default_output_path, reshape_file, reshape_table, CsvInfo, ReshapeOptions, ReshapeSummary};
pub use reshaper::{melt, reshape, Reshaper, WideAggregate, WideRow};
pub use spec::{BucketSource, DatasetSpec, PRESET_NAMES};
