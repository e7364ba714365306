//! Wide-to-long reshaping with bucket aggregation.
//!
//! ```text
//! Sex    Country Year  0   1   2  ...        Sex    Country Year Age_Group_5yr Population
//! Female Iraq    2020  10  5   0        →    Female Iraq    2020 0-4           15
//!                                            Female Iraq    2020 5-9           ...
//! ```
//!
//! [`Reshaper::aggregate`] normalizes headers, resolves buckets and sums
//! them into a [`WideAggregate`]; [`melt`] turns that into long rows and
//! drops the ones whose value is missing. Output is ordered by source row,
//! then by bucket declaration order.

use crate::error::SchemaError;
use crate::models::{coerce_numeric, sum_present, LongRow, LongTable, Table};

use super::buckets::{BucketSpec, EmptyBucketPolicy};
use super::columns::{default_synonyms, normalize_columns, ColumnSynonym};

/// Default name of the group column in long output.
pub const DEFAULT_GROUP_COLUMN: &str = "Age_Group_5yr";

/// Default name of the value column in long output.
pub const DEFAULT_VALUE_COLUMN: &str = "Population";

/// One source row after bucket aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub metadata: Vec<String>,
    /// One entry per bucket in [`WideAggregate::buckets`]; `None` is missing.
    pub values: Vec<Option<f64>>,
}

/// The intermediate wide table: metadata plus one column per bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct WideAggregate {
    pub metadata_columns: Vec<String>,
    pub buckets: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideAggregate {
    /// Number of (row, bucket) pairs.
    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.buckets.len()
    }

    /// Number of (row, bucket) pairs with a non-missing aggregate.
    pub fn present_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_some()).count())
            .sum()
    }
}

/// Configured reshape of one dataset shape.
#[derive(Debug, Clone)]
pub struct Reshaper {
    metadata_columns: Vec<String>,
    buckets: BucketSpec,
    group_column: String,
    value_column: String,
    empty_buckets: EmptyBucketPolicy,
    synonyms: Vec<ColumnSynonym>,
}

impl Reshaper {
    pub fn new(metadata_columns: Vec<String>, buckets: BucketSpec) -> Self {
        Self {
            metadata_columns,
            buckets,
            group_column: DEFAULT_GROUP_COLUMN.to_string(),
            value_column: DEFAULT_VALUE_COLUMN.to_string(),
            empty_buckets: EmptyBucketPolicy::default(),
            synonyms: default_synonyms(),
        }
    }

    pub fn group_column(mut self, name: impl Into<String>) -> Self {
        self.group_column = name.into();
        self
    }

    pub fn value_column(mut self, name: impl Into<String>) -> Self {
        self.value_column = name.into();
        self
    }

    pub fn empty_buckets(mut self, policy: EmptyBucketPolicy) -> Self {
        self.empty_buckets = policy;
        self
    }

    pub fn synonyms(mut self, synonyms: Vec<ColumnSynonym>) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn bucket_spec(&self) -> &BucketSpec {
        &self.buckets
    }

    /// Normalize columns, resolve buckets and sum each bucket per row.
    pub fn aggregate(&self, table: &Table) -> Result<WideAggregate, SchemaError> {
        self.buckets.check_disjoint()?;
        self.buckets.check_excludes(&self.metadata_columns)?;

        let normalized = normalize_columns(&table.headers, &self.metadata_columns, &self.synonyms)?;
        let resolved = self.buckets.resolve(&normalized.headers, self.empty_buckets);

        let rows = (0..table.len())
            .map(|row| {
                let metadata = normalized
                    .metadata_indices
                    .iter()
                    .map(|&col| table.cell(row, col).to_string())
                    .collect();
                let values = resolved
                    .iter()
                    .map(|bucket| {
                        sum_present(
                            bucket
                                .columns
                                .iter()
                                .map(|&col| coerce_numeric(table.cell(row, col))),
                        )
                    })
                    .collect();
                WideRow { metadata, values }
            })
            .collect();

        Ok(WideAggregate {
            metadata_columns: self.metadata_columns.clone(),
            buckets: resolved.into_iter().map(|b| b.name).collect(),
            rows,
        })
    }

    /// Full reshape: aggregate, melt, drop missing values.
    pub fn reshape(&self, table: &Table) -> Result<LongTable, SchemaError> {
        let wide = self.aggregate(table)?;
        Ok(melt(&wide, &self.group_column, &self.value_column))
    }
}

/// Melt a [`WideAggregate`] into long rows.
///
/// Produces one row per (row, bucket) pair in row-major order, re-coerces the
/// value and drops pairs whose value is missing.
pub fn melt(wide: &WideAggregate, group_column: &str, value_column: &str) -> LongTable {
    let mut columns = wide.metadata_columns.clone();
    columns.push(group_column.to_string());
    columns.push(value_column.to_string());

    let rows = wide
        .rows
        .iter()
        .flat_map(|row| {
            wide.buckets
                .iter()
                .zip(&row.values)
                .map(move |(bucket, value)| (row, bucket, *value))
        })
        .filter_map(|(row, bucket, value)| {
            let value = value.filter(|v| !v.is_nan())?;
            Some(LongRow {
                metadata: row.metadata.clone(),
                group: bucket.clone(),
                value,
            })
        })
        .collect();

    LongTable { columns, rows }
}

/// Reshape `table` with the given metadata columns and buckets.
///
/// Empty buckets are dropped and the default country synonyms apply; use
/// [`Reshaper`] directly for other settings.
pub fn reshape(
    table: &Table,
    metadata_columns: &[String],
    bucket_spec: &BucketSpec,
    group_column: &str,
    value_column: &str,
) -> Result<LongTable, SchemaError> {
    Reshaper::new(metadata_columns.to_vec(), bucket_spec.clone())
        .group_column(group_column)
        .value_column(value_column)
        .reshape(table)
}
