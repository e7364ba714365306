//! Bucket definitions: which source columns feed which output group.
//!
//! A [`BucketSpec`] is an ordered list of named buckets. Declaration order is
//! output order. Buckets are resolved against a table's headers before
//! aggregation: missing source columns are skipped, and a bucket left with no
//! columns is handled according to its [`EmptyBucketPolicy`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::SchemaError;

/// Matches single-age headers exported as floats ("0.0", "99.0").
static DECIMAL_AGE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.0+$").expect("static regex"));

/// A named group of source columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Output group name (e.g. "0-4").
    pub name: String,
    /// Source column names, summed into the group.
    pub columns: Vec<String>,
}

impl Bucket {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// What to do with a bucket none of whose source columns exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyBucketPolicy {
    /// Leave the bucket out of the aggregate entirely.
    #[default]
    Drop,
    /// Keep the bucket with an all-missing aggregate.
    Retain,
}

/// How single-age source columns are named in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnNaming {
    /// "0", "1", ... "99"
    Bare,
    /// "0.0", "1.0", ... "99.0"
    DecimalSuffix,
    /// Decide from the table's headers.
    #[default]
    Auto,
}

impl ColumnNaming {
    /// Resolve [`ColumnNaming::Auto`] against a header row.
    ///
    /// Headers like "0.0" select [`ColumnNaming::DecimalSuffix`]; anything
    /// else falls back to [`ColumnNaming::Bare`].
    pub fn resolve(self, headers: &[String]) -> ColumnNaming {
        match self {
            ColumnNaming::Auto => {
                if headers.iter().any(|h| DECIMAL_AGE_HEADER.is_match(h)) {
                    ColumnNaming::DecimalSuffix
                } else {
                    ColumnNaming::Bare
                }
            }
            fixed => fixed,
        }
    }

    /// Header name for a single age/year.
    pub fn column_name(self, value: u32) -> String {
        match self {
            ColumnNaming::DecimalSuffix => format!("{}.0", value),
            ColumnNaming::Bare | ColumnNaming::Auto => value.to_string(),
        }
    }
}

/// Ordered bucket definitions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketSpec {
    pub buckets: Vec<Bucket>,
}

impl BucketSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bucket.
    pub fn with_bucket(mut self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.buckets.push(Bucket::new(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    /// Fixed-width bands `0-4, 5-9, ...` up to `max_value`, plus an optional
    /// open-ended bucket fed by a column of the same name (e.g. "100+").
    pub fn bands(width: u32, max_value: u32, naming: ColumnNaming, open_ended: Option<&str>) -> Self {
        let width = width.max(1);
        let mut buckets = Vec::new();
        let mut start = 0;
        while start <= max_value {
            let end = (start + width - 1).min(max_value);
            let name = if end == start {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            };
            let columns = (start..=end).map(|v| naming.column_name(v)).collect();
            buckets.push(Bucket::new(name, columns));
            start += width;
        }
        if let Some(label) = open_ended {
            buckets.push(Bucket::new(label, vec![label.to_string()]));
        }
        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.name.as_str()).collect()
    }

    /// Reject specs with a repeated bucket name or a source column that
    /// feeds two buckets. A column repeated inside one bucket is allowed.
    pub fn check_disjoint(&self) -> Result<(), SchemaError> {
        let mut names: HashSet<&str> = HashSet::new();
        for bucket in &self.buckets {
            if !names.insert(bucket.name.as_str()) {
                return Err(SchemaError::DuplicateBucket {
                    name: bucket.name.clone(),
                });
            }
        }

        let mut owner: HashMap<&str, usize> = HashMap::new();
        for (idx, bucket) in self.buckets.iter().enumerate() {
            for column in &bucket.columns {
                match owner.insert(column.as_str(), idx) {
                    Some(first) if first != idx => {
                        return Err(SchemaError::OverlappingBuckets {
                            column: column.clone(),
                            first: self.buckets[first].name.clone(),
                            second: bucket.name.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Reject buckets that list one of the metadata columns as a source.
    pub fn check_excludes(&self, metadata_columns: &[String]) -> Result<(), SchemaError> {
        for bucket in &self.buckets {
            if let Some(column) = bucket.columns.iter().find(|c| metadata_columns.contains(c)) {
                return Err(SchemaError::MetadataInBucket {
                    column: column.clone(),
                    bucket: bucket.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Map each bucket to the indices of its columns present in `headers`.
    ///
    /// Declaration order is preserved. A bucket with no present columns is
    /// dropped or kept empty depending on `policy`.
    pub fn resolve(&self, headers: &[String], policy: EmptyBucketPolicy) -> Vec<ResolvedBucket> {
        self.buckets
            .iter()
            .filter_map(|bucket| {
                let mut columns: Vec<usize> = Vec::new();
                for name in &bucket.columns {
                    if let Some(idx) = headers.iter().position(|h| h == name) {
                        if !columns.contains(&idx) {
                            columns.push(idx);
                        }
                    }
                }
                if columns.is_empty() && policy == EmptyBucketPolicy::Drop {
                    return None;
                }
                Some(ResolvedBucket {
                    name: bucket.name.clone(),
                    columns,
                })
            })
            .collect()
    }
}

/// A bucket bound to column indices of a concrete table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBucket {
    pub name: String,
    /// Indices into the table's headers; empty for a retained empty bucket.
    pub columns: Vec<usize>,
}
