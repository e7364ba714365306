//! Dataset spec definition
//!
//! A dataset spec describes one input shape: its metadata columns, how raw
//! columns group into buckets, and the names of the long-format group and
//! value columns. Specs are plain JSON so new datasets need no code.

use serde::{Deserialize, Serialize};

use crate::models::Table;

use super::buckets::{Bucket, BucketSpec, ColumnNaming, EmptyBucketPolicy};
use super::columns::{default_synonyms, ColumnSynonym};
use super::reshaper::{Reshaper, DEFAULT_GROUP_COLUMN, DEFAULT_VALUE_COLUMN};

/// Names of the built-in presets.
pub const PRESET_NAMES: [&str; 2] = ["deaths", "population"];

/// Complete description of a reshape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Version of the spec format
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Columns identifying a row, carried into every long row.
    pub metadata_columns: Vec<String>,

    /// How raw columns group into buckets.
    pub buckets: BucketSource,

    /// Name of the long-format group column.
    #[serde(default = "default_group_column")]
    pub group_column: String,

    /// Name of the long-format value column.
    #[serde(default = "default_value_column")]
    pub value_column: String,

    /// Handling of buckets with no source columns in the input.
    #[serde(default)]
    pub empty_buckets: EmptyBucketPolicy,

    /// Header synonyms for metadata columns.
    #[serde(default = "default_synonyms")]
    pub synonyms: Vec<ColumnSynonym>,
}

/// Where the bucket definitions come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BucketSource {
    /// Fixed-width bands over single-value columns.
    Bands {
        width: u32,
        max_value: u32,
        #[serde(default)]
        naming: ColumnNaming,
        /// Extra bucket fed by a column of the same name (e.g. "100+").
        #[serde(default)]
        open_ended: Option<String>,
    },

    /// Explicit bucket list.
    Explicit { buckets: Vec<Bucket> },
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_group_column() -> String {
    DEFAULT_GROUP_COLUMN.to_string()
}

fn default_value_column() -> String {
    DEFAULT_VALUE_COLUMN.to_string()
}

impl DatasetSpec {
    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deaths by sex, country, year and single age.
    ///
    /// Buckets whose ages are all absent from the file are dropped.
    pub fn deaths() -> Self {
        Self {
            version: default_version(),
            description: "Deaths by single age into 5-year age groups".to_string(),
            metadata_columns: vec!["Sex".into(), "Country".into(), "Year".into()],
            buckets: BucketSource::Bands {
                width: 5,
                max_value: 99,
                naming: ColumnNaming::Auto,
                open_ended: Some("100+".to_string()),
            },
            group_column: default_group_column(),
            value_column: default_value_column(),
            empty_buckets: EmptyBucketPolicy::Drop,
            synonyms: default_synonyms(),
        }
    }

    /// Population by sex, country, year and single age.
    ///
    /// Every band is kept in the aggregate, all-missing ones included.
    pub fn population() -> Self {
        Self {
            description: "Population by single age into 5-year age groups".to_string(),
            empty_buckets: EmptyBucketPolicy::Retain,
            ..Self::deaths()
        }
    }

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "deaths" => Some(Self::deaths()),
            "population" => Some(Self::population()),
            _ => None,
        }
    }

    /// Concrete buckets for a table, resolving [`ColumnNaming::Auto`]
    /// against its headers.
    pub fn bucket_spec_for(&self, table: &Table) -> BucketSpec {
        match &self.buckets {
            BucketSource::Bands {
                width,
                max_value,
                naming,
                open_ended,
            } => BucketSpec::bands(
                *width,
                *max_value,
                naming.resolve(&table.headers),
                open_ended.as_deref(),
            ),
            BucketSource::Explicit { buckets } => BucketSpec {
                buckets: buckets.clone(),
            },
        }
    }

    /// A [`Reshaper`] configured for `table`.
    pub fn reshaper_for(&self, table: &Table) -> Reshaper {
        Reshaper::new(self.metadata_columns.clone(), self.bucket_spec_for(table))
            .group_column(self.group_column.clone())
            .value_column(self.value_column.clone())
            .empty_buckets(self.empty_buckets)
            .synonyms(self.synonyms.clone())
    }
}
