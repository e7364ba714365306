//! Column-name normalization.
//!
//! Source tables disagree on how they spell their metadata headers. UN
//! population exports, for example, call the country column
//! "Region, subregion, country or area". Before reshaping, headers are
//! cleaned and each required metadata attribute is resolved either by exact
//! name or through a list of case-insensitive synonym tokens.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::parser::clean_header;

/// How many headers a [`SchemaError`] lists.
pub const HEADER_PREVIEW: usize = 10;

/// Tokens that identify a canonical metadata column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSynonym {
    /// Canonical attribute name (e.g. "Country").
    pub canonical: String,
    /// Lowercase substrings; a header containing any of them matches.
    pub tokens: Vec<String>,
}

impl ColumnSynonym {
    pub fn new(canonical: impl Into<String>, tokens: &[&str]) -> Self {
        Self {
            canonical: canonical.into(),
            tokens: tokens.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    fn matches(&self, header: &str) -> bool {
        let low = header.to_lowercase();
        self.tokens.iter().any(|t| low.contains(t.as_str()))
    }
}

/// Synonyms used by the built-in dataset specs.
pub fn default_synonyms() -> Vec<ColumnSynonym> {
    vec![ColumnSynonym::new("Country", &["region", "country", "area"])]
}

/// Headers after normalization plus where each metadata column lives.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumns {
    /// Cleaned headers with synonym renames applied.
    pub headers: Vec<String>,
    /// Index of each required metadata column, in request order.
    pub metadata_indices: Vec<usize>,
}

/// Clean headers and resolve every required metadata column.
///
/// A required column with an exact match is used as is. Otherwise the first
/// header matching one of its synonyms is renamed to it; headers that
/// exactly name another required column are never taken. Fails with
/// [`SchemaError::MissingColumn`] for the first column left unresolved.
pub fn normalize_columns(
    headers: &[String],
    required: &[String],
    synonyms: &[ColumnSynonym],
) -> Result<NormalizedColumns, SchemaError> {
    let mut headers: Vec<String> = headers.iter().map(|h| clean_header(h)).collect();

    for column in required {
        if headers.iter().any(|h| h == column) {
            continue;
        }
        let Some(synonym) = synonyms.iter().find(|s| &s.canonical == column) else {
            continue;
        };
        let candidate = headers
            .iter()
            .position(|h| !required.contains(h) && synonym.matches(h));
        if let Some(idx) = candidate {
            headers[idx] = column.clone();
        }
    }

    let mut metadata_indices = Vec::with_capacity(required.len());
    for column in required {
        match headers.iter().position(|h| h == column) {
            Some(idx) => metadata_indices.push(idx),
            None => {
                return Err(SchemaError::MissingColumn {
                    column: column.clone(),
                    found: headers.iter().take(HEADER_PREVIEW).cloned().collect(),
                })
            }
        }
    }

    Ok(NormalizedColumns {
        headers,
        metadata_indices,
    })
}
