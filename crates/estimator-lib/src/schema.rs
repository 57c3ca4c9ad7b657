//! Feature schema loading
//!
//! The schema artifact is a JSON document whose `data_columns` key lists every
//! model input column in training order. The first three columns are the
//! numeric features; the rest are one-hot location columns.

use crate::error::{EstimatorError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Top-level key holding the column list
pub const DATA_COLUMNS_KEY: &str = "data_columns";

/// Numeric columns in the order the model was trained on
pub const NUMERIC_COLUMNS: [&str; 3] = ["bhk", "total_sqft", "bath"];

pub const BHK_INDEX: usize = 0;
pub const SQFT_INDEX: usize = 1;
pub const BATH_INDEX: usize = 2;

/// First column of the location block
pub const LOCATION_OFFSET: usize = NUMERIC_COLUMNS.len();

#[derive(Deserialize)]
struct SchemaArtifact {
    data_columns: Option<Vec<String>>,
}

/// Ordered model input columns plus a location → vector index lookup
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    location_index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Load and validate the schema artifact at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|e| EstimatorError::from_read(path, e))?;
        let schema = Self::from_json(&raw)?;
        debug!(
            path = %path.display(),
            columns = schema.len(),
            locations = schema.location_count(),
            "Schema loaded"
        );
        Ok(schema)
    }

    /// Parse a schema artifact from raw JSON bytes
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let artifact: SchemaArtifact = serde_json::from_slice(raw)
            .map_err(|e| EstimatorError::SchemaMalformed(format!("invalid JSON: {}", e)))?;
        let columns = artifact.data_columns.ok_or_else(|| {
            EstimatorError::SchemaMalformed(format!("missing `{}` key", DATA_COLUMNS_KEY))
        })?;
        Self::from_columns(columns)
    }

    /// Build a schema from an ordered column list
    pub fn from_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        if columns.len() < LOCATION_OFFSET {
            return Err(EstimatorError::SchemaMalformed(format!(
                "expected at least {} columns, found {}",
                LOCATION_OFFSET,
                columns.len()
            )));
        }

        for (i, expected) in NUMERIC_COLUMNS.iter().enumerate() {
            if !columns[i].eq_ignore_ascii_case(expected) {
                return Err(EstimatorError::SchemaMalformed(format!(
                    "column {} must be `{}`, found `{}`",
                    i, expected, columns[i]
                )));
            }
        }

        let mut location_index = HashMap::with_capacity(columns.len() - LOCATION_OFFSET);
        for (i, name) in columns.iter().enumerate().skip(LOCATION_OFFSET) {
            let key = normalize_location(name);
            if location_index.insert(key, i).is_some() {
                return Err(EstimatorError::SchemaMalformed(format!(
                    "duplicate location column `{}`",
                    name
                )));
            }
        }

        Ok(Self {
            columns,
            location_index,
        })
    }

    /// Total column count, i.e. the feature vector width
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Location columns in schema order
    pub fn locations(&self) -> &[String] {
        &self.columns[LOCATION_OFFSET..]
    }

    /// Location names sorted for display in a select list
    pub fn sorted_locations(&self) -> Vec<String> {
        let mut locations = self.locations().to_vec();
        locations.sort();
        locations
    }

    pub fn location_count(&self) -> usize {
        self.location_index.len()
    }

    /// Vector index of `location`, case-insensitive. Always `>= LOCATION_OFFSET`.
    pub fn location_index(&self, location: &str) -> Option<usize> {
        self.location_index.get(&normalize_location(location)).copied()
    }
}

/// Locations are matched on their lower-cased form
pub fn normalize_location(name: &str) -> String {
    name.to_lowercase()
}
