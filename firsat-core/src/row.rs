//! Per-request feature rows.
//!
//! A [`FeatureRow`] is the single mutable record behind one prediction
//! request: seeded from the bundle's default row, overwritten by parsed user
//! input, extended with target-encoded columns, then frozen into a
//! schema-ordered [`FeatureVector`].

use crate::error::FirsatError;
use serde_json::Value;
use std::collections::BTreeMap;

/// The working row for one submission. Cell values are JSON scalars:
/// strings for categoricals, numbers for everything else, null for missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    cells: BTreeMap<String, Value>,
}

impl FeatureRow {
    /// Seed a fresh row from a default record. The source map is cloned,
    /// never borrowed mutably; repeated calls observe identical defaults.
    pub fn from_defaults(defaults: &BTreeMap<String, Value>) -> Self {
        Self {
            cells: defaults.clone(),
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Overwrite a column that already exists. Columns not present in the
    /// row (the model never saw them) are left untouched.
    pub fn set_existing(&mut self, column: &str, value: Value) {
        if let Some(cell) = self.cells.get_mut(column) {
            *cell = value;
        }
    }

    /// Insert or replace a column unconditionally. Used for columns that are
    /// appended after seeding, like target-encoding outputs.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.cells.insert(column.into(), value);
    }

    /// Numeric view of a cell. Numbers pass through; numeric strings coerce;
    /// anything else is missing.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.cells.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text view of a cell, as used for category lookups. Non-string scalars
    /// are stringified the way they were in the training tables.
    pub fn get_text(&self, column: &str) -> Option<String> {
        match self.cells.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Select and order columns to exactly match `schema`. This is the final
    /// gate before scoring: a schema column missing from the row fails the
    /// whole request.
    pub fn finalize(self, schema: &[String]) -> Result<FeatureVector, FirsatError> {
        let missing: Vec<&str> = schema
            .iter()
            .filter(|c| !self.cells.contains_key(c.as_str()))
            .map(|c| c.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(FirsatError::prediction(format!(
                "row is missing model columns: {}",
                missing.join(", ")
            )));
        }

        let mut cells = self.cells;
        let values = schema
            .iter()
            .map(|c| cells.remove(c).unwrap_or(Value::Null))
            .collect();
        Ok(FeatureVector {
            columns: schema.to_vec(),
            values,
        })
    }
}

/// A finalized, schema-ordered row ready for the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl FeatureVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Numeric view, with the same coercions as [`FeatureRow::get_f64`].
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn get_text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
