//! Model bundle loading.
//!
//! The training pipeline exports one JSON document carrying everything the
//! detector needs at inference time: the scorer, the decision threshold, the
//! target-encoding tables, the feature schema, the default row, and the
//! role-to-column map. Loaded once at startup and read-only afterwards.

use crate::encoding::TargetEncoding;
use crate::error::FirsatError;
use crate::features::roles;
use crate::scorer::ScorerSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// The serialized model bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub scorer: ScorerSpec,

    /// Decision threshold in percent.
    #[serde(default = "default_threshold_pct")]
    pub threshold_pct: f64,

    /// Target-encoding tables keyed by role.
    #[serde(default)]
    pub te_maps: BTreeMap<String, TargetEncoding>,

    /// Ordered feature schema the scorer expects.
    #[serde(default)]
    pub expected_features: Vec<String>,

    /// One typical value per pre-encoding column; fills whatever the user
    /// leaves out.
    #[serde(default)]
    pub default_row: BTreeMap<String, Value>,

    /// Role → schema column. Roles the model never used are absent.
    #[serde(default)]
    pub ui_cols: BTreeMap<String, String>,

    /// Upper edge of the training price range; listings above it get an
    /// extrapolation caveat.
    #[serde(default = "default_max_training_price")]
    pub max_training_price: f64,
}

fn default_threshold_pct() -> f64 {
    10.0
}

fn default_max_training_price() -> f64 {
    2_500_000.0
}

impl ModelBundle {
    /// Load and validate a bundle file. Missing file, malformed JSON, or a
    /// bundle without a feature schema or default row are fatal.
    pub fn load(path: &Path) -> Result<Self, FirsatError> {
        if !path.exists() {
            return Err(FirsatError::bundle(format!(
                "model bundle not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let bundle: Self = serde_json::from_str(&content).map_err(|e| {
            FirsatError::bundle(format!("failed to parse {}: {e}", path.display()))
        })?;
        bundle.validate()?;
        tracing::info!(
            features = bundle.expected_features.len(),
            threshold_pct = bundle.threshold_pct,
            scorer = bundle.scorer.kind(),
            "model bundle loaded"
        );
        Ok(bundle)
    }

    /// The startup contract: a bundle without a schema or default row cannot
    /// assemble rows and must not start.
    pub fn validate(&self) -> Result<(), FirsatError> {
        if self.expected_features.is_empty() {
            return Err(FirsatError::bundle(
                "bundle has no expected_features; re-export the training artifacts",
            ));
        }
        if self.default_row.is_empty() {
            return Err(FirsatError::bundle(
                "bundle has no default_row; re-export the training artifacts",
            ));
        }
        Ok(())
    }

    pub fn ui_col(&self, role: &str) -> Option<&str> {
        self.ui_cols.get(role).map(String::as_str)
    }

    /// Sorted district list for selection UIs.
    pub fn district_options(&self) -> Vec<String> {
        self.role_options(roles::DISTRICT)
    }

    /// Sorted neighborhood list; empty when the model has no neighborhood
    /// column.
    pub fn neighborhood_options(&self) -> Vec<String> {
        self.role_options(roles::NEIGHBORHOOD)
    }

    fn role_options(&self, role: &str) -> Vec<String> {
        self.te_maps
            .get(role)
            .map(TargetEncoding::options)
            .unwrap_or_default()
    }
}
