//! Target-encoding lookups for categorical columns.
//!
//! At training time each categorical column (district, neighborhood) was
//! replaced by per-category statistics of the target. The tables land in the
//! model bundle and are re-applied here at inference time: three numeric
//! columns per role, with global fallbacks for categories the training data
//! never saw.

use crate::row::FeatureRow;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Target-encoding configuration for one categorical role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEncoding {
    /// Source column the category is read from.
    pub col: String,
    pub maps: EncodingTables,
}

/// Per-category lookup tables plus global fallbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodingTables {
    #[serde(default)]
    pub mean: BTreeMap<String, f64>,
    #[serde(default)]
    pub med: BTreeMap<String, f64>,
    #[serde(default)]
    pub cnt: BTreeMap<String, f64>,
    #[serde(default)]
    pub global_mean: f64,
    #[serde(default)]
    pub global_med: f64,
}

impl TargetEncoding {
    /// Append `te_<col>_mean`, `te_<col>_med`, and `te_<col>_cnt` derived
    /// from the row's current category value.
    ///
    /// Unseen categories fall back to the global mean/median and a count of
    /// zero. Silently does nothing when the tables are empty or the source
    /// column is not in the row; an unmapped role is a tolerated model
    /// variant, not an error.
    pub fn apply(&self, row: &mut FeatureRow) {
        if self.maps.mean.is_empty() && self.maps.med.is_empty() && self.maps.cnt.is_empty() {
            return;
        }
        if !row.contains(&self.col) {
            return;
        }
        let Some(key) = row.get_text(&self.col) else {
            return;
        };

        let mean = self.maps.mean.get(&key).copied();
        let med = self.maps.med.get(&key).copied();
        let cnt = self.maps.cnt.get(&key).copied();
        if mean.is_none() && med.is_none() {
            tracing::debug!(column = %self.col, category = %key, "unseen category, using global fallbacks");
        }

        row.insert(
            format!("te_{}_mean", self.col),
            json!(mean.unwrap_or(self.maps.global_mean)),
        );
        row.insert(
            format!("te_{}_med", self.col),
            json!(med.unwrap_or(self.maps.global_med)),
        );
        row.insert(format!("te_{}_cnt", self.col), json!(cnt.unwrap_or(0.0)));
    }

    /// Known categories, sorted, as shown in selection lists. Derived from
    /// the count table since every training category has a count.
    pub fn options(&self) -> Vec<String> {
        self.maps.cnt.keys().cloned().collect()
    }
}
