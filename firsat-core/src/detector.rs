//! The end-to-end detector pipeline.
//!
//! One submission: validate → rebuild the feature row → score → compare to
//! the asking price → report. The bundle and everything derived from it are
//! read-only after construction; each submission gets its own working row.

use crate::bundle::ModelBundle;
use crate::decision::{Advice, DecisionEngine, Verdict};
use crate::error::FirsatError;
use crate::features::{DerivedFeaturePlan, DerivedOutcome, FeatureVectorBuilder, ListingInput};
use crate::normalize::parse_numeric;
use crate::scorer::Scorer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// One form submission: the listing attributes plus the asking price, all as
/// raw text.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub listing: ListingInput,
    pub listing_price: String,
}

/// The rendered result of one evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub fair_value: f64,
    pub listing_price: f64,
    pub verdict: Verdict,
    pub delta_pct: f64,
    pub threshold_pct: f64,
    /// Set when the asking price sits above the training price range; the
    /// prediction stands but extrapolates.
    pub extrapolation_warning: bool,
    pub derived: Vec<DerivedOutcome>,
    pub predicted_at: DateTime<Utc>,
}

/// Scores listings against the trained fair-value model.
pub struct OpportunityDetector {
    bundle: ModelBundle,
    scorer: Box<dyn Scorer>,
    plan: DerivedFeaturePlan,
    decision: DecisionEngine,
}

impl OpportunityDetector {
    pub fn new(bundle: ModelBundle) -> Self {
        let scorer = bundle.scorer.build();
        let plan = DerivedFeaturePlan::resolve(&bundle.default_row, &bundle.ui_cols);
        let decision = DecisionEngine::new(bundle.threshold_pct);
        tracing::debug!(?plan, "derived feature plan resolved");
        Self {
            bundle,
            scorer,
            plan,
            decision,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, FirsatError> {
        Ok(Self::new(ModelBundle::load(path)?))
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn threshold_pct(&self) -> f64 {
        self.decision.threshold_pct()
    }

    pub fn district_options(&self) -> Vec<String> {
        self.bundle.district_options()
    }

    pub fn neighborhood_options(&self) -> Vec<String> {
        self.bundle.neighborhood_options()
    }

    /// Whether the model takes a neighborhood at all.
    pub fn uses_neighborhood(&self) -> bool {
        self.bundle
            .ui_col(crate::features::roles::NEIGHBORHOOD)
            .is_some()
    }

    /// Evaluate one submission.
    ///
    /// Validation failures come back as [`FirsatError::Validation`] with the
    /// offending field; schema or scorer failures as
    /// [`FirsatError::Prediction`]. Derived-feature skips never fail the
    /// request; they ride along on the report.
    pub fn evaluate(&self, submission: &Submission) -> Result<PredictionReport, FirsatError> {
        if submission.listing.district.trim().is_empty() {
            return Err(FirsatError::validation(
                "district",
                "district is required; pick one from the list",
            ));
        }

        let listing_price = parse_numeric(&submission.listing_price)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| {
                FirsatError::validation("listing_price", "enter a valid positive listing price")
            })?;

        let extrapolation_warning = listing_price > self.bundle.max_training_price;
        if extrapolation_warning {
            tracing::warn!(
                listing_price,
                max_training_price = self.bundle.max_training_price,
                "listing price above training range, prediction extrapolates"
            );
        }

        let builder = FeatureVectorBuilder::new(
            &self.bundle.default_row,
            &self.bundle.ui_cols,
            &self.bundle.te_maps,
            self.plan,
        );
        let (row, derived) = builder.build(&submission.listing);
        let vector = row.finalize(&self.bundle.expected_features)?;

        let prediction = self.scorer.predict(&vector)?;
        let fair_value = prediction.exp_m1();
        let Advice { verdict, delta_pct } = self.decision.advise(listing_price, fair_value);
        tracing::info!(fair_value, listing_price, %verdict, delta_pct, "listing evaluated");

        Ok(PredictionReport {
            fair_value,
            listing_price,
            verdict,
            delta_pct,
            threshold_pct: self.decision.threshold_pct(),
            extrapolation_warning,
            derived,
            predicted_at: Utc::now(),
        })
    }
}
