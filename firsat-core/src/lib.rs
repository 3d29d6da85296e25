//! # firsat-core — fair-value scoring for real-estate listings
//!
//! Reconstructs the exact feature vector a pre-trained regression model
//! expects from sparse free-text form input, scores it, and classifies the
//! asking price as FIRSAT (undervalued), PAHALI (overvalued), or NORMAL.
//!
//! The pipeline is synchronous and request-per-submission: the model bundle
//! and its lookup tables load once at startup and are read-only afterwards;
//! every submission assembles and discards its own working row.

pub mod bundle;
pub mod config;
pub mod decision;
pub mod detector;
pub mod encoding;
pub mod error;
pub mod features;
pub mod normalize;
pub mod row;
pub mod scorer;

pub use bundle::ModelBundle;
pub use config::{DetectorConfig, load_config};
pub use decision::{Advice, DecisionEngine, Verdict};
pub use detector::{OpportunityDetector, PredictionReport, Submission};
pub use error::FirsatError;
pub use features::{DerivedFeaturePlan, DerivedOutcome, ListingInput};
pub use row::{FeatureRow, FeatureVector};
pub use scorer::{Scorer, ScorerSpec};
