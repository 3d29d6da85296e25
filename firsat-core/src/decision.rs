//! Verdict logic: fair value vs. asking price.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Guards the delta division when the listing price is tiny.
pub const EPSILON: f64 = 1e-9;

/// Three-way classification of an asking price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Listed below fair value by more than the threshold.
    Firsat,
    /// Listed above fair value by more than the threshold.
    Pahali,
    /// Within the threshold band either way.
    Normal,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Firsat => "FIRSAT",
            Self::Pahali => "PAHALI",
            Self::Normal => "NORMAL",
        };
        f.write_str(tag)
    }
}

/// A verdict with its signed percentage delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Advice {
    pub verdict: Verdict,
    pub delta_pct: f64,
}

/// Compares predicted fair value to the asking price against a fixed
/// percentage threshold.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    threshold_pct: f64,
}

impl DecisionEngine {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    /// Classify a listing. A non-positive price short-circuits to NORMAL
    /// with a zero delta. The threshold comparison is strict: a delta landing
    /// exactly on the threshold stays NORMAL.
    pub fn advise(&self, listing_price: f64, fair_value: f64) -> Advice {
        if listing_price <= 0.0 {
            return Advice {
                verdict: Verdict::Normal,
                delta_pct: 0.0,
            };
        }
        let delta_pct = (fair_value - listing_price) / (listing_price + EPSILON) * 100.0;
        let verdict = if delta_pct > self.threshold_pct {
            Verdict::Firsat
        } else if delta_pct < -self.threshold_pct {
            Verdict::Pahali
        } else {
            Verdict::Normal
        };
        Advice { verdict, delta_pct }
    }
}
