//! Feature vector reconstruction.
//!
//! The trained model expects the exact feature row shape the training
//! pipeline produced: defaults for anything the user left out, engineered
//! columns recomputed from the raw inputs, target-encoding columns appended,
//! all in schema order. This module rebuilds that contract at inference time
//! from sparse free-text form input.

use crate::encoding::TargetEncoding;
use crate::normalize::{parse_numeric, parse_rooms};
use crate::row::FeatureRow;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Logical input roles the form can supply. A model only uses the roles its
/// `ui_cols` table maps.
pub mod roles {
    pub const DISTRICT: &str = "district";
    pub const NEIGHBORHOOD: &str = "neighborhood";
    pub const AREA: &str = "area";
    pub const ROOMS: &str = "rooms";
    pub const BATHS: &str = "baths";
    pub const AGE: &str = "age";
}

/// Raw text fields from one form submission. Empty strings mean "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingInput {
    pub district: String,
    pub neighborhood: String,
    pub area: String,
    pub rooms: String,
    pub baths: String,
    pub age: String,
}

/// Which engineered features this model actually carries. Resolved once at
/// bundle load so per-request code never re-tests column membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedFeaturePlan {
    pub log_area: bool,
    pub area_per_room: bool,
    pub room_bath_ratio: bool,
    pub age_bucket: bool,
}

impl DerivedFeaturePlan {
    /// A derived feature is live when its output column exists in the row
    /// template and every input role it needs is mapped to a template column.
    pub fn resolve(
        default_row: &BTreeMap<String, Value>,
        ui_cols: &BTreeMap<String, String>,
    ) -> Self {
        let mapped = |role: &str| {
            ui_cols
                .get(role)
                .is_some_and(|col| default_row.contains_key(col))
        };
        Self {
            log_area: default_row.contains_key("log_area") && mapped(roles::AREA),
            area_per_room: default_row.contains_key("area_per_room")
                && mapped(roles::AREA)
                && mapped(roles::ROOMS),
            room_bath_ratio: default_row.contains_key("room_bath_ratio")
                && mapped(roles::ROOMS)
                && mapped(roles::BATHS),
            age_bucket: default_row.contains_key("age_bucket") && mapped(roles::AGE),
        }
    }
}

/// What happened to one planned derived feature during a build. Recomputation
/// is best-effort: a skip is recorded and the build carries on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DerivedOutcome {
    Applied { feature: String, value: Value },
    Skipped { feature: String, reason: String },
}

impl DerivedOutcome {
    pub fn feature(&self) -> &str {
        match self {
            Self::Applied { feature, .. } | Self::Skipped { feature, .. } => feature,
        }
    }

    fn applied(feature: &str, value: Value) -> Self {
        Self::Applied {
            feature: feature.to_string(),
            value,
        }
    }

    fn skipped(feature: &str, reason: impl Into<String>) -> Self {
        Self::Skipped {
            feature: feature.to_string(),
            reason: reason.into(),
        }
    }
}

/// Assembles one complete feature row per submission.
pub struct FeatureVectorBuilder<'a> {
    default_row: &'a BTreeMap<String, Value>,
    ui_cols: &'a BTreeMap<String, String>,
    te_maps: &'a BTreeMap<String, TargetEncoding>,
    plan: DerivedFeaturePlan,
}

impl<'a> FeatureVectorBuilder<'a> {
    pub fn new(
        default_row: &'a BTreeMap<String, Value>,
        ui_cols: &'a BTreeMap<String, String>,
        te_maps: &'a BTreeMap<String, TargetEncoding>,
        plan: DerivedFeaturePlan,
    ) -> Self {
        Self {
            default_row,
            ui_cols,
            te_maps,
            plan,
        }
    }

    /// Build the working row: defaults, then user overrides, then derived
    /// features, then target encoding. The returned outcomes record what the
    /// derived-feature pass did. Finalization against the schema is the
    /// caller's last step, so the outcomes survive even when the schema gate
    /// rejects the row.
    pub fn build(&self, input: &ListingInput) -> (FeatureRow, Vec<DerivedOutcome>) {
        let mut row = FeatureRow::from_defaults(self.default_row);

        self.write_text(&mut row, roles::DISTRICT, &input.district);
        self.write_text(&mut row, roles::NEIGHBORHOOD, &input.neighborhood);
        self.write_numeric(&mut row, roles::AREA, parse_numeric(&input.area));
        self.write_numeric(&mut row, roles::ROOMS, parse_rooms(&input.rooms));
        self.write_numeric(&mut row, roles::BATHS, parse_numeric(&input.baths));
        self.write_numeric(&mut row, roles::AGE, parse_numeric(&input.age));

        let outcomes = self.apply_derived(&mut row);

        for role in [roles::DISTRICT, roles::NEIGHBORHOOD] {
            if let Some(te) = self.te_maps.get(role) {
                te.apply(&mut row);
            }
        }

        (row, outcomes)
    }

    /// Overwrite a mapped text column; blank input keeps the default.
    fn write_text(&self, row: &mut FeatureRow, role: &str, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Some(col) = self.ui_cols.get(role) {
            row.set_existing(col, json!(trimmed));
        }
    }

    /// Overwrite a mapped numeric column; unparsed input keeps the default.
    fn write_numeric(&self, row: &mut FeatureRow, role: &str, parsed: Option<f64>) {
        let Some(value) = parsed else { return };
        if let Some(col) = self.ui_cols.get(role) {
            row.set_existing(col, json!(value));
        }
    }

    fn role_f64(&self, row: &FeatureRow, role: &str) -> Option<f64> {
        self.ui_cols.get(role).and_then(|col| row.get_f64(col))
    }

    fn apply_derived(&self, row: &mut FeatureRow) -> Vec<DerivedOutcome> {
        let mut outcomes = Vec::new();

        if self.plan.log_area {
            let outcome = match self.role_f64(row, roles::AREA) {
                Some(area) if area > -1.0 => {
                    let value = area.ln_1p();
                    row.set_existing("log_area", json!(value));
                    DerivedOutcome::applied("log_area", json!(value))
                }
                Some(_) => DerivedOutcome::skipped("log_area", "area outside log1p domain"),
                None => DerivedOutcome::skipped("log_area", "area is not numeric"),
            };
            outcomes.push(outcome);
        }

        if self.plan.area_per_room {
            let outcome = match (
                self.role_f64(row, roles::AREA),
                self.role_f64(row, roles::ROOMS),
            ) {
                (Some(area), Some(rooms)) => {
                    let value = area / (rooms + 1.0);
                    if value.is_finite() {
                        row.set_existing("area_per_room", json!(value));
                        DerivedOutcome::applied("area_per_room", json!(value))
                    } else {
                        DerivedOutcome::skipped("area_per_room", "ratio is not finite")
                    }
                }
                _ => DerivedOutcome::skipped("area_per_room", "area or rooms is not numeric"),
            };
            outcomes.push(outcome);
        }

        if self.plan.room_bath_ratio {
            let outcome = match (
                self.role_f64(row, roles::ROOMS),
                self.role_f64(row, roles::BATHS),
            ) {
                (Some(rooms), Some(baths)) => {
                    let value = rooms / (baths + 1e-3);
                    if value.is_finite() {
                        row.set_existing("room_bath_ratio", json!(value));
                        DerivedOutcome::applied("room_bath_ratio", json!(value))
                    } else {
                        DerivedOutcome::skipped("room_bath_ratio", "ratio is not finite")
                    }
                }
                _ => DerivedOutcome::skipped("room_bath_ratio", "rooms or baths is not numeric"),
            };
            outcomes.push(outcome);
        }

        if self.plan.age_bucket {
            let outcome = match self.role_f64(row, roles::AGE) {
                Some(age) => {
                    let bucket = age_bucket(age);
                    row.set_existing("age_bucket", json!(bucket));
                    DerivedOutcome::applied("age_bucket", json!(bucket))
                }
                None => DerivedOutcome::skipped("age_bucket", "age is not numeric"),
            };
            outcomes.push(outcome);
        }

        for outcome in &outcomes {
            if let DerivedOutcome::Skipped { feature, reason } = outcome {
                tracing::debug!(%feature, %reason, "derived feature skipped");
            }
        }
        outcomes
    }
}

/// Building-age bucket with the training cut points.
fn age_bucket(age: f64) -> &'static str {
    if age <= 5.0 {
        "0-5"
    } else if age <= 15.0 {
        "6-15"
    } else if age <= 30.0 {
        "16-30"
    } else {
        "30+"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingTables;
    use pretty_assertions::assert_eq;

    fn default_row() -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("district".to_string(), json!("Kadıköy")),
            ("gross_m2".to_string(), json!(95.0)),
            ("room_count".to_string(), json!(3.0)),
            ("bath_count".to_string(), json!(1.0)),
            ("building_age".to_string(), json!(10.0)),
            ("log_area".to_string(), json!(4.564348191467836)),
            ("area_per_room".to_string(), json!(23.75)),
            ("room_bath_ratio".to_string(), json!(2.997002997002997)),
            ("age_bucket".to_string(), json!("6-15")),
        ])
    }

    fn ui_cols() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("district".to_string(), "district".to_string()),
            ("area".to_string(), "gross_m2".to_string()),
            ("rooms".to_string(), "room_count".to_string()),
            ("baths".to_string(), "bath_count".to_string()),
            ("age".to_string(), "building_age".to_string()),
        ])
    }

    fn te_maps() -> BTreeMap<String, TargetEncoding> {
        BTreeMap::from([(
            "district".to_string(),
            TargetEncoding {
                col: "district".to_string(),
                maps: EncodingTables {
                    mean: BTreeMap::from([("Kadıköy".to_string(), 14.1)]),
                    med: BTreeMap::from([("Kadıköy".to_string(), 14.0)]),
                    cnt: BTreeMap::from([("Kadıköy".to_string(), 812.0)]),
                    global_mean: 13.7,
                    global_med: 13.6,
                },
            },
        )])
    }

    fn builder_parts() -> (
        BTreeMap<String, Value>,
        BTreeMap<String, String>,
        BTreeMap<String, TargetEncoding>,
    ) {
        (default_row(), ui_cols(), te_maps())
    }

    #[test]
    fn test_plan_resolution() {
        let plan = DerivedFeaturePlan::resolve(&default_row(), &ui_cols());
        assert!(plan.log_area);
        assert!(plan.area_per_room);
        assert!(plan.room_bath_ratio);
        assert!(plan.age_bucket);

        // a model without a rooms mapping loses every rooms-dependent feature
        let mut cols = ui_cols();
        cols.remove("rooms");
        let plan = DerivedFeaturePlan::resolve(&default_row(), &cols);
        assert!(plan.log_area);
        assert!(!plan.area_per_room);
        assert!(!plan.room_bath_ratio);
    }

    #[test]
    fn test_overrides_and_derived_recompute() {
        let (defaults, cols, te) = builder_parts();
        let plan = DerivedFeaturePlan::resolve(&defaults, &cols);
        let builder = FeatureVectorBuilder::new(&defaults, &cols, &te, plan);

        let input = ListingInput {
            district: " Kadıköy ".to_string(),
            area: "120".to_string(),
            rooms: "3+1".to_string(),
            baths: "2".to_string(),
            age: "20".to_string(),
            ..Default::default()
        };
        let (row, outcomes) = builder.build(&input);

        assert_eq!(row.get_text("district").as_deref(), Some("Kadıköy"));
        assert_eq!(row.get_f64("gross_m2"), Some(120.0));
        assert_eq!(row.get_f64("room_count"), Some(4.0));
        assert_eq!(row.get_f64("log_area"), Some(120.0_f64.ln_1p()));
        assert_eq!(row.get_f64("area_per_room"), Some(24.0));
        assert_eq!(row.get_f64("room_bath_ratio"), Some(4.0 / (2.0 + 1e-3)));
        assert_eq!(row.get_text("age_bucket").as_deref(), Some("16-30"));
        assert_eq!(row.get_f64("te_district_mean"), Some(14.1));
        assert!(outcomes.iter().all(|o| matches!(o, DerivedOutcome::Applied { .. })));
    }

    #[test]
    fn test_blank_input_keeps_defaults() {
        let (defaults, cols, te) = builder_parts();
        let plan = DerivedFeaturePlan::resolve(&defaults, &cols);
        let builder = FeatureVectorBuilder::new(&defaults, &cols, &te, plan);

        let (row, outcomes) = builder.build(&ListingInput::default());
        assert_eq!(row.get_f64("gross_m2"), Some(95.0));
        assert_eq!(row.get_text("district").as_deref(), Some("Kadıköy"));
        // defaults are numeric, so derived features recompute from them
        assert_eq!(row.get_f64("area_per_room"), Some(95.0 / 4.0));
        assert_eq!(outcomes.len(), 4);
    }

    #[test]
    fn test_unparseable_input_keeps_default_and_row_still_builds() {
        let (defaults, cols, te) = builder_parts();
        let plan = DerivedFeaturePlan::resolve(&defaults, &cols);
        let builder = FeatureVectorBuilder::new(&defaults, &cols, &te, plan);

        let input = ListingInput {
            area: "bilmiyorum".to_string(),
            ..Default::default()
        };
        let (row, _) = builder.build(&input);
        assert_eq!(row.get_f64("gross_m2"), Some(95.0));
    }

    #[test]
    fn test_non_numeric_default_is_skipped_not_fatal() {
        let (mut defaults, cols, te) = builder_parts();
        defaults.insert("building_age".to_string(), json!("eski"));
        let plan = DerivedFeaturePlan::resolve(&defaults, &cols);
        let builder = FeatureVectorBuilder::new(&defaults, &cols, &te, plan);

        let (row, outcomes) = builder.build(&ListingInput::default());
        // age_bucket keeps its default because the recompute was skipped
        assert_eq!(row.get_text("age_bucket").as_deref(), Some("6-15"));
        let skip = outcomes
            .iter()
            .find(|o| o.feature() == "age_bucket")
            .unwrap();
        assert!(matches!(skip, DerivedOutcome::Skipped { .. }));
    }

    #[test]
    fn test_build_is_idempotent() {
        let (defaults, cols, te) = builder_parts();
        let plan = DerivedFeaturePlan::resolve(&defaults, &cols);
        let builder = FeatureVectorBuilder::new(&defaults, &cols, &te, plan);

        let input = ListingInput {
            district: "Kadıköy".to_string(),
            area: "100".to_string(),
            rooms: "3+1".to_string(),
            ..Default::default()
        };
        let (first, _) = builder.build(&input);
        let (second, _) = builder.build(&input);
        assert_eq!(first, second);
        // the shared default row was not mutated by either build
        assert_eq!(defaults.get("gross_m2"), Some(&json!(95.0)));
    }
}
