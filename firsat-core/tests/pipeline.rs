//! End-to-end pipeline tests over a real bundle file.
//!
//! These exercise the full submission path — validation, row assembly,
//! scoring, verdict — against bundles written to disk, the way the CLI
//! consumes them.

use firsat_core::{FirsatError, ListingInput, OpportunityDetector, Submission, Verdict};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::Write;
use std::path::PathBuf;

fn bundle_json(scorer: Value) -> Value {
    json!({
        "scorer": scorer,
        "threshold_pct": 10.0,
        "expected_features": [
            "gross_m2", "room_count", "bath_count", "building_age",
            "log_area", "area_per_room", "room_bath_ratio", "age_bucket",
            "district", "te_district_mean", "te_district_med", "te_district_cnt"
        ],
        "default_row": {
            "gross_m2": 95.0,
            "room_count": 3.0,
            "bath_count": 1.0,
            "building_age": 10.0,
            "log_area": 4.564348191467836,
            "area_per_room": 23.75,
            "room_bath_ratio": 2.997002997002997,
            "age_bucket": "6-15",
            "district": "Kadıköy"
        },
        "ui_cols": {
            "district": "district",
            "area": "gross_m2",
            "rooms": "room_count",
            "baths": "bath_count",
            "age": "building_age"
        },
        "te_maps": {
            "district": {
                "col": "district",
                "maps": {
                    "mean": {"Kadıköy": 14.1, "Beşiktaş": 14.4},
                    "med": {"Kadıköy": 14.0, "Beşiktaş": 14.3},
                    "cnt": {"Kadıköy": 812.0, "Beşiktaş": 421.0},
                    "global_mean": 13.7,
                    "global_med": 13.6
                }
            }
        },
        "max_training_price": 2_500_000.0
    })
}

fn write_bundle(value: &Value) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_bundle.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{value}").unwrap();
    (dir, path)
}

fn detector_with_scorer(scorer: Value) -> (tempfile::TempDir, OpportunityDetector) {
    let (dir, path) = write_bundle(&bundle_json(scorer));
    let detector = OpportunityDetector::from_path(&path).unwrap();
    (dir, detector)
}

fn kadikoy_submission(price: &str) -> Submission {
    Submission {
        listing: ListingInput {
            district: "Kadıköy".to_string(),
            area: "100".to_string(),
            rooms: "3+1".to_string(),
            baths: "1".to_string(),
            age: "10".to_string(),
            ..Default::default()
        },
        listing_price: price.to_string(),
    }
}

#[test]
fn test_deterministic_fair_value_and_verdict() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));

    let report = detector.evaluate(&kadikoy_submission("1000000")).unwrap();
    assert_eq!(report.fair_value, 13.9_f64.exp_m1());
    assert_eq!(report.listing_price, 1_000_000.0);
    // expm1(13.9) ≈ 1,088,161 → about +8.8%, inside the ±10% band
    assert_eq!(report.verdict, Verdict::Normal);
    assert!(report.delta_pct > 8.0 && report.delta_pct < 10.0);
    assert!(!report.extrapolation_warning);
}

#[test]
fn test_firsat_and_pahali_verdicts() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));

    let firsat = detector.evaluate(&kadikoy_submission("900000")).unwrap();
    assert_eq!(firsat.verdict, Verdict::Firsat);
    assert!(firsat.delta_pct > 10.0);

    let pahali = detector.evaluate(&kadikoy_submission("1300000")).unwrap();
    assert_eq!(pahali.verdict, Verdict::Pahali);
    assert!(pahali.delta_pct < -10.0);
}

#[test]
fn test_locale_formatted_price_is_accepted() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));
    let report = detector
        .evaluate(&kadikoy_submission("1.000.000 TL"))
        .unwrap();
    assert_eq!(report.listing_price, 1_000_000.0);
}

#[test]
fn test_missing_district_is_a_validation_error() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));
    let mut submission = kadikoy_submission("1000000");
    submission.listing.district = "   ".to_string();

    let err = detector.evaluate(&submission).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        FirsatError::Validation { ref field, .. } if field == "district"
    ));
}

#[test]
fn test_bad_prices_are_validation_errors() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));
    for price in ["", "   ", "bedava", "0", "-250000"] {
        let err = detector.evaluate(&kadikoy_submission(price)).unwrap_err();
        assert!(err.is_validation(), "price {price:?} should fail validation");
    }
}

#[test]
fn test_extrapolation_warning_above_training_range() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));
    let report = detector.evaluate(&kadikoy_submission("9500000")).unwrap();
    assert!(report.extrapolation_warning);
    // the prediction itself still goes through
    assert_eq!(report.fair_value, 13.9_f64.exp_m1());
}

#[test]
fn test_unseen_district_takes_global_fallback_path() {
    // score on the count column: training districts have cnt >= 1,
    // an unseen district falls back to 0
    let scorer = json!({
        "type": "tree_ensemble",
        "base_score": 13.0,
        "trees": [{
            "nodes": [
                {"kind": "numeric_split", "feature": "te_district_cnt",
                 "threshold": 1.0, "left": 1, "right": 2},
                {"kind": "leaf", "value": 0.25},
                {"kind": "leaf", "value": 0.75}
            ]
        }]
    });
    let (_dir, detector) = detector_with_scorer(scorer);

    let mut seen = kadikoy_submission("1000000");
    seen.listing.district = "Kadıköy".to_string();
    let mut unseen = kadikoy_submission("1000000");
    unseen.listing.district = "Çekmeköy".to_string();

    let seen_report = detector.evaluate(&seen).unwrap();
    let unseen_report = detector.evaluate(&unseen).unwrap();
    assert_eq!(seen_report.fair_value, 13.75_f64.exp_m1());
    assert_eq!(unseen_report.fair_value, 13.25_f64.exp_m1());
}

#[test]
fn test_schema_gate_rejects_incomplete_bundle_rows() {
    // an expected feature that neither the default row nor target encoding
    // can produce must fail the request, not silently score
    let mut value = bundle_json(json!({"type": "constant", "value": 13.9}));
    value["expected_features"]
        .as_array_mut()
        .unwrap()
        .push(json!("heating_type"));
    let (_dir, path) = write_bundle(&value);
    let detector = OpportunityDetector::from_path(&path).unwrap();

    let err = detector.evaluate(&kadikoy_submission("1000000")).unwrap_err();
    assert!(matches!(err, FirsatError::Prediction(_)));
    assert!(err.to_string().contains("heating_type"));
}

#[test]
fn test_partial_input_still_yields_full_row() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));
    let submission = Submission {
        listing: ListingInput {
            district: "Beşiktaş".to_string(),
            ..Default::default()
        },
        listing_price: "1200000".to_string(),
    };
    // only district and price supplied; defaults cover the rest
    let report = detector.evaluate(&submission).unwrap();
    assert_eq!(report.derived.len(), 4);
}

#[test]
fn test_repeated_evaluations_are_identical() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));
    let submission = kadikoy_submission("1000000");

    let first = detector.evaluate(&submission).unwrap();
    let second = detector.evaluate(&submission).unwrap();
    assert_eq!(first.fair_value, second.fair_value);
    assert_eq!(first.delta_pct, second.delta_pct);
    assert_eq!(first.verdict, second.verdict);
    assert_eq!(first.derived, second.derived);
}

#[test]
fn test_detector_surface_reflects_bundle() {
    let (_dir, detector) = detector_with_scorer(json!({"type": "constant", "value": 13.9}));
    assert_eq!(detector.threshold_pct(), 10.0);
    assert_eq!(detector.district_options(), vec!["Beşiktaş", "Kadıköy"]);
    assert!(detector.neighborhood_options().is_empty());
    assert!(!detector.uses_neighborhood());
}
