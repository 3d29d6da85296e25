//! One-shot subcommand handlers and report rendering.

use firsat_core::{FirsatError, OpportunityDetector, PredictionReport, Submission};

/// Evaluate a single submission and print the verdict (or the error).
pub fn predict(
    detector: &OpportunityDetector,
    submission: &Submission,
    as_json: bool,
) -> anyhow::Result<()> {
    match detector.evaluate(submission) {
        Ok(report) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(err @ FirsatError::Validation { .. }) => {
            eprintln!("✗ {err}");
            std::process::exit(2);
        }
        Err(err) => Err(anyhow::anyhow!("{err}")),
    }
}

/// Render a report the way the form does.
pub fn print_report(report: &PredictionReport) {
    if report.extrapolation_warning {
        println!(
            "⚠ listing price is above the training price range; the estimate extrapolates"
        );
    }
    println!("💰 Fair value: {} TL", format_tl(report.fair_value));
    println!("📌 Listing:    {} TL", format_tl(report.listing_price));
    println!("📣 Verdict:    {}", report.verdict);
    println!(
        "   Delta: {:+.2}% (threshold ±{:.2}%)",
        report.delta_pct, report.threshold_pct
    );
}

/// Print a summary of the loaded bundle.
pub fn inspect(detector: &OpportunityDetector) {
    let bundle = detector.bundle();
    println!("Model bundle");
    println!("  scorer:            {}", bundle.scorer.kind());
    println!("  features:          {}", bundle.expected_features.len());
    println!("  threshold:         ±{:.2}%", bundle.threshold_pct);
    println!(
        "  training price up to: {} TL",
        format_tl(bundle.max_training_price)
    );
    println!("  role mappings:");
    for (role, col) in &bundle.ui_cols {
        println!("    {role} -> {col}");
    }
    println!("  districts:         {}", detector.district_options().len());
    if detector.uses_neighborhood() {
        println!(
            "  neighborhoods:     {}",
            detector.neighborhood_options().len()
        );
    }
}

/// Group an amount into dot-separated thousands, the local convention.
pub fn format_tl(amount: f64) -> String {
    let negative = amount < 0.0;
    let rounded = amount.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}
