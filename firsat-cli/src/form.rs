//! Interactive form mode.
//!
//! Walks through the listing fields on stdin, with pick lists for the
//! categorical fields driven by the bundle's known categories. Validation
//! failures re-prompt instead of exiting.

use crate::commands::print_report;
use firsat_core::{FirsatError, ListingInput, OpportunityDetector, Submission};
use std::io::{self, BufRead, Write};

pub fn run(detector: &OpportunityDetector) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("🏠 Fırsat — listing evaluation");
    println!("   Decision threshold: ±{:.2}%", detector.threshold_pct());

    loop {
        let Some(district) = pick_category(
            "District",
            &detector.district_options(),
            false,
            &mut lines,
        )?
        else {
            break;
        };

        let neighborhood = if detector.uses_neighborhood() {
            match pick_category(
                "Neighborhood (optional)",
                &detector.neighborhood_options(),
                true,
                &mut lines,
            )? {
                Some(value) => value,
                None => break,
            }
        } else {
            String::new()
        };

        let Some(area) = prompt("Area m²", &mut lines)? else { break };
        let Some(rooms) = prompt("Rooms (e.g. 3+1)", &mut lines)? else { break };
        let Some(baths) = prompt("Bathrooms", &mut lines)? else { break };
        let Some(age) = prompt("Building age", &mut lines)? else { break };
        let Some(price) = prompt("Listing price (TL)", &mut lines)? else { break };

        let submission = Submission {
            listing: ListingInput {
                district,
                neighborhood,
                area,
                rooms,
                baths,
                age,
            },
            listing_price: price,
        };

        match detector.evaluate(&submission) {
            Ok(report) => {
                println!();
                print_report(&report);
            }
            Err(err @ FirsatError::Validation { .. }) => {
                println!("✗ {err}");
                println!("  Let's try again.");
                continue;
            }
            Err(err) => return Err(anyhow::anyhow!("{err}")),
        }

        let Some(again) = prompt("Evaluate another listing? [y/N]", &mut lines)? else {
            break;
        };
        if !matches!(again.trim().to_lowercase().as_str(), "y" | "yes" | "e" | "evet") {
            break;
        }
        println!();
    }

    Ok(())
}

/// Read one trimmed line; `None` means stdin closed.
fn prompt(
    label: &str,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> anyhow::Result<Option<String>> {
    print!("{label}: ");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

/// Numbered pick list over the bundle's known categories. Free text is
/// always accepted; `allow_manual` adds an explicit manual-entry option and
/// permits leaving the field empty.
fn pick_category(
    label: &str,
    options: &[String],
    allow_manual: bool,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> anyhow::Result<Option<String>> {
    if options.is_empty() {
        return prompt(label, lines);
    }

    println!("{label}:");
    for (i, option) in options.iter().enumerate() {
        println!("  {:>3}) {option}", i + 1);
    }
    if allow_manual {
        println!("    m) other (type it in)");
    }

    let Some(answer) = prompt("Choice (number or name)", lines)? else {
        return Ok(None);
    };

    if allow_manual && answer.eq_ignore_ascii_case("m") {
        return prompt("Type the name", lines);
    }
    if let Ok(index) = answer.parse::<usize>()
        && (1..=options.len()).contains(&index)
    {
        return Ok(Some(options[index - 1].clone()));
    }
    Ok(Some(answer))
}
