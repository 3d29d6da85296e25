//! Fırsat CLI — terminal interface for the real-estate opportunity detector.
//!
//! Provides one-shot prediction, an interactive form, and bundle inspection.

mod commands;
mod form;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Fırsat: is this listing a bargain, overpriced, or fair?
#[derive(Parser, Debug)]
#[command(name = "firsat", version, about, long_about = None)]
struct Cli {
    /// Model bundle path (overrides configuration)
    #[arg(short, long)]
    bundle: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Evaluate a single listing from flags
    Predict {
        /// District (required by the model)
        #[arg(long, default_value = "")]
        district: String,
        /// Neighborhood (optional, models may ignore it)
        #[arg(long, default_value = "")]
        neighborhood: String,
        /// Area in m² (free text, e.g. "95" or "95 m²")
        #[arg(long, default_value = "")]
        area: String,
        /// Room count (e.g. "3+1", "studio", "2")
        #[arg(long, default_value = "")]
        rooms: String,
        /// Bathroom count
        #[arg(long, default_value = "")]
        baths: String,
        /// Building age in years
        #[arg(long, default_value = "")]
        age: String,
        /// Asking price in TL (e.g. "1.250.000")
        #[arg(long)]
        price: String,
        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fill the form interactively
    Form,
    /// Show what the loaded bundle contains
    Inspect,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "firsat", "firsat")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "firsat.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = std::env::current_dir().ok();
    let config = firsat_core::load_config(workspace.as_deref())
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    let bundle_path = cli.bundle.unwrap_or(config.bundle_path);

    tracing::debug!(bundle = %bundle_path.display(), "loading model bundle");
    let detector = firsat_core::OpportunityDetector::from_path(&bundle_path)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    match cli.command {
        Commands::Predict {
            district,
            neighborhood,
            area,
            rooms,
            baths,
            age,
            price,
            json,
        } => {
            let submission = firsat_core::Submission {
                listing: firsat_core::ListingInput {
                    district,
                    neighborhood,
                    area,
                    rooms,
                    baths,
                    age,
                },
                listing_price: price,
            };
            commands::predict(&detector, &submission, json)
        }
        Commands::Form => form::run(&detector),
        Commands::Inspect => {
            commands::inspect(&detector);
            Ok(())
        }
    }
}
