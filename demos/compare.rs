use std::process::ExitCode;

use anyhow::{Context, Result};
use bpm::{load_manifest, Comparator, Field};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// First manifest
    #[clap(required = true)]
    left: String,
    /// Second manifest
    #[clap(required = true)]
    right: String,
    /// Skip comparing the manifest names
    #[clap(long)]
    ignore_name: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();
    let args = Args::parse();

    let left = load_manifest(&args.left).with_context(|| format!("decoding {}", args.left))?;
    let right = load_manifest(&args.right).with_context(|| format!("decoding {}", args.right))?;

    let mut comparator = Comparator::new();
    if args.ignore_name {
        comparator = comparator.ignore(Field::ManifestName);
    }
    let report = comparator.compare(&left, &right);

    if report.is_identical() {
        return Ok(ExitCode::SUCCESS);
    }
    for mismatch in report.mismatches() {
        error!("{mismatch}");
    }
    Ok(ExitCode::FAILURE)
}
