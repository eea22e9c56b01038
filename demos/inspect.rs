use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::Result;
use bpm::{AssayType, Reader};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// Manifest path (reads stdin if omitted, may be compressed)
    path: Option<String>,
    /// Print one line per probe
    #[clap(long)]
    probes: bool,
    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .init();

    let start = Instant::now();
    let reader = Reader::from_optional_path(args.path.as_deref())?;
    let elapsed = start.elapsed();
    let manifest = reader.manifest();
    let header = manifest.header();

    println!("Manifest: {}", header.manifest_name);
    println!(
        "Versions: container {}, inner {}{}",
        header.container_version,
        header.inner_version,
        if header.version_flag { " (flagged)" } else { "" }
    );
    println!("Probes: {}", manifest.probe_count());

    let mut by_assay: BTreeMap<AssayType, usize> = BTreeMap::new();
    let mut by_version: BTreeMap<i32, usize> = BTreeMap::new();
    for probe in manifest {
        *by_assay.entry(probe.assay_type).or_default() += 1;
        *by_version.entry(probe.record_version).or_default() += 1;
    }
    for (assay, count) in &by_assay {
        println!("  {:?}: {}", assay, count);
    }
    for (version, count) in &by_version {
        println!("  record version {}: {}", version, count);
    }
    println!(
        "Normalization groups: {}",
        manifest.unique_normalization_ids().len()
    );

    if args.probes {
        for probe in manifest {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                probe.index,
                probe.name,
                probe.chromosome,
                probe.map_info,
                probe.assay_type.code(),
                probe.normalization_id
            );
        }
    }

    eprintln!(
        "Decoded {} bytes in {:?}",
        reader.bytes_read(),
        elapsed
    );
    Ok(())
}
