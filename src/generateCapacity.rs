use anyhow::{Context, Result};
use clap::Parser;
use hubway_timelapse::analysis::{peak_capacity, write_capacity_report};
use hubway_timelapse::config::days;
use hubway_timelapse::loader::{load_registry, load_trips};
use hubway_timelapse::telemetry::init_tracing;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Hubway data challenge: station capacity analysis.
#[derive(Parser, Debug)]
#[command(name = "generateCapacity", version)]
struct Args {
    /// Hubway stations file (csv).
    #[arg(short, long, env = "HUBWAY_STATIONS")]
    stations: PathBuf,

    /// Hubway trips file (csv).
    #[arg(short, long, env = "HUBWAY_TRIPS")]
    trips: PathBuf,

    /// Station capacity analysis output.
    #[arg(short, long, env = "HUBWAY_OUTPUT")]
    output: PathBuf,

    /// Reset period in days.
    #[arg(short, long, env = "HUBWAY_RESET", default_value_t = 1.0)]
    reset: f64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let reset_period = days(args.reset).context("invalid reset period")?;

    let registry = load_registry(&args.stations)
        .with_context(|| format!("loading stations from {}", args.stations.display()))?;
    let trips = load_trips(&args.trips)
        .with_context(|| format!("loading trips from {}", args.trips.display()))?;

    let capacity = peak_capacity(&trips.records, &registry, reset_period);

    if let Some(parent) = args.output.parent() {
        create_dir_all(parent)?;
    }
    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut file = BufWriter::new(file);
    write_capacity_report(&mut file, &capacity, &registry)
        .with_context(|| format!("writing {}", args.output.display()))?;
    file.flush()?;

    println!("Capacity for {} stations saved in '{}'.", capacity.len(), args.output.display());
    Ok(())
}
