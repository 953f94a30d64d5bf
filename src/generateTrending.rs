use anyhow::{Context, Result};
use clap::Parser;
use hubway_timelapse::analysis::{peak_trending, ranked};
use hubway_timelapse::loader::{load_registry, load_trips};
use hubway_timelapse::telemetry::init_tracing;
use std::path::PathBuf;

/// Peak trending score per station, highest first.
#[derive(Parser, Debug)]
#[command(name = "generateTrending", version)]
struct Args {
    /// Hubway stations file (csv), used for display names.
    #[arg(short, long, env = "HUBWAY_STATIONS")]
    stations: PathBuf,

    /// Hubway trips file (csv).
    #[arg(short, long, env = "HUBWAY_TRIPS")]
    trips: PathBuf,

    /// Factor applied to every score before each trip.
    #[arg(short, long, env = "HUBWAY_REDUCTION", default_value_t = 1.0)]
    reduction: f64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    if !args.reduction.is_finite() || !(0.0..=1.0).contains(&args.reduction) {
        anyhow::bail!("reduction must lie within [0, 1] (got {})", args.reduction);
    }

    let registry = load_registry(&args.stations)
        .with_context(|| format!("loading stations from {}", args.stations.display()))?;
    let trips = load_trips(&args.trips)
        .with_context(|| format!("loading trips from {}", args.trips.display()))?;

    let scores = peak_trending(&trips.records, args.reduction);
    for (station, score) in ranked(&scores) {
        println!("{} {}", registry.name_or_id(station), score);
    }
    Ok(())
}
