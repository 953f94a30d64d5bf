use anyhow::{Context, Result};
use clap::Parser;
use hubway_timelapse::config::{DEFAULT_DECAY_RATE, DEFAULT_FRAME_SECONDS, DEFAULT_RESET_DAYS};
use hubway_timelapse::loader::{load_registry, load_trips};
use hubway_timelapse::telemetry::{init_tracing, progress_bar};
use hubway_timelapse::{FrameFormat, FrameWriter, Timelapse, TimelapseConfig};
use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// Hubway data challenge: time lapse data generator.
#[derive(Parser, Debug)]
#[command(name = "generateTimelapse", version)]
struct Args {
    /// Hubway stations file (csv).
    #[arg(short, long, env = "HUBWAY_STATIONS", default_value = "./data/stations.csv")]
    stations: PathBuf,

    /// Hubway trips file (csv).
    #[arg(short, long, env = "HUBWAY_TRIPS", default_value = "./data/trips.csv")]
    trips: PathBuf,

    /// Where the frames are written, one line per frame.
    #[arg(short, long, env = "HUBWAY_OUTPUT", default_value = "./results/timelapse.txt")]
    output: PathBuf,

    /// Number of seconds per frame.
    #[arg(short, long, env = "HUBWAY_FRAMERATE", default_value_t = DEFAULT_FRAME_SECONDS)]
    framerate: f64,

    /// Number of days after which all stations are restocked.
    #[arg(short, long, env = "HUBWAY_RESET", default_value_t = DEFAULT_RESET_DAYS)]
    reset: f64,

    /// Station trend decay rate, applied once per frame.
    #[arg(short, long, env = "HUBWAY_DECAY", default_value_t = DEFAULT_DECAY_RATE)]
    decay: f64,

    /// Also write each station's id inside its entry.
    #[arg(long, env = "HUBWAY_WITH_IDS")]
    with_ids: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = TimelapseConfig::from_units(args.framerate, args.reset, args.decay)
        .context("invalid timelapse settings")?;

    let registry = load_registry(&args.stations)
        .with_context(|| format!("loading stations from {}", args.stations.display()))?;
    let trips = load_trips(&args.trips)
        .with_context(|| format!("loading trips from {}", args.trips.display()))?;

    // Ensure output directory exists
    if let Some(parent) = args.output.parent() {
        create_dir_all(parent)?;
    }
    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let format = if args.with_ids {
        FrameFormat::WithStationId
    } else {
        FrameFormat::Compact
    };
    let mut writer = FrameWriter::new(BufWriter::new(file), format);

    let mut engine = Timelapse::new(&registry, config);
    let pb = progress_bar(trips.records.len() as u64, "Generating frames...");
    for trip in pb.wrap_iter(trips.records.iter()) {
        engine.push(trip, &mut writer)?;
    }
    pb.finish_with_message("Timelapse complete.");

    let lines = writer.lines_written();
    writer.finish()?;
    let summary = engine.summary();
    info!(
        stations = registry.len(),
        trips = summary.trips,
        skipped_rows = trips.rejected,
        skipped_by_reason = ?trips.by_reason,
        frames = lines,
        restocks = summary.restocks,
        output = %args.output.display(),
        "timelapse written"
    );
    Ok(())
}
