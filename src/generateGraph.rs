use anyhow::{anyhow, Context, Result};
use clap::Parser;
use hubway_timelapse::loader::load_registry;
use hubway_timelapse::telemetry::{init_tracing, progress_bar};
use hubway_timelapse::{FrameLine, StationId, StationRegistry};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Charts the trend signal of the busiest stations from a timelapse file.
#[derive(Parser, Debug)]
#[command(name = "generateGraph", version)]
struct Args {
    /// Frames written by generateTimelapse.
    #[arg(short, long, env = "HUBWAY_FRAMES", default_value = "./results/timelapse.txt")]
    frames: PathBuf,

    /// Hubway stations file (csv), used for legend names.
    #[arg(short, long, env = "HUBWAY_STATIONS", default_value = "./data/stations.csv")]
    stations: PathBuf,

    /// Output image.
    #[arg(short, long, default_value = "trend_chart.png")]
    output: PathBuf,

    /// Number of stations to draw.
    #[arg(short, long, default_value_t = 8)]
    top: usize,
}

/// Trend per station over time, x in hours since the first frame.
type TrendSeries = BTreeMap<StationId, Vec<(f64, f64)>>;

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let registry = load_registry(&args.stations)
        .with_context(|| format!("loading stations from {}", args.stations.display()))?;

    // Count lines first so the progress bar has a length.
    let total_lines = {
        let file = File::open(&args.frames)
            .with_context(|| format!("opening {}", args.frames.display()))?;
        BufReader::new(file).lines().count()
    };
    let pb = progress_bar(total_lines as u64, "Reading frames...");

    let file = File::open(&args.frames)
        .with_context(|| format!("opening {}", args.frames.display()))?;
    let mut series: TrendSeries = BTreeMap::new();
    let mut origin_millis = None;
    for (index, line) in pb.wrap_iter(BufReader::new(file).lines().enumerate()) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let snapshot = FrameLine::parse(&line).with_context(|| format!("frame on line {}", index + 1))?;
        let millis = snapshot.epoch_millis();
        let origin = *origin_millis.get_or_insert(millis);
        let hours = (millis - origin) as f64 / 3_600_000.0;
        for (id, state) in snapshot.stations {
            series.entry(id).or_default().push((hours, state.trend));
        }
    }
    pb.finish_with_message("Frames loaded.");

    let busiest = busiest_stations(&series, args.top);
    if busiest.is_empty() {
        println!("No frames in '{}', nothing to draw.", args.frames.display());
        return Ok(());
    }
    generate_trend_chart(&args.output, "Station Trend Over Time", &busiest, &registry)
        .map_err(|e| anyhow!("drawing {}: {}", args.output.display(), e))?;

    println!("\nChart saved in '{}'.", args.output.display());
    Ok(())
}

/// Keeps the `top` stations with the highest peak trend.
fn busiest_stations(series: &TrendSeries, top: usize) -> Vec<(StationId, &[(f64, f64)])> {
    let mut ranked: Vec<(StationId, &[(f64, f64)], f64)> = series
        .iter()
        .map(|(&id, points)| {
            let peak = points.iter().map(|&(_, trend)| trend).fold(0.0, f64::max);
            (id, points.as_slice(), peak)
        })
        .collect();
    ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(top).map(|(id, points, _)| (id, points)).collect()
}

/// Returns a palette of distinct colors.
fn get_color_palette() -> Vec<RGBColor> {
    vec![
        RGBColor(255, 0, 0),       // red
        RGBColor(0, 0, 255),       // blue
        RGBColor(0, 128, 0),       // green
        RGBColor(255, 165, 0),     // orange
        RGBColor(128, 0, 128),     // purple
        RGBColor(0, 128, 128),     // teal
        RGBColor(255, 192, 203),   // pink
        RGBColor(128, 128, 0),     // olive
        RGBColor(0, 0, 0),         // black
        RGBColor(165, 42, 42),     // brown
    ]
}

/// Generates a line chart with one series per station.
fn generate_trend_chart(
    filename: &Path,
    caption: &str,
    data: &[(StationId, &[(f64, f64)])],
    registry: &StationRegistry,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(filename, (1600, 1200)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_x = data
        .iter()
        .flat_map(|(_, points)| points.iter().map(|&(x, _)| x))
        .fold(0.0, f64::max);
    let max_y = data
        .iter()
        .flat_map(|(_, points)| points.iter().map(|&(_, y)| y))
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 50))
        .margin(60)
        .set_label_area_size(LabelAreaPosition::Left, 100)
        .set_label_area_size(LabelAreaPosition::Bottom, 80)
        .build_cartesian_2d(0f64..max_x.max(1.0), 0f64..(max_y * 1.1).max(1.0))?;

    chart.configure_mesh()
        .x_desc("Hours since first frame")
        .y_desc("Trend")
        .label_style(("sans-serif", 30))
        .draw()?;

    let palette = get_color_palette();
    for (i, (station, points)) in data.iter().enumerate() {
        let color = palette[i % palette.len()];
        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(3)))?
            .label(registry.name_or_id(*station))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
    }

    // Place the legend at the upper right with a white background.
    chart.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 30))
        .draw()?;

    root.present()?;
    Ok(())
}
