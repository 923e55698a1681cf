use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ttmatrix::{InputPaths, load_input, write_edges_csv, write_matrix_csv, write_points_geojson};
use ttmatrix_core::{create_multimodal_model, travel_time_matrix};

mod config;

use config::RunConfig;

/// Multimodal travel-time matrix between origin/destination points
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML run configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Only use the first N points
    #[arg(long)]
    limit: Option<usize>,

    /// Number of shortest-path worker threads
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("Run failed: {e}");
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let started = Instant::now();
    let mut run_config = RunConfig::load(&args.config)?;
    if args.limit.is_some() {
        run_config.model.point_limit = args.limit;
    }
    if args.workers.is_some() {
        run_config.model.workers = args.workers;
    }

    let input_config = &run_config.input;
    let [points_crs, network_crs, stations_crs] = input_config.crs_overrides()?;
    let paths = InputPaths {
        points: &input_config.points,
        network: &input_config.network,
        stations: input_config.stations.as_deref(),
        id_field: &input_config.id_field,
        points_crs,
        network_crs,
        stations_crs,
    };

    let (input, mut properties) = load_input(&paths)?;
    let model = create_multimodal_model(input, &run_config.model)?;
    properties.truncate(model.point_count());

    let matrix = travel_time_matrix(&model, &input_config.id_field, &run_config.model)?;
    let means = matrix.mean_travel_times();

    let output = &run_config.output;
    write_matrix_csv(&output.matrix, &matrix)?;
    if let Some(path) = &output.points {
        write_points_geojson(path, &model, &properties, &means)?;
    }
    if let Some(path) = &output.edges {
        write_edges_csv(path, &model.graph)?;
    }

    match summarize(&means) {
        Some((mean, min, max)) => {
            info!("Mean travel time: {mean:.2} min");
            info!("Min travel time: {min:.2} min");
            info!("Max travel time: {max:.2} min");
        }
        None => info!("No point reaches any other point"),
    }
    info!("Done in {:.1?}", started.elapsed());
    Ok(())
}

/// Mean, minimum and maximum of the defined per-point means
#[allow(clippy::cast_precision_loss)]
fn summarize(means: &[Option<f64>]) -> Option<(f64, f64, f64)> {
    let defined: Vec<f64> = means.iter().flatten().copied().collect();
    if defined.is_empty() {
        return None;
    }
    let min = defined.iter().copied().fold(f64::INFINITY, f64::min);
    let max = defined.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = defined.iter().sum::<f64>() / defined.len() as f64;
    Some((mean, min, max))
}
