//! CLI entry point for the metro feeder analysis.
//!
//! Provides subcommands for listing the station table, linking stations to
//! bus lines through the routing API, and locating taxi pickup/dropoff zones
//! from GPS trajectories.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metro_feeder::{
    bus::run_bus_pipeline,
    config::Settings,
    output::{
        ConnectivityCsvRow, DirectTripCsvRow, print_json, print_pretty, write_csv, write_json,
    },
    routing::{AmapClient, AmapConfig},
    stations::StationSet,
    taxi::run_taxi_pipeline,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "metro_feeder")]
#[command(about = "Links metro stations to nearby bus stops and taxi pickup zones", long_about = None)]
struct Cli {
    /// JSON settings file overriding radii, clustering and request parameters
    #[arg(long, global = true)]
    config: Option<String>,

    /// CSV station table (name,longitude,latitude); defaults to the built-in Xi'an set
    #[arg(long, global = true)]
    stations: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the station reference table
    Stations,
    /// Query the routing API for every station pair and build bus connectivity tables
    Bus {
        /// Amap city code used for both ends of each query
        #[arg(long, default_value = "029")]
        city_code: String,

        /// Override the routing endpoint
        #[arg(long)]
        base_url: Option<String>,

        /// Directory to write CSV and JSON outputs to
        #[arg(short, long, default_value = "output")]
        output_dir: String,
    },
    /// Detect taxi pickups/dropoffs and cluster them around each station
    Taxi {
        /// GPS trajectory CSV (optionally .gz)
        #[arg(value_name = "FILE")]
        input: String,

        /// Directory to write CSV and JSON outputs to
        #[arg(short, long, default_value = "output")]
        output_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/metro_feeder.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("metro_feeder.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let stations = StationSet::load_or_default(cli.stations.as_deref())?;
    info!(stations = stations.len(), "Station table loaded");
    print_pretty(&settings);

    match cli.command {
        Commands::Stations => {
            for station in stations.iter() {
                info!(
                    station = %station.name,
                    lon = station.lon,
                    lat = station.lat,
                    "Station"
                );
            }
        }
        Commands::Bus {
            city_code,
            base_url,
            output_dir,
        } => {
            let api_key = std::env::var("AMAP_API_KEY").context("AMAP_API_KEY must be set")?;

            let mut amap = AmapConfig::new(&api_key, &city_code, settings.request_timeout());
            if let Some(base_url) = base_url {
                amap.base_url = base_url;
            }
            let client = AmapClient::new(amap)?;

            let report = run_bus_pipeline(&client, &stations, &settings).await?;

            let out = Path::new(&output_dir);
            std::fs::create_dir_all(out)?;

            let connectivity: Vec<_> = report
                .connectivity
                .iter()
                .map(ConnectivityCsvRow::from)
                .collect();
            let direct: Vec<_> = report
                .direct_trips
                .iter()
                .map(DirectTripCsvRow::from)
                .collect();

            write_csv(&out.join("metro_connectivity.csv"), &connectivity)?;
            write_csv(&out.join("direct_trips.csv"), &direct)?;
            write_json(&out.join("bus_report.json"), &report)?;

            print_json(&report.stations)?;
            info!(
                output_dir = %output_dir,
                connectivity_rows = connectivity.len(),
                direct_trip_rows = direct.len(),
                "Bus analysis written"
            );
        }
        Commands::Taxi { input, output_dir } => {
            let report = run_taxi_pipeline(&input, &stations, &settings)?;

            let out = Path::new(&output_dir);
            std::fs::create_dir_all(out)?;

            write_csv(&out.join("taxi_summary.csv"), &report.plot_rows())?;
            write_csv(&out.join("pickup_centers.csv"), &report.pickup_centers)?;
            write_csv(&out.join("dropoff_centers.csv"), &report.dropoff_centers)?;
            write_json(&out.join("taxi_report.json"), &report)?;

            for summary in &report.summaries {
                info!(
                    station = %summary.station,
                    pickups = summary.pickups,
                    dropoffs = summary.dropoffs,
                    pickup_clusters = summary.pickup_clusters,
                    dropoff_clusters = summary.dropoff_clusters,
                    "Station summary"
                );
            }
            info!(
                output_dir = %output_dir,
                pickup_centers = report.pickup_centers.len(),
                dropoff_centers = report.dropoff_centers.len(),
                "Taxi analysis written"
            );
        }
    }

    Ok(())
}
