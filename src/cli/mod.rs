//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod distance;
pub mod geohash;
pub mod seed;
pub mod serve;
pub mod status;
pub mod within;

use crate::coord::Coordinates;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Live geohash radius queries
#[derive(Parser)]
#[command(name = "geoquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode a coordinate as a geohash
    Encode(geohash::EncodeArgs),

    /// Decode a geohash to its cell center and bounds
    Decode(geohash::DecodeArgs),

    /// List the cells around a geohash
    Neighbors(geohash::NeighborsArgs),

    /// Distance and bearing between two coordinates
    Distance(distance::DistanceArgs),

    /// Write a fixture file of tagged points
    Seed(seed::SeedArgs),

    /// Run a radius query over a fixture file
    Within(within::WithinArgs),

    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Show server status
    Status(status::StatusArgs),
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(args) => geohash::run_encode(args),
        Commands::Decode(args) => geohash::run_decode(args),
        Commands::Neighbors(args) => geohash::run_neighbors(args),
        Commands::Distance(args) => distance::run(args),
        Commands::Seed(args) => seed::run(args),
        Commands::Within(args) => within::run(args).await,
        Commands::Serve(args) => serve::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Status(args) => status::run(args).await,
    }
}

/// Install the log subscriber on stderr; `RUST_LOG` overrides `default_filter`
pub(crate) fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse `"lat,lng"` into validated coordinates
pub(crate) fn parse_coords(s: &str) -> std::result::Result<Coordinates, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("Expected \"lat,lng\", got {:?}", s))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("Invalid latitude: {:?}", lat))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("Invalid longitude: {:?}", lng))?;
    let coords = Coordinates::new(lat, lng);
    coords.validate().map_err(|e| e.to_string())?;
    Ok(coords)
}

/// Parse `"min,max"` into an ordered pair
pub(crate) fn parse_range(s: &str) -> std::result::Result<(f64, f64), String> {
    let (min, max) = s
        .split_once(',')
        .ok_or_else(|| format!("Expected \"min,max\", got {:?}", s))?;
    let min: f64 = min.trim().parse().map_err(|_| format!("Invalid number: {:?}", min))?;
    let max: f64 = max.trim().parse().map_err(|_| format!("Invalid number: {:?}", max))?;
    if min >= max {
        return Err(format!("Range {:?} is empty", s));
    }
    Ok((min, max))
}
