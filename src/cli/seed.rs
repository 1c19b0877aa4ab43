//! Seed command handler
//!
//! Writes a fixture file: a ring of points around a center, or random points
//! in a lat/lng box.

use crate::cli::{parse_coords, parse_range};
use crate::config::Config;
use crate::coord::Coordinates;
use crate::error::Result;
use crate::store::seed::{self, SeedFile, RING_BEARINGS, RING_DISTANCES_KM};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Seed command arguments
#[derive(Args)]
pub struct SeedArgs {
    /// Fixture file to write
    pub output: PathBuf,

    /// Collection name recorded in the file
    #[arg(long, short = 'c')]
    pub collection: Option<String>,

    /// Field holding each point
    #[arg(long)]
    pub field: Option<String>,

    /// Ring center as "lat,lng"
    #[arg(long, value_parser = parse_coords, allow_hyphen_values = true, default_value = "40.5,-80")]
    pub center: Coordinates,

    /// Scatter N random points instead of a ring
    #[arg(long, value_name = "N")]
    pub random: Option<usize>,

    /// Latitude range for --random, "min,max"
    #[arg(long, value_parser = parse_range, allow_hyphen_values = true, default_value = "33,35")]
    pub lat_range: (f64, f64),

    /// Longitude range for --random, "min,max"
    #[arg(long, value_parser = parse_range, allow_hyphen_values = true, default_value = "-114,-112")]
    pub lng_range: (f64, f64),

    /// RNG seed for reproducible --random output
    #[arg(long)]
    pub rng_seed: Option<u64>,
}

/// Run the seed command
pub fn run(args: SeedArgs) -> Result<()> {
    let config = Config::load()?;
    let collection = args.collection.unwrap_or(config.query.collection);
    let field = args.field.unwrap_or(config.query.field);

    let documents = match args.random {
        Some(count) => {
            let mut rng = match args.rng_seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            seed::random_box(&mut rng, &field, count, args.lat_range, args.lng_range)?
        }
        None => seed::ring(args.center, &field, &RING_DISTANCES_KM, &RING_BEARINGS),
    };

    let count = documents.len();
    SeedFile {
        collection,
        field,
        documents,
    }
    .save(&args.output)?;

    eprintln!("Wrote {} documents to {}", count, args.output.display());
    Ok(())
}
