//! Distance command handler

use crate::cli::parse_coords;
use crate::coord::{spherical, Coordinates};
use crate::error::Result;
use clap::Args;

/// Distance command arguments
#[derive(Args)]
pub struct DistanceArgs {
    /// Start as "lat,lng"
    #[arg(value_parser = parse_coords, allow_hyphen_values = true)]
    pub from: Coordinates,

    /// End as "lat,lng"
    #[arg(value_parser = parse_coords, allow_hyphen_values = true)]
    pub to: Coordinates,
}

/// Run the distance command
pub fn run(args: DistanceArgs) -> Result<()> {
    println!("Distance: {:.6} km", spherical::distance(args.from, args.to));
    println!("Bearing: {:.4}°", spherical::bearing(args.from, args.to));
    Ok(())
}
