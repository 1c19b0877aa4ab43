//! Geohash command handlers
//!
//! `encode`, `decode` and `neighbors`, in string or integer form.

use crate::error::{Error, Result};
use crate::geohash::{self, int, Direction, Ordinate, Precision};
use clap::Args;
use serde_json::json;

/// Encode command arguments
#[derive(Args)]
pub struct EncodeArgs {
    /// Latitude, as written (decimal digits drive --auto)
    #[arg(allow_hyphen_values = true)]
    pub lat: String,

    /// Longitude, as written
    #[arg(allow_hyphen_values = true)]
    pub lng: String,

    /// Hash length in characters
    #[arg(long, short = 'p', conflicts_with_all = ["auto", "bits"])]
    pub precision: Option<usize>,

    /// Pick the length from the number of decimal digits given
    #[arg(long)]
    pub auto: bool,

    /// Encode as an integer with this many bits (even, at most 64)
    #[arg(long, conflicts_with = "auto", num_args = 0..=1, default_missing_value = "52")]
    pub bits: Option<u32>,
}

/// Decode command arguments
#[derive(Args)]
pub struct DecodeArgs {
    /// Geohash (or integer hash with --bits)
    pub hash: String,

    /// Treat the hash as an integer with this many bits
    #[arg(long, num_args = 0..=1, default_missing_value = "52")]
    pub bits: Option<u32>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Neighbors command arguments
#[derive(Args)]
pub struct NeighborsArgs {
    /// Geohash (or integer hash with --bits)
    pub hash: String,

    /// Only the neighbor in this direction (n, ne, e, ...)
    #[arg(long, short = 'd')]
    pub direction: Option<Direction>,

    /// Treat the hash as an integer with this many bits
    #[arg(long, num_args = 0..=1, default_missing_value = "52")]
    pub bits: Option<u32>,
}

fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("Not a decimal number: {:?}", s)))
}

fn parse_int_hash(hash: &str) -> Result<u64> {
    hash.parse()
        .map_err(|_| Error::InvalidArgument(format!("Not an integer hash: {:?}", hash)))
}

/// Run the encode command
pub fn run_encode(args: EncodeArgs) -> Result<()> {
    if let Some(bits) = args.bits {
        let hash = int::encode_int(parse_number(&args.lat)?, parse_number(&args.lng)?, bits)?;
        println!("{}", hash);
        return Ok(());
    }

    let precision = if args.auto {
        Precision::Auto
    } else {
        args.precision.map(Precision::Chars).unwrap_or_default()
    };
    let hash = geohash::encode_with(
        Ordinate::Decimal(&args.lat),
        Ordinate::Decimal(&args.lng),
        precision,
    )?;
    println!("{}", hash);
    Ok(())
}

/// Run the decode command
pub fn run_decode(args: DecodeArgs) -> Result<()> {
    let (decoded, bbox) = match args.bits {
        Some(bits) => {
            let hash = parse_int_hash(&args.hash)?;
            (int::decode_int(hash, bits)?, int::decode_bbox_int(hash, bits)?)
        }
        None => (geohash::decode(&args.hash)?, geohash::decode_bbox(&args.hash)?),
    };

    if args.json {
        let value = json!({
            "hash": args.hash,
            "latitude": decoded.latitude,
            "longitude": decoded.longitude,
            "error": { "latitude": decoded.lat_error, "longitude": decoded.lng_error },
            "bbox": [bbox.min_lat, bbox.min_lng, bbox.max_lat, bbox.max_lng],
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Hash: {}", args.hash);
    println!(
        "Center: ({}, {}) ± ({}, {})",
        decoded.latitude, decoded.longitude, decoded.lat_error, decoded.lng_error
    );
    println!(
        "Bounds: lat [{}, {}], lng [{}, {}]",
        bbox.min_lat, bbox.max_lat, bbox.min_lng, bbox.max_lng
    );
    Ok(())
}

/// Run the neighbors command
pub fn run_neighbors(args: NeighborsArgs) -> Result<()> {
    let directions: Vec<Direction> = match args.direction {
        Some(direction) => vec![direction],
        None => Direction::CLOCKWISE.to_vec(),
    };

    for direction in directions {
        let neighbor = match args.bits {
            Some(bits) => int::neighbor_int(parse_int_hash(&args.hash)?, direction, bits)?.to_string(),
            None => geohash::neighbor(&args.hash, direction)?,
        };
        println!("{:<2} {}", direction, neighbor);
    }
    Ok(())
}
