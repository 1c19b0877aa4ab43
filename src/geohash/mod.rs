//! Geohash codec
//!
//! Encodes coordinates into base-32 geohash strings by alternately bisecting the
//! longitude and latitude ranges (longitude first), decodes hashes back into
//! bounding boxes, and finds the neighboring cells of a hash.
//!
//! Longitude is clamped at ±180 rather than wrapped, so neighbors of cells on the
//! antimeridian or at the poles repeat the edge cell instead of crossing over.

pub mod int;

use crate::constants::geohash::{BASE32, MAX_HASH_LENGTH, POINT_PRECISION, SIGFIG_HASH_LENGTH};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Rectangular region covered by a geohash
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// The whole-earth extents every hash starts from
    pub const WORLD: BoundingBox = BoundingBox {
        min_lat: -90.0,
        min_lng: -180.0,
        max_lat: 90.0,
        max_lng: 180.0,
    };

    /// Check whether a coordinate falls inside the box (edges inclusive)
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// Center of the box with the half-extents on each axis
    pub fn center(&self) -> Decoded {
        let latitude = (self.min_lat + self.max_lat) / 2.0;
        let longitude = (self.min_lng + self.max_lng) / 2.0;
        Decoded {
            latitude,
            longitude,
            lat_error: self.max_lat - latitude,
            lng_error: self.max_lng - longitude,
        }
    }

    /// Halve the longitude range, keeping the upper half when `bit` is set
    fn narrow_lng(&mut self, bit: bool) {
        let mid = (self.min_lng + self.max_lng) / 2.0;
        if bit {
            self.min_lng = mid;
        } else {
            self.max_lng = mid;
        }
    }

    /// Halve the latitude range, keeping the upper half when `bit` is set
    fn narrow_lat(&mut self, bit: bool) {
        let mid = (self.min_lat + self.max_lat) / 2.0;
        if bit {
            self.min_lat = mid;
        } else {
            self.max_lat = mid;
        }
    }
}

/// A decoded geohash: cell center plus the error margin on each axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoded {
    pub latitude: f64,
    pub longitude: f64,
    pub lat_error: f64,
    pub lng_error: f64,
}

/// One of the eight compass directions around a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    /// All directions, clockwise from north
    pub const CLOCKWISE: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Unit vector as `(d_lat, d_lng)`
    pub fn offsets(self) -> (f64, f64) {
        match self {
            Direction::N => (1.0, 0.0),
            Direction::NE => (1.0, 1.0),
            Direction::E => (0.0, 1.0),
            Direction::SE => (-1.0, 1.0),
            Direction::S => (-1.0, 0.0),
            Direction::SW => (-1.0, -1.0),
            Direction::W => (0.0, -1.0),
            Direction::NW => (1.0, -1.0),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::N => "n",
            Direction::NE => "ne",
            Direction::E => "e",
            Direction::SE => "se",
            Direction::S => "s",
            Direction::SW => "sw",
            Direction::W => "w",
            Direction::NW => "nw",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "n" | "north" => Ok(Self::N),
            "ne" | "northeast" => Ok(Self::NE),
            "e" | "east" => Ok(Self::E),
            "se" | "southeast" => Ok(Self::SE),
            "s" | "south" => Ok(Self::S),
            "sw" | "southwest" => Ok(Self::SW),
            "w" | "west" => Ok(Self::W),
            "nw" | "northwest" => Ok(Self::NW),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

/// Requested hash length for [`encode_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Fixed number of characters
    Chars(usize),
    /// Derive the length from the decimal digits of string inputs
    Auto,
}

impl Default for Precision {
    fn default() -> Self {
        Self::Chars(POINT_PRECISION)
    }
}

/// A latitude or longitude given either as a number or as decimal text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ordinate<'a> {
    Number(f64),
    Decimal(&'a str),
}

impl Ordinate<'_> {
    fn value(&self) -> Result<f64> {
        match self {
            Ordinate::Number(v) => Ok(*v),
            Ordinate::Decimal(s) => s.trim().parse().map_err(|_| {
                Error::InvalidArgument(format!("Not a decimal number: {:?}", s))
            }),
        }
    }
}

/// Encode a coordinate into a geohash of `length` characters
///
/// Each character carries 5 bits; even bits bisect longitude, odd bits latitude.
/// Out-of-range coordinates are not rejected and produce an edge cell. Lengths
/// above [`MAX_HASH_LENGTH`] are capped; use [`encode_with`] to reject them instead.
pub fn encode(lat: f64, lng: f64, length: usize) -> String {
    let length = length.min(MAX_HASH_LENGTH);
    let mut hash = String::new();
    let mut bbox = BoundingBox::WORLD;
    let mut value = 0usize;
    let mut bits = 0;
    let mut even = true;

    while hash.len() < length {
        let bit = if even {
            lng > (bbox.min_lng + bbox.max_lng) / 2.0
        } else {
            lat > (bbox.min_lat + bbox.max_lat) / 2.0
        };
        if even {
            bbox.narrow_lng(bit);
        } else {
            bbox.narrow_lat(bit);
        }
        value = (value << 1) | bit as usize;
        even = !even;
        bits += 1;

        if bits == 5 {
            hash.push(BASE32[value] as char);
            bits = 0;
            value = 0;
        }
    }

    hash
}

/// Encode with an explicit [`Precision`], accepting numeric or decimal-string input
///
/// `Precision::Auto` only works with decimal strings: the hash length is looked up
/// from the larger count of digits after the decimal point (capped at 10).
pub fn encode_with(lat: Ordinate<'_>, lng: Ordinate<'_>, precision: Precision) -> Result<String> {
    let length = match precision {
        Precision::Chars(n) if n > MAX_HASH_LENGTH => {
            return Err(Error::InvalidArgument(format!(
                "Geohash length {} exceeds the maximum of {}",
                n, MAX_HASH_LENGTH
            )))
        }
        Precision::Chars(n) => n,
        Precision::Auto => match (lat, lng) {
            (Ordinate::Decimal(lat_str), Ordinate::Decimal(lng_str)) => {
                let sig_figs = decimal_places(lat_str).max(decimal_places(lng_str));
                SIGFIG_HASH_LENGTH[sig_figs.min(SIGFIG_HASH_LENGTH.len() - 1)]
            }
            _ => {
                return Err(Error::InvalidArgument(
                    "string notation required for auto precision".to_string(),
                ))
            }
        },
    };

    Ok(encode(lat.value()?, lng.value()?, length))
}

fn decimal_places(s: &str) -> usize {
    s.trim()
        .split_once('.')
        .map(|(_, frac)| frac.chars().take_while(|c| c.is_ascii_digit()).count())
        .unwrap_or(0)
}

/// Map one geohash character to its 5-bit value (case-insensitive)
fn char_value(hash: &str, ch: char) -> Result<u8> {
    let lower = ch.to_ascii_lowercase();
    BASE32
        .iter()
        .position(|&b| b as char == lower)
        .map(|i| i as u8)
        .ok_or_else(|| Error::InvalidGeohash {
            hash: hash.to_string(),
            ch,
        })
}

/// Decode a geohash into the bounding box of its cell
pub fn decode_bbox(hash: &str) -> Result<BoundingBox> {
    let mut bbox = BoundingBox::WORLD;
    let mut is_lng = true;

    for ch in hash.chars() {
        let value = char_value(hash, ch)?;
        for shift in (0..5).rev() {
            let bit = (value >> shift) & 1 == 1;
            if is_lng {
                bbox.narrow_lng(bit);
            } else {
                bbox.narrow_lat(bit);
            }
            is_lng = !is_lng;
        }
    }

    Ok(bbox)
}

/// Decode a geohash into its cell center and error margins
pub fn decode(hash: &str) -> Result<Decoded> {
    Ok(decode_bbox(hash)?.center())
}

/// Find the adjacent cell of the same length in `direction`
pub fn neighbor(hash: &str, direction: Direction) -> Result<String> {
    let decoded = decode(hash)?;
    Ok(shift(&decoded, direction, hash.chars().count()))
}

/// All eight neighbors, clockwise from north
///
/// Callers should treat the result as an unordered set; at the poles and the
/// antimeridian entries may repeat or equal `hash` itself.
pub fn neighbors(hash: &str) -> Result<[String; 8]> {
    let decoded = decode(hash)?;
    let length = hash.chars().count();
    Ok(Direction::CLOCKWISE.map(|d| shift(&decoded, d, length)))
}

/// Move a decoded cell one full cell width/height and re-encode
fn shift(decoded: &Decoded, direction: Direction, length: usize) -> String {
    let (d_lat, d_lng) = direction.offsets();
    encode(
        decoded.latitude + d_lat * decoded.lat_error * 2.0,
        decoded.longitude + d_lng * decoded.lng_error * 2.0,
        length,
    )
}
