//! Integer geohashes
//!
//! Same interleaving as the string codec, packed into a `u64` of `bit_depth`
//! bits with the first (longitude) bit most significant.

use super::{BoundingBox, Decoded, Direction};
use crate::error::{Error, Result};

fn check_depth(bit_depth: u32) -> Result<()> {
    if bit_depth == 0 || bit_depth > 64 || bit_depth % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "bit depth must be an even number in 2..=64, got {}",
            bit_depth
        )));
    }
    Ok(())
}

/// Encode a coordinate into an integer geohash of `bit_depth` bits
pub fn encode_int(lat: f64, lng: f64, bit_depth: u32) -> Result<u64> {
    check_depth(bit_depth)?;

    let mut bbox = BoundingBox::WORLD;
    let mut combined = 0u64;

    for i in 0..bit_depth {
        let bit = if i % 2 == 0 {
            let bit = lng > (bbox.min_lng + bbox.max_lng) / 2.0;
            bbox.narrow_lng(bit);
            bit
        } else {
            let bit = lat > (bbox.min_lat + bbox.max_lat) / 2.0;
            bbox.narrow_lat(bit);
            bit
        };
        combined = (combined << 1) | bit as u64;
    }

    Ok(combined)
}

/// Decode an integer geohash into its bounding box
pub fn decode_bbox_int(hash: u64, bit_depth: u32) -> Result<BoundingBox> {
    check_depth(bit_depth)?;

    let mut bbox = BoundingBox::WORLD;
    let step = bit_depth / 2;

    for i in 0..step {
        let lng_bit = (hash >> ((step - i) * 2 - 1)) & 1 == 1;
        let lat_bit = (hash >> ((step - i) * 2 - 2)) & 1 == 1;
        bbox.narrow_lat(lat_bit);
        bbox.narrow_lng(lng_bit);
    }

    Ok(bbox)
}

/// Decode an integer geohash into its cell center and error margins
pub fn decode_int(hash: u64, bit_depth: u32) -> Result<Decoded> {
    Ok(decode_bbox_int(hash, bit_depth)?.center())
}

/// Find the adjacent integer cell in `direction`
pub fn neighbor_int(hash: u64, direction: Direction, bit_depth: u32) -> Result<u64> {
    let decoded = decode_int(hash, bit_depth)?;
    let (d_lat, d_lng) = direction.offsets();
    encode_int(
        decoded.latitude + d_lat * decoded.lat_error * 2.0,
        decoded.longitude + d_lng * decoded.lng_error * 2.0,
        bit_depth,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::geohash::{BASE32, DEFAULT_BIT_DEPTH};
    use crate::geohash::{encode, neighbor};

    /// Pack a string geohash into its integer form
    fn to_int(hash: &str) -> u64 {
        hash.bytes().fold(0u64, |acc, b| {
            let v = BASE32.iter().position(|&c| c == b).unwrap() as u64;
            (acc << 5) | v
        })
    }

    #[test]
    fn test_matches_string_codec() {
        // 4 characters = 20 bits
        let hash = encode(40.5, -80.0, 4);
        assert_eq!(encode_int(40.5, -80.0, 20).unwrap(), to_int(&hash));

        let hash = encode(-33.8688, 151.2093, 6);
        assert_eq!(encode_int(-33.8688, 151.2093, 30).unwrap(), to_int(&hash));
    }

    #[test]
    fn test_decode_matches_string_codec() {
        let hash = encode(40.5, -80.0, 4);
        let from_int = decode_bbox_int(to_int(&hash), 20).unwrap();
        let from_str = crate::geohash::decode_bbox(&hash).unwrap();
        assert_eq!(from_int, from_str);
    }

    #[test]
    fn test_round_trip_default_depth() {
        let hash = encode_int(38.0, -119.0, DEFAULT_BIT_DEPTH).unwrap();
        let decoded = decode_int(hash, DEFAULT_BIT_DEPTH).unwrap();
        assert!((decoded.latitude - 38.0).abs() <= decoded.lat_error);
        assert!((decoded.longitude + 119.0).abs() <= decoded.lng_error);
        assert!(decoded.lat_error < 1e-5);
    }

    #[test]
    fn test_neighbor_matches_string_codec() {
        let hash = encode(40.5, -80.0, 4);
        for direction in Direction::CLOCKWISE {
            let expected = to_int(&neighbor(&hash, direction).unwrap());
            assert_eq!(neighbor_int(to_int(&hash), direction, 20).unwrap(), expected);
        }
    }

    #[test]
    fn test_invalid_depth() {
        assert!(encode_int(0.0, 0.0, 0).is_err());
        assert!(encode_int(0.0, 0.0, 51).is_err());
        assert!(decode_int(0, 66).is_err());
    }
}
