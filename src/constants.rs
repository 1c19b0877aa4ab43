//! Centralized constants for the geoquery crate
//!
//! Values shared by the codec, the spherical math and the query engine.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in kilometers
    pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;
}

/// Geohash constants
pub mod geohash {
    /// Base-32 alphabet used by geohash strings
    pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

    /// Length of the hash stored alongside every tagged point
    pub const POINT_PRECISION: usize = 9;

    /// Longest hash the encoder produces; f64 bisection adds nothing past 22 characters
    pub const MAX_HASH_LENGTH: usize = 22;

    /// Default bit depth for integer geohashes
    pub const DEFAULT_BIT_DEPTH: u32 = 52;

    /// Hash length needed for N decimal significant figures (index = sig figs)
    pub const SIGFIG_HASH_LENGTH: [usize; 11] = [0, 5, 7, 8, 11, 12, 13, 15, 16, 17, 18];
}

/// Radius query constants
pub mod query {
    /// Sentinel appended to a cell prefix to close its range; sorts after every base-32 symbol
    pub const RANGE_SENTINEL: char = '~';

    /// Multiplier applied to the radius when filtering by true distance
    pub const RADIUS_BUFFER: f64 = 1.02;

    /// Field holding the category list for `within_category`
    pub const CATEGORY_FIELD: &str = "categories";
}
