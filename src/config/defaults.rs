//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default collection for `within`
pub const DEFAULT_COLLECTION: &str = "places";

/// Default field holding a record's GeoPoint
pub const DEFAULT_FIELD: &str = "pos";

/// Default query radius in km
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Default geohash length for tagging points
pub const DEFAULT_PRECISION: usize = 9;

/// Longest geohash the config accepts for tagging
pub const MAX_PRECISION: usize = 12;

/// Default output format
pub const DEFAULT_FORMAT: &str = "text";

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7979;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "geoquery";
