//! Coordinates and tagged points
//!
//! This module handles:
//! - The `Coordinates` pair used throughout the crate
//! - The `GeoPoint` value persisted on tagged records
//! - Great-circle math (`spherical`) and radius-to-precision mapping (`precision`)

pub mod precision;
pub mod spherical;

use crate::constants::geohash::POINT_PRECISION;
use crate::error::{Error, Result};
use crate::format::geojson::Feature;
use crate::geohash;
use serde::{Deserialize, Serialize};

/// A geographic coordinate (latitude, longitude)
///
/// Serializes as `{ "latitude", "longitude" }`, the shape stores use for native
/// geo values; `lat`/`lng` are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "latitude", alias = "lat")]
    pub lat: f64,
    #[serde(rename = "longitude", alias = "lng", alias = "lon")]
    pub lng: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// GeoJSON position order: `[longitude, latitude]`
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// A coordinate plus its geohash, ready to persist on a record
///
/// Stored as `{ "geopoint": { "latitude", "longitude" }, "geohash" }`.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    geopoint: Coordinates,
    geohash: String,
}

impl GeoPoint {
    /// Tag a location with a full-precision (9 character) geohash
    pub fn new(lat: f64, lng: f64) -> Self {
        Self::with_precision(lat, lng, POINT_PRECISION)
    }

    /// Tag a location with a geohash of `precision` characters
    pub fn with_precision(lat: f64, lng: f64, precision: usize) -> Self {
        Self {
            geopoint: Coordinates::new(lat, lng),
            geohash: geohash::encode(lat, lng, precision),
        }
    }

    /// Build from existing coordinates
    pub fn from_coords(coords: Coordinates) -> Self {
        Self::new(coords.lat, coords.lng)
    }

    pub fn coords(&self) -> Coordinates {
        self.geopoint
    }

    pub fn latitude(&self) -> f64 {
        self.geopoint.lat
    }

    pub fn longitude(&self) -> f64 {
        self.geopoint.lng
    }

    pub fn geohash(&self) -> &str {
        &self.geohash
    }

    /// The eight cells surrounding this point's geohash
    pub fn neighbors(&self) -> Result<[String; 8]> {
        geohash::neighbors(&self.geohash)
    }

    /// Great-circle distance to another point in km
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        spherical::distance(self.geopoint, other.geopoint)
    }

    /// Initial bearing to another point in degrees
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        spherical::bearing(self.geopoint, other.geopoint)
    }

    /// GeoJSON feature for this point with empty properties
    pub fn to_feature(&self) -> Feature {
        Feature::point(self.geopoint, serde_json::Map::new())
    }

    /// Serialize into the JSON value stored under a record's field
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "geopoint": {
                "latitude": self.geopoint.lat,
                "longitude": self.geopoint.lng,
            },
            "geohash": self.geohash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_validate() {
        assert!(Coordinates::new(40.5, -80.0).validate().is_ok());
        assert!(Coordinates::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinates::new(91.0, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, -180.5).validate().is_err());
    }

    #[test]
    fn test_geopoint_hash() {
        let point = GeoPoint::new(38.0, -119.0);
        assert_eq!(point.geohash().len(), 9);
        assert_eq!(point.geohash(), "9qg2hjdy5");
        assert_eq!(point.coords(), Coordinates::new(38.0, -119.0));
    }

    #[test]
    fn test_geopoint_neighbors() {
        let point = GeoPoint::new(38.0, -119.0);
        let neighbors = point.neighbors().unwrap();
        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.iter().all(|n| n.len() == 9));
    }

    #[test]
    fn test_geopoint_distance_and_bearing() {
        let p = GeoPoint::new(40.5, -80.0);
        assert_abs_diff_eq!(p.distance_to(&GeoPoint::new(40.49100679636276, -80.0)), 1.0, epsilon = 0.005);
        assert_abs_diff_eq!(p.bearing_to(&GeoPoint::new(40.0, -80.0)), 180.0, epsilon = 0.005);
    }

    #[test]
    fn test_geopoint_serialization() {
        let point = GeoPoint::new(38.0, -119.0);
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value, point.to_value());
        assert_eq!(value["geopoint"]["latitude"], 38.0);
        assert_eq!(value["geopoint"]["longitude"], -119.0);
        assert_eq!(value["geohash"], "9qg2hjdy5");

        let parsed: GeoPoint = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, point);
    }

    #[test]
    fn test_coordinates_aliases() {
        let c: Coordinates = serde_json::from_str(r#"{"lat": 1.5, "lng": 2.5}"#).unwrap();
        assert_eq!(c, Coordinates::new(1.5, 2.5));
        assert_eq!(c.to_lng_lat(), [2.5, 1.5]);
    }
}
