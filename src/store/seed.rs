//! Fixture documents for seeding a store
//!
//! Two layouts: a ring of points at fixed distances on the cardinal bearings
//! around a center, and random points scattered inside a lat/lng box. Fixtures
//! are saved as JSON seed files the `within` command and the server can load.

use crate::coord::{spherical, Coordinates, GeoPoint};
use crate::error::{Error, Result};
use crate::query::field::FieldPath;
use crate::store::Document;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Distances (km) of the default ring layout
pub const RING_DISTANCES_KM: [f64; 8] = [0.2, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 1000.0];

/// Bearings (degrees) of the default ring layout
pub const RING_BEARINGS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

/// A collection's worth of documents on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedFile {
    pub collection: String,
    /// Field holding each document's GeoPoint
    pub field: String,
    pub documents: Vec<Document>,
}

impl SeedFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Build a document carrying `point` under `field`, plus any extra fields
///
/// Dotted fields nest (`venue.location`); a field that is not a valid path is
/// stored as a single key.
pub fn tagged(id: impl Into<String>, field: &str, point: &GeoPoint, extra: Map<String, Value>) -> Document {
    let mut data = extra;
    match FieldPath::new(field) {
        Ok(path) => path.set(&mut data, point.to_value()),
        Err(_) => {
            data.insert(field.to_string(), point.to_value());
        }
    }
    Document::new(id, data)
}

/// Points at every distance on every bearing around `center`
///
/// Ids look like `5_distance-90_bearing`.
pub fn ring(center: Coordinates, field: &str, distances_km: &[f64], bearings: &[f64]) -> Vec<Document> {
    distances_km
        .iter()
        .flat_map(|&km| bearings.iter().map(move |&deg| (km, deg)))
        .map(|(km, deg)| {
            let point = GeoPoint::from_coords(spherical::destination(center, km, deg));
            let mut extra = Map::new();
            extra.insert("distance_km".to_string(), km.into());
            extra.insert("bearing".to_string(), deg.into());
            tagged(format!("{}_distance-{}_bearing", km, deg), field, &point, extra)
        })
        .collect()
}

/// `count` random points inside a lat/lng box
pub fn random_box<R: Rng + ?Sized>(
    rng: &mut R,
    field: &str,
    count: usize,
    lat_range: (f64, f64),
    lng_range: (f64, f64),
) -> Result<Vec<Document>> {
    if lat_range.0 >= lat_range.1 || lng_range.0 >= lng_range.1 {
        return Err(Error::InvalidArgument(format!(
            "Empty seed box: lat {:?}, lng {:?}",
            lat_range, lng_range
        )));
    }

    Ok((0..count)
        .map(|i| {
            let lat = rng.gen_range(lat_range.0..lat_range.1);
            let lng = rng.gen_range(lng_range.0..lng_range.1);
            let point = GeoPoint::new(lat, lng);
            let mut extra = Map::new();
            extra.insert("name".to_string(), format!("random-{}", i).into());
            tagged(format!("random-{}", i), field, &point, extra)
        })
        .collect())
}

/// Random points uniformly spread within `radius_km` of `center`
pub fn random_circle<R: Rng + ?Sized>(
    rng: &mut R,
    field: &str,
    count: usize,
    center: Coordinates,
    radius_km: f64,
) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let point = GeoPoint::from_coords(spherical::random_point_in_circle(center, radius_km, rng));
            tagged(format!("circle-{}", i), field, &point, Map::new())
        })
        .collect()
}
