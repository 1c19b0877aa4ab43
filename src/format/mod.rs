//! Output formatters
//!
//! Provides trait-based output formatting for radius query results.

pub mod geojson;
pub mod gpx;
pub mod json;
pub mod text;

use crate::coord::Coordinates;
use crate::error::Result;
use crate::query::Hit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// One resolved radius query, as handed to a formatter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub collection: String,
    /// Field the query read positions from
    pub field: String,
    pub center: Coordinates,
    pub radius_km: f64,
    /// Geohash cells the query subscribed to
    pub cells: Vec<String>,
    pub hits: Vec<Hit>,
    pub timestamp: DateTime<Utc>,
}

impl Report {
    pub fn new(
        collection: impl Into<String>,
        field: impl Into<String>,
        center: Coordinates,
        radius_km: f64,
        cells: Vec<String>,
        hits: Vec<Hit>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            collection: collection.into(),
            field: field.into(),
            center,
            radius_km,
            cells,
            hits,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format a resolved query
    fn format(&self, report: &Report) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        "geojson" => Some(Box::new(geojson::GeoJsonFormatter)),
        "gpx" => Some(Box::new(gpx::GpxFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    ["json", "text", "geojson", "gpx"]
        .into_iter()
        .filter_map(get_formatter)
        .map(|f| FormatInfo {
            name: f.name().to_string(),
            description: f.description().to_string(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::coord::GeoPoint;
    use crate::query::HitMetadata;
    use crate::store::Document;
    use serde_json::Map;

    /// Two hits around (40.5, -80.0), stored under `pos`
    pub(crate) fn sample_report() -> Report {
        let hit = |id: &str, lat: f64, lng: f64, distance: f64, bearing: f64| {
            let mut data = Map::new();
            data.insert("pos".to_string(), GeoPoint::new(lat, lng).to_value());
            data.insert("name".to_string(), format!("place {}", id).into());
            Hit {
                document: Document::new(id, data),
                hit_metadata: HitMetadata { distance, bearing },
            }
        };
        Report::new(
            "bearings",
            "pos",
            Coordinates::new(40.5, -80.0),
            5.0,
            vec!["dppn".to_string()],
            vec![
                hit("a", 40.5018, -80.0, 0.2, 0.0),
                hit("b", 40.5, -79.9882, 1.0, 90.0),
            ],
        )
    }

    #[test]
    fn test_get_formatter() {
        assert!(get_formatter("json").is_some());
        assert!(get_formatter("text").is_some());
        assert!(get_formatter("geojson").is_some());
        assert!(get_formatter("gpx").is_some());
        assert!(get_formatter("unknown").is_none());
    }

    #[test]
    fn test_get_formatter_case_insensitive() {
        assert!(get_formatter("JSON").is_some());
        assert!(get_formatter("GeoJSON").is_some());
        assert!(get_formatter("GPX").is_some());
    }

    #[test]
    fn test_available_formats() {
        let formats = available_formats();
        assert_eq!(formats.len(), 4);
        assert!(formats.iter().any(|f| f.name == "json"));
        assert!(formats.iter().any(|f| f.name == "geojson"));
        assert!(formats.iter().all(|f| !f.description.is_empty()));
    }
}
