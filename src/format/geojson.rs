//! GeoJSON (RFC 7946) output
//!
//! Hits become `Point` features in a `FeatureCollection`. GeoJSON orders
//! positions `[longitude, latitude]`, the reverse of the rest of the crate.

use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::format::{OutputFormatter, Report};
use crate::query::field::FieldPath;
use crate::query::Hit;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geometry of a feature; only points are produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        /// `[lng, lat]`
        coordinates: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// A point feature at `coords`
    pub fn point(coords: Coordinates, properties: Map<String, Value>) -> Self {
        Self {
            geometry: Geometry::Point {
                coordinates: coords.to_lng_lat(),
            },
            properties,
        }
    }

    /// Position as (lat, lng)
    pub fn coords(&self) -> Coordinates {
        match self.geometry {
            Geometry::Point { coordinates: [lng, lat] } => Coordinates::new(lat, lng),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// Map a hit list to a feature collection, reading positions from `field`
///
/// With `include_properties` every feature carries the whole hit (record fields
/// plus `hitMetadata`); otherwise properties are empty.
pub fn to_geojson(hits: &[Hit], field: &str, include_properties: bool) -> Result<FeatureCollection> {
    let field = FieldPath::new(field)?;
    let features = hits
        .iter()
        .map(|hit| {
            let coords = field.coords(&hit.document).ok_or_else(|| {
                Error::InvalidArgument(format!("Hit {} has no geopoint under {}", hit.id(), field))
            })?;
            let properties = if include_properties {
                match serde_json::to_value(hit)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                }
            } else {
                Map::new()
            };
            Ok(Feature::point(coords, properties))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection { features })
}

/// Stream form of [`to_geojson`]: every hit list becomes a feature collection
pub fn geojson_stream<St>(
    stream: St,
    field: &str,
    include_properties: bool,
) -> impl Stream<Item = Result<FeatureCollection>>
where
    St: Stream<Item = Result<Vec<Hit>>>,
{
    let field = field.to_string();
    stream.map(move |hits| hits.and_then(|hits| to_geojson(&hits, &field, include_properties)))
}

/// GeoJSON formatter - feature collection with full properties
pub struct GeoJsonFormatter;

impl OutputFormatter for GeoJsonFormatter {
    fn name(&self) -> &str {
        "geojson"
    }

    fn description(&self) -> &str {
        "GeoJSON FeatureCollection"
    }

    fn format(&self, report: &Report) -> Result<String> {
        let collection = to_geojson(&report.hits, &report.field, true)?;
        Ok(serde_json::to_string_pretty(&collection)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mock_hits() -> Vec<Hit> {
        serde_json::from_value(json!([
            {
                "id": "mock1",
                "title": "mock1",
                "point": {"geopoint": {"latitude": 28.0, "longitude": -119.0}, "geohash": "xxxxxxxxx"},
                "hitMetadata": {"bearing": 90.2, "distance": 120.2}
            },
            {
                "id": "mock2",
                "title": "mock2",
                "point": {"geopoint": {"latitude": 38.0, "longitude": -90.0}, "geohash": "xxxxxxxxx"},
                "hitMetadata": {"bearing": 40.2, "distance": 20.2}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_feature_collection_shape() {
        let collection = to_geojson(&mock_hits(), "point", false).unwrap();
        let value = serde_json::to_value(&collection).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["geometry"]["coordinates"], json!([-119.0, 28.0]));
        assert_eq!(value["features"][0]["properties"], json!({}));
    }

    #[test]
    fn test_include_properties() {
        let collection = to_geojson(&mock_hits(), "point", true).unwrap();
        let props = &collection.features[1].properties;
        assert_eq!(props["title"], "mock2");
        assert_eq!(props["hitMetadata"]["distance"], 20.2);
        assert_eq!(collection.features[1].coords(), Coordinates::new(38.0, -90.0));
    }

    #[test]
    fn test_missing_field_is_an_error() {
        assert!(matches!(
            to_geojson(&mock_hits(), "pos", false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(to_geojson(&[], "pos", false).unwrap().features.is_empty());
    }

    #[test]
    fn test_deserialize_feature_collection() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [2.0, 1.0]},
                "properties": {"name": "x"}
            }]
        }))
        .unwrap();
        assert_eq!(collection.features[0].coords(), Coordinates::new(1.0, 2.0));
    }

    #[tokio::test]
    async fn test_geojson_stream() {
        let source = futures::stream::iter(vec![Ok(mock_hits()), Ok(Vec::new())]);
        let out: Vec<Result<FeatureCollection>> = geojson_stream(source, "point", false).collect().await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap().features.len(), 2);
        assert!(out[1].as_ref().unwrap().features.is_empty());
    }
}
