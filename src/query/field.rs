//! Typed access to the field carrying a record's `GeoPoint`

use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::store::Document;
use serde_json::{Map, Value};

/// Dotted path to a tagged field, e.g. `"pos"` or `"venue.location"`
///
/// Parsed once per query; records are then read without re-splitting the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    path: String,
    segments: Vec<String>,
    geohash_path: String,
}

impl FieldPath {
    pub fn new(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::InvalidArgument(format!("Invalid field path: {:?}", path)));
        }
        Ok(Self {
            path: path.to_string(),
            segments,
            geohash_path: format!("{}.geohash", path),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Path of the geohash string the store orders by
    pub fn geohash_path(&self) -> &str {
        &self.geohash_path
    }

    fn resolve<'a>(&self, doc: &'a Document) -> Option<&'a Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = doc.data.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Coordinates stored under `<field>.geopoint`, if present and numeric
    pub fn coords(&self, doc: &Document) -> Option<Coordinates> {
        let point = self.resolve(doc)?.get("geopoint")?;
        let lat = point.get("latitude")?.as_f64()?;
        let lng = point.get("longitude")?.as_f64()?;
        Some(Coordinates::new(lat, lng))
    }

    /// Geohash stored under `<field>.geohash`
    pub fn geohash<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        self.resolve(doc)?.get("geohash")?.as_str()
    }

    /// Store `value` at this path, creating (or replacing non-object) parents
    pub fn set(&self, data: &mut Map<String, Value>, value: Value) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };
        let mut current = data;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert(last.clone(), value);
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoPoint;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_reads_tagged_point() {
        let field = FieldPath::new("pos").unwrap();
        let d = doc(json!({"id": "a", "pos": GeoPoint::new(38.0, -119.0).to_value()}));
        assert_eq!(field.coords(&d), Some(Coordinates::new(38.0, -119.0)));
        assert_eq!(field.geohash(&d), Some("9qg2hjdy5"));
        assert_eq!(field.geohash_path(), "pos.geohash");
    }

    #[test]
    fn test_nested_path() {
        let field = FieldPath::new("venue.location").unwrap();
        let d = doc(json!({
            "id": "a",
            "venue": {"location": {"geopoint": {"latitude": 1.0, "longitude": 2.0}, "geohash": "s00"}}
        }));
        assert_eq!(field.coords(&d), Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(field.geohash_path(), "venue.location.geohash");
    }

    #[test]
    fn test_missing_or_malformed() {
        let field = FieldPath::new("pos").unwrap();
        assert_eq!(field.coords(&doc(json!({"id": "a"}))), None);
        assert_eq!(
            field.coords(&doc(json!({"id": "a", "pos": {"geopoint": {"latitude": "x", "longitude": 1.0}}}))),
            None
        );
    }

    #[test]
    fn test_set_nested() {
        let field = FieldPath::new("venue.location").unwrap();
        let mut data = Map::new();
        data.insert("venue".to_string(), json!("old"));
        field.set(&mut data, GeoPoint::new(1.0, 2.0).to_value());

        let d = Document::new("a", data);
        assert_eq!(field.coords(&d), Some(Coordinates::new(1.0, 2.0)));
    }

    #[test]
    fn test_invalid_paths() {
        assert!(FieldPath::new("").is_err());
        assert!(FieldPath::new("a..b").is_err());
        assert!(FieldPath::new(".a").is_err());
    }
}
