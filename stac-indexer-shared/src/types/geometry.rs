//! Geometry types.
//!
//! `SourceGeometry` is a GeoJSON geometry as it arrives from the enrichment
//! source: any geometry type, coordinates in a named projected CRS.
//! `Geometry` is the reprojected output, restricted to the two types the
//! catalog stores, always in geographic WGS84 coordinates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A coordinate pair: `[x, y]` (easting/northing or longitude/latitude).
pub type Position = [f64; 2];

/// A geometry in geographic coordinates, serialized as GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A single position.
    Point { coordinates: Position },
    /// A polygon; the first ring is the outer boundary.
    Polygon { coordinates: Vec<Vec<Position>> },
}

impl Geometry {
    /// The GeoJSON type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::Polygon { .. } => "Polygon",
        }
    }
}

/// GeoJSON named CRS member (`{"type": "name", "properties": {"name": ...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCrs {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub properties: NamedCrsProperties,
}

/// Properties of a named CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCrsProperties {
    pub name: String,
}

/// A geometry in its source coordinate reference system.
///
/// Coordinates are kept as raw JSON so that unsupported geometry types can be
/// carried to the reprojector and rejected there with a precise error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<NamedCrs>,
}

impl SourceGeometry {
    /// The CRS name declared on the geometry, if any.
    pub fn crs_name(&self) -> Option<&str> {
        self.crs.as_ref().map(|crs| crs.properties.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_serializes_as_geojson() {
        let point = Geometry::Point {
            coordinates: [15.0, 50.0],
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 15.0);
    }

    #[test]
    fn test_source_geometry_crs_name() {
        let json = r#"{
            "type": "Polygon",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG:8.8.1:32633"}},
            "coordinates": [[[600000.0, 5300040.0], [699960.0, 5300040.0], [600000.0, 5400000.0], [600000.0, 5300040.0]]]
        }"#;

        let geometry: SourceGeometry = serde_json::from_str(json).unwrap();

        assert_eq!(geometry.kind, "Polygon");
        assert_eq!(geometry.crs_name(), Some("urn:ogc:def:crs:EPSG:8.8.1:32633"));
    }
}
