//! Coordinate reference system registry.
//!
//! The registry maps CRS names (`EPSG:32633`, ...) to proj definitions. The
//! default registry knows WGS84 geographic coordinates and every WGS84 / UTM
//! zone, which covers all Sentinel-2 tiles.

use std::collections::HashMap;
use std::fmt;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use stac_indexer_shared::Position;

use crate::errors::GeometryError;

/// Proj definition of WGS84 longitude/latitude, the output of every transform.
const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Proj definition of one WGS84 / UTM zone.
fn utm_definition(zone: u8, south: bool) -> String {
    format!(
        "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
        zone,
        if south { " +south" } else { "" }
    )
}

/// A source projection paired with WGS84 longitude/latitude.
pub struct Projection {
    definition: String,
    source: Proj,
    target: Proj,
    geographic: bool,
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("definition", &self.definition)
            .field("geographic", &self.geographic)
            .finish_non_exhaustive()
    }
}

impl Projection {
    /// Build a projection from a proj definition string.
    pub fn from_proj_string(definition: &str) -> Result<Self, GeometryError> {
        let source = Proj::from_proj_string(definition)
            .map_err(|e| GeometryError::InvalidProjection(format!("{}: {:?}", definition, e)))?;
        let target = Proj::from_proj_string(WGS84_LONGLAT)
            .map_err(|e| GeometryError::InvalidProjection(format!("{}: {:?}", WGS84_LONGLAT, e)))?;

        Ok(Self {
            definition: definition.to_string(),
            source,
            target,
            geographic: definition.contains("+proj=longlat"),
        })
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Whether positions are already longitude/latitude.
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// Convert a position in this projection to `[longitude, latitude]`.
    pub fn to_geographic(&self, position: Position) -> Result<Position, GeometryError> {
        if self.geographic {
            return Ok(position);
        }

        let mut point = (position[0], position[1], 0.0);
        transform(&self.source, &self.target, &mut point).map_err(|e| {
            GeometryError::InvalidCoordinates(format!("{:?} could not be transformed: {:?}", position, e))
        })?;

        Ok([point.0.to_degrees(), point.1.to_degrees()])
    }
}

/// Named registry of coordinate reference systems.
#[derive(Debug, Clone)]
pub struct CrsRegistry {
    entries: HashMap<String, String>,
}

impl CrsRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a proj definition under a name. The name is normalized first.
    pub fn register(&mut self, name: &str, definition: impl Into<String>) {
        self.entries.insert(Self::normalize_name(name), definition.into());
    }

    /// Look up a CRS by name and build its projection.
    pub fn resolve(&self, name: &str) -> Result<Projection, GeometryError> {
        let definition = self
            .entries
            .get(&Self::normalize_name(name))
            .ok_or_else(|| GeometryError::UnknownCrs(name.to_string()))?;
        Projection::from_proj_string(definition)
    }

    /// Normalize a CRS name to `AUTHORITY:CODE`.
    ///
    /// Accepts OGC URNs with or without a version
    /// (`urn:ogc:def:crs:EPSG:8.8.1:32633`, `urn:ogc:def:crs:EPSG::32633`),
    /// plain `EPSG:32633` and a bare numeric EPSG code.
    pub fn normalize_name(name: &str) -> String {
        let trimmed = name.trim();
        let without_urn = match trimmed.get(..16) {
            Some(prefix) if prefix.eq_ignore_ascii_case("urn:ogc:def:crs:") => &trimmed[16..],
            _ => trimmed,
        };

        match (without_urn.split_once(':'), without_urn.rsplit_once(':')) {
            (Some((authority, _)), Some((_, code))) => {
                format!("{}:{}", authority.to_ascii_uppercase(), code.to_ascii_uppercase())
            }
            _ if !without_urn.is_empty() && without_urn.bytes().all(|b| b.is_ascii_digit()) => {
                format!("EPSG:{}", without_urn)
            }
            _ => without_urn.to_ascii_uppercase(),
        }
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CrsRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("EPSG:4326", WGS84_LONGLAT);
        for zone in 1..=60u8 {
            registry.register(
                &format!("EPSG:{}", 32600 + u32::from(zone)),
                utm_definition(zone, false),
            );
            registry.register(
                &format!("EPSG:{}", 32700 + u32::from(zone)),
                utm_definition(zone, true),
            );
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Position, expected: Position, tolerance: f64) {
        assert!(
            (actual[0] - expected[0]).abs() < tolerance && (actual[1] - expected[1]).abs() < tolerance,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            CrsRegistry::normalize_name("urn:ogc:def:crs:EPSG:8.8.1:32633"),
            "EPSG:32633"
        );
        assert_eq!(CrsRegistry::normalize_name("urn:ogc:def:crs:EPSG::32633"), "EPSG:32633");
        assert_eq!(CrsRegistry::normalize_name("epsg:4326"), "EPSG:4326");
        assert_eq!(CrsRegistry::normalize_name("32633"), "EPSG:32633");
        assert_eq!(
            CrsRegistry::normalize_name("urn:ogc:def:crs:OGC:1.3:CRS84"),
            "OGC:CRS84"
        );
    }

    #[test]
    fn test_default_registry_contents() {
        let registry = CrsRegistry::default();

        assert_eq!(registry.len(), 121);
        assert!(registry.resolve("EPSG:4326").unwrap().is_geographic());
        assert_eq!(
            registry.resolve("EPSG:32633").unwrap().definition(),
            "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs"
        );
        assert_eq!(
            registry
                .resolve("urn:ogc:def:crs:EPSG:8.8.1:32760")
                .unwrap()
                .definition(),
            "+proj=utm +zone=60 +south +datum=WGS84 +units=m +no_defs"
        );
        assert!(matches!(
            registry.resolve("EPSG:3857"),
            Err(GeometryError::UnknownCrs(name)) if name == "EPSG:3857"
        ));
    }

    #[test]
    fn test_every_default_entry_builds() {
        let registry = CrsRegistry::default();

        for zone in 1..=60u32 {
            assert!(registry.resolve(&format!("EPSG:{}", 32600 + zone)).is_ok());
            assert!(registry.resolve(&format!("EPSG:{}", 32700 + zone)).is_ok());
        }
    }

    #[test]
    fn test_central_meridian_on_equator() {
        let projection = CrsRegistry::default().resolve("EPSG:32633").unwrap();
        assert_close(projection.to_geographic([500_000.0, 0.0]).unwrap(), [15.0, 0.0], 1e-9);
    }

    #[test]
    fn test_utm_inverse_known_points() {
        let registry = CrsRegistry::default();

        let north = registry.resolve("EPSG:32633").unwrap();
        // 50°N on the zone 33 central meridian
        assert_close(north.to_geographic([500_000.0, 5_538_630.70]).unwrap(), [15.0, 50.0], 1e-6);
        assert_close(
            north.to_geographic([600_000.0, 5_300_040.0]).unwrap(),
            [16.336_600_2, 47.845_921_1],
            1e-6,
        );

        let south = registry.resolve("EPSG:32733").unwrap();
        assert_close(
            south
                .to_geographic([500_000.0, 10_000_000.0 - 5_538_630.70])
                .unwrap(),
            [15.0, -50.0],
            1e-6,
        );
    }

    #[test]
    fn test_geographic_is_identity() {
        let projection = CrsRegistry::default().resolve("EPSG:4326").unwrap();
        assert_eq!(projection.to_geographic([1.5, -2.5]).unwrap(), [1.5, -2.5]);
    }

    #[test]
    fn test_registered_definition_must_parse() {
        let mut registry = CrsRegistry::empty();
        registry.register("LOCAL:1", "+proj=not-a-projection");

        assert!(matches!(
            registry.resolve("LOCAL:1"),
            Err(GeometryError::InvalidProjection(_))
        ));
    }
}
