use serde_json::Value;
use stac_indexer_shared::{Geometry, Position, SourceGeometry};

use super::crs::{CrsRegistry, Projection};
use super::kinks::ring_crossings;
use crate::errors::GeometryError;

/// Reproject a geometry from `source_crs` into WGS84 longitude/latitude.
///
/// Only Point and Polygon are accepted; the type is checked before the CRS is
/// resolved. Every polygon ring is transformed and must be free of
/// self-intersections after the transform.
pub fn reproject(
    geometry: &SourceGeometry,
    source_crs: &str,
    registry: &CrsRegistry,
) -> Result<Geometry, GeometryError> {
    match geometry.kind.as_str() {
        "Point" => {
            let projection = registry.resolve(source_crs)?;
            let position = parse_position(&geometry.coordinates)?;
            Ok(Geometry::Point {
                coordinates: transform(&projection, position)?,
            })
        }
        "Polygon" => {
            let projection = registry.resolve(source_crs)?;
            let rings = parse_rings(&geometry.coordinates)?;

            let mut transformed = Vec::with_capacity(rings.len());
            for ring in rings {
                let ring = ring
                    .into_iter()
                    .map(|position| transform(&projection, position))
                    .collect::<Result<Vec<_>, _>>()?;

                let crossings = ring_crossings(&ring);
                if crossings > 0 {
                    return Err(GeometryError::SelfIntersectingGeometry { crossings });
                }
                transformed.push(ring);
            }

            Ok(Geometry::Polygon {
                coordinates: transformed,
            })
        }
        other => Err(GeometryError::UnsupportedGeometry(other.to_string())),
    }
}

/// The `[min_x, min_y, max_x, max_y]` envelope of a geometry.
///
/// For a Polygon this is taken over the outer ring, closing vertex included.
/// Returns `None` for a polygon without vertices.
pub fn bounding_box(geometry: &Geometry) -> Option<[f64; 4]> {
    match geometry {
        Geometry::Point { coordinates: [x, y] } => Some([*x, *y, *x, *y]),
        Geometry::Polygon { coordinates } => {
            let ring = coordinates.first()?;
            let (first, rest) = ring.split_first()?;
            Some(rest.iter().fold(
                [first[0], first[1], first[0], first[1]],
                |[min_x, min_y, max_x, max_y], [x, y]| {
                    [min_x.min(*x), min_y.min(*y), max_x.max(*x), max_y.max(*y)]
                },
            ))
        }
    }
}

fn transform(projection: &Projection, position: Position) -> Result<Position, GeometryError> {
    let output = projection.to_geographic(position)?;
    if output.iter().all(|value| value.is_finite()) {
        Ok(output)
    } else {
        Err(GeometryError::InvalidCoordinates(format!(
            "{:?} has no geographic equivalent",
            position
        )))
    }
}

fn parse_position(value: &Value) -> Result<Position, GeometryError> {
    let invalid = || GeometryError::InvalidCoordinates(format!("expected a position, got {}", value));

    let values = value.as_array().ok_or_else(invalid)?;
    match values.as_slice() {
        [x, y, ..] => {
            let x = x.as_f64().ok_or_else(invalid)?;
            let y = y.as_f64().ok_or_else(invalid)?;
            if x.is_finite() && y.is_finite() {
                Ok([x, y])
            } else {
                Err(invalid())
            }
        }
        _ => Err(invalid()),
    }
}

fn parse_rings(value: &Value) -> Result<Vec<Vec<Position>>, GeometryError> {
    let rings = value.as_array().ok_or_else(|| {
        GeometryError::InvalidCoordinates("polygon coordinates must be an array of rings".to_string())
    })?;
    if rings.is_empty() {
        return Err(GeometryError::InvalidCoordinates("polygon has no rings".to_string()));
    }

    rings
        .iter()
        .map(|ring| {
            let positions = ring.as_array().ok_or_else(|| {
                GeometryError::InvalidCoordinates(format!("expected a ring, got {}", ring))
            })?;
            positions.iter().map(parse_position).collect()
        })
        .collect()
}
