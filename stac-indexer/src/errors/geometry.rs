//! Error types for geometry reprojection.
use thiserror::Error;

/// Errors raised by the geometry reprojector.
///
/// A geometry that fails validation is rejected outright; nothing is repaired.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Unknown CRS: {0}")]
    UnknownCrs(String),
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),
    #[error("Self-intersecting geometry: {crossings} crossing(s)")]
    SelfIntersectingGeometry { crossings: usize },
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Invalid projection definition: {0}")]
    InvalidProjection(String),
}
