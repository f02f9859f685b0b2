//! Geometry reprojection.
//!
//! Converts Point and Polygon geometries from a named source CRS into WGS84
//! longitude/latitude and rejects polygons whose rings self-intersect.

mod crs;
mod kinks;
mod reproject;

pub use crs::{CrsRegistry, Projection};
pub use kinks::ring_crossings;
pub use reproject::{bounding_box, reproject};
