//! Collection descriptors.
//!
//! Static metadata describing an imagery product family. A descriptor is
//! seeded into the collections index before any record of the collection is
//! written.

use serde::{Deserialize, Serialize};

use crate::types::catalog_record::Link;

/// An organisation involved in producing or hosting the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub url: String,
}

/// Spectral band of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    /// Ground sample distance in metres.
    pub gsd: f64,
    /// Centre wavelength in micrometres.
    pub center_wavelength: f64,
    pub full_width_half_max: f64,
}

/// Read-only description of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    pub id: String,
    pub title: String,
    pub description: String,
    pub license: String,
    pub providers: Vec<Provider>,
    #[serde(rename = "eo:instrument")]
    pub instrument: String,
    #[serde(rename = "eo:gsd")]
    pub gsd: f64,
    #[serde(rename = "eo:bands")]
    pub bands: Vec<BandDescriptor>,
    pub links: Vec<Link>,
}
