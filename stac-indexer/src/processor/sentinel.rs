//! Sentinel-2 L1C collection metadata and asset locations.

use stac_indexer_shared::{BandDescriptor, CollectionDescriptor, Link, Provider};

/// Collection identifier of Sentinel-2 L1C records.
pub const COLLECTION_ID: &str = "sentinel-2-l1c";

pub const DEFAULT_TILE_BASE_URL: &str = "https://sentinel-s2-l1c.s3.amazonaws.com";

pub const DEFAULT_METADATA_BASE_URL: &str = "https://roda.sentinel-hub.com/sentinel-s2-l1c";

const LICENSE_URL: &str = "https://sentinel.esa.int/documents/247904/690755/Sentinel_Data_Legal_Notice";

/// Band asset names, in `eo:bands` index order.
pub const BAND_NAMES: [&str; 13] = [
    "B01", "B02", "B03", "B04", "B05", "B06", "B07", "B08", "B09", "B10", "B11", "B12", "B8A",
];

/// Base URLs of the imagery bucket and the metadata mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelEndpoints {
    pub tile_base_url: String,
    pub metadata_base_url: String,
}

impl Default for SentinelEndpoints {
    fn default() -> Self {
        Self {
            tile_base_url: DEFAULT_TILE_BASE_URL.to_string(),
            metadata_base_url: DEFAULT_METADATA_BASE_URL.to_string(),
        }
    }
}

impl SentinelEndpoints {
    pub fn new(tile_base_url: impl Into<String>, metadata_base_url: impl Into<String>) -> Self {
        Self {
            tile_base_url: tile_base_url.into().trim_end_matches('/').to_string(),
            metadata_base_url: metadata_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Imagery location of a tile.
    pub fn tile_url(&self, tile_path: &str) -> String {
        format!("{}/{}", self.tile_base_url, tile_path)
    }

    /// Metadata location of a tile.
    pub fn metadata_url(&self, tile_path: &str) -> String {
        format!("{}/{}", self.metadata_base_url, tile_path)
    }

    /// The `tileInfo.json` enrichment document of a tile.
    pub fn tile_info_url(&self, tile_path: &str) -> String {
        format!("{}/tileInfo.json", self.metadata_url(tile_path))
    }
}

fn band(
    name: &str,
    common_name: Option<&str>,
    gsd: f64,
    center_wavelength: f64,
    full_width_half_max: f64,
) -> BandDescriptor {
    BandDescriptor {
        name: name.to_string(),
        common_name: common_name.map(str::to_string),
        gsd,
        center_wavelength,
        full_width_half_max,
    }
}

/// The Sentinel-2 L1C collection descriptor.
///
/// Bands are listed in the same order as [`BAND_NAMES`] so that the band
/// indices on record assets point at the right descriptor.
pub fn collection_descriptor() -> CollectionDescriptor {
    CollectionDescriptor {
        id: COLLECTION_ID.to_string(),
        title: "Sentinel 2 L1C".to_string(),
        description: "Sentinel-2a and Sentinel-2b imagery".to_string(),
        license: "proprietary".to_string(),
        providers: vec![
            Provider {
                name: "ESA".to_string(),
                url: "https://sentinel.esa.int/web/sentinel/home".to_string(),
            },
            Provider {
                name: "Sinergise".to_string(),
                url: "http://sentinel-pds.s3-website.eu-central-1.amazonaws.com/".to_string(),
            },
            Provider {
                name: "AWS".to_string(),
                url: "https://aws.amazon.com/blogs/publicsector/complete-sentinel-2-archives-freely-available-to-users/"
                    .to_string(),
            },
            Provider {
                name: "Development Seed".to_string(),
                url: "https://developmentseed.org/".to_string(),
            },
        ],
        instrument: "MSI".to_string(),
        gsd: 10.0,
        bands: vec![
            band("B01", Some("coastal"), 60.0, 0.4439, 0.027),
            band("B02", Some("blue"), 10.0, 0.4966, 0.098),
            band("B03", Some("green"), 10.0, 0.56, 0.045),
            band("B04", Some("red"), 10.0, 0.6645, 0.038),
            band("B05", None, 20.0, 0.7039, 0.019),
            band("B06", None, 20.0, 0.7402, 0.018),
            band("B07", None, 20.0, 0.7825, 0.028),
            band("B08", Some("nir"), 10.0, 0.8351, 0.145),
            band("B09", None, 60.0, 0.945, 0.026),
            band("B10", Some("cirrus"), 60.0, 1.3735, 0.075),
            band("B11", Some("swir16"), 20.0, 1.6137, 0.143),
            band("B12", Some("swir22"), 20.0, 2.22024, 0.242),
            band("B8A", None, 20.0, 0.8648, 0.033),
        ],
        links: vec![Link::new("license", LICENSE_URL)],
    }
}
