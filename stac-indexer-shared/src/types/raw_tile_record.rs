//! Raw manifest rows.
//!
//! A `RawTileRecord` is one row of the Sentinel-2 inventory CSV. Only the
//! columns the normalizer needs are kept; every other column is ignored by the
//! CSV reader.

use serde::{Deserialize, Serialize};

/// One row of an imagery manifest, as read from the inventory file.
///
/// Values are kept as the raw strings found in the file. Parsing and validation
/// happen in the normalizer so a bad value fails only its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTileRecord {
    /// Granule identifier, used as the catalog record id.
    #[serde(rename = "GRANULE_ID")]
    pub granule_id: String,
    /// Product identifier.
    #[serde(rename = "PRODUCT_ID")]
    pub product_id: String,
    /// MGRS tile designator (e.g. `33UXP` or `T33UXP`).
    #[serde(rename = "MGRS_TILE")]
    pub mgrs_tile: String,
    /// Sensing timestamp, ISO-8601.
    #[serde(rename = "SENSING_TIME")]
    pub sensing_time: String,
    /// Cloud cover percentage.
    #[serde(rename = "CLOUD_COVER")]
    pub cloud_cover: String,
}

impl RawTileRecord {
    /// Build a record from its individual fields.
    pub fn new(
        granule_id: impl Into<String>,
        product_id: impl Into<String>,
        mgrs_tile: impl Into<String>,
        sensing_time: impl Into<String>,
        cloud_cover: impl Into<String>,
    ) -> Self {
        Self {
            granule_id: granule_id.into(),
            product_id: product_id.into(),
            mgrs_tile: mgrs_tile.into(),
            sensing_time: sensing_time.into(),
            cloud_cover: cloud_cover.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_inventory_columns() {
        let json = r#"{
            "GRANULE_ID": "G1",
            "PRODUCT_ID": "P1",
            "DATATAKE_IDENTIFIER": "ignored",
            "MGRS_TILE": "33UXP",
            "SENSING_TIME": "2020-05-01T10:00:00Z",
            "TOTAL_SIZE": "123",
            "CLOUD_COVER": "12"
        }"#;

        let record: RawTileRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.granule_id, "G1");
        assert_eq!(record.mgrs_tile, "33UXP");
        assert_eq!(record.cloud_cover, "12");
    }
}
