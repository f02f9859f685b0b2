//! Catalog record types for the search index.
//!
//! `CatalogRecord` is the canonical, fully typed output of the record
//! normalizer. `CatalogItem` is the document shape handed to the index writer:
//! an identified JSON body. Both the file-based path (normalized records) and
//! the message-based path (items resolved from queue messages) converge on
//! `CatalogItem`.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::geometry::Geometry;

/// A named asset of a catalog record (a band image, a thumbnail, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Indices into the collection's band list.
    #[serde(
        rename = "eo:bands",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bands: Option<Vec<usize>>,
}

impl Asset {
    /// An asset with only an href.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            description: None,
            bands: None,
        }
    }

    /// An asset covering a single band.
    pub fn band(href: impl Into<String>, band_index: usize) -> Self {
        Self {
            href: href.into(),
            description: None,
            bands: Some(vec![band_index]),
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A link from a record to a related resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
        }
    }
}

/// Canonical catalog record produced by the normalizer.
///
/// A record is never mutated after creation. Re-indexing a record with the
/// same `id` replaces the previous version.
///
/// # Fields
///
/// - `id`: Stable identifier (the granule id for Sentinel-2 tiles)
/// - `collection`: Identifier of the collection the record belongs to
/// - `datetime`: Acquisition time
/// - `bbox`: `[min_lon, min_lat, max_lon, max_lat]` envelope of `geometry`
/// - `geometry`: Footprint in geographic coordinates
/// - `properties`: Platform, cloud cover, source EPSG, product identifiers, ...
/// - `assets`: Named assets with hrefs and band annotations
/// - `links`: Related resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub collection: String,
    pub datetime: DateTime<Utc>,
    pub bbox: [f64; 4],
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
    pub assets: BTreeMap<String, Asset>,
    pub links: Vec<Link>,
}

impl CatalogRecord {
    /// Render the record as a catalog item document.
    ///
    /// The datetime is written into `properties` with millisecond precision,
    /// next to the record's own properties.
    pub fn to_item(&self) -> Result<CatalogItem, serde_json::Error> {
        let mut properties = self.properties.clone();
        properties.insert(
            "datetime".to_string(),
            json!(self.datetime.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let body = json!({
            "type": "Feature",
            "id": self.id,
            "collection": self.collection,
            "bbox": self.bbox,
            "geometry": serde_json::to_value(&self.geometry)?,
            "properties": properties,
            "assets": serde_json::to_value(&self.assets)?,
            "links": serde_json::to_value(&self.links)?,
        });

        Ok(CatalogItem {
            id: self.id.clone(),
            collection: Some(self.collection.clone()),
            body,
        })
    }
}

/// An identified catalog document ready to be written to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Document identity; the index key.
    pub id: String,
    /// Collection the item declares, if any.
    pub collection: Option<String>,
    /// The full document.
    pub body: Value,
}

impl CatalogItem {
    /// Accept a JSON value as a catalog item if it is an object with a
    /// non-empty string `id`.
    pub fn from_value(body: Value) -> Option<Self> {
        let id = body.get("id")?.as_str()?.to_string();
        if id.is_empty() {
            return None;
        }
        let collection = body
            .get("collection")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            id,
            collection,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> CatalogRecord {
        let mut properties = Map::new();
        properties.insert("eo:cloud_cover".to_string(), json!(12));
        let mut assets = BTreeMap::new();
        assets.insert("B01".to_string(), Asset::band("https://x/B01.jp2", 0));
        CatalogRecord {
            id: "G1".to_string(),
            collection: "sentinel-2-l1c".to_string(),
            datetime: Utc.with_ymd_and_hms(2020, 5, 1, 10, 0, 0).unwrap(),
            bbox: [14.0, 47.0, 15.0, 48.0],
            geometry: Geometry::Point {
                coordinates: [14.5, 47.5],
            },
            properties,
            assets,
            links: vec![Link::new("collection", "sentinel-2-l1c")],
        }
    }

    #[test]
    fn test_to_item_document_shape() {
        let item = sample_record().to_item().unwrap();

        assert_eq!(item.id, "G1");
        assert_eq!(item.collection.as_deref(), Some("sentinel-2-l1c"));
        assert_eq!(item.body["type"], "Feature");
        assert_eq!(item.body["properties"]["datetime"], "2020-05-01T10:00:00.000Z");
        assert_eq!(item.body["properties"]["eo:cloud_cover"], 12);
        assert_eq!(item.body["assets"]["B01"]["eo:bands"][0], 0);
        assert!(item.body["assets"]["B01"].get("description").is_none());
        assert_eq!(item.body["bbox"][3], 48.0);
    }

    #[test]
    fn test_item_from_value_requires_string_id() {
        assert!(CatalogItem::from_value(json!({"id": "a", "collection": "c"})).is_some());
        assert!(CatalogItem::from_value(json!({"id": 5})).is_none());
        assert!(CatalogItem::from_value(json!({"id": ""})).is_none());
        assert!(CatalogItem::from_value(json!({"href": "s3://b/k"})).is_none());
        assert!(CatalogItem::from_value(json!([1, 2])).is_none());
    }
}
