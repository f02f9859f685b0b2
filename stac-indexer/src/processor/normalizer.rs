//! Record normalizer.
//!
//! Turns one raw manifest row into a complete catalog record. The steps run in
//! a fixed order: parse the grid code, derive the tile path, fetch the tile
//! metadata, reproject the tile geometries, compute the bounding box and
//! assemble the assets. Any failing step fails the whole record.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Map};
use stac_indexer_shared::{Asset, CatalogRecord, Geometry, Link, RawTileRecord, SourceGeometry};
use tracing::{debug, instrument};

use crate::errors::{GeometryError, NormalizeError};
use crate::geometry::{bounding_box, reproject, CrsRegistry};
use crate::processor::enrichment::TileInfoSource;
use crate::processor::mgrs::{self, ParsedGrid};
use crate::processor::sentinel::{SentinelEndpoints, BAND_NAMES, COLLECTION_ID};

/// Normalizes raw Sentinel-2 manifest rows into catalog records.
#[derive(Clone)]
pub struct RecordNormalizer {
    tile_info: Arc<dyn TileInfoSource>,
    registry: Arc<CrsRegistry>,
    endpoints: SentinelEndpoints,
}

impl RecordNormalizer {
    pub fn new(
        tile_info: Arc<dyn TileInfoSource>,
        registry: Arc<CrsRegistry>,
        endpoints: SentinelEndpoints,
    ) -> Self {
        Self {
            tile_info,
            registry,
            endpoints,
        }
    }

    /// Normalize one record.
    #[instrument(skip(self, raw), fields(granule_id = %raw.granule_id))]
    pub async fn normalize(&self, raw: &RawTileRecord) -> Result<CatalogRecord, NormalizeError> {
        let grid = mgrs::parse(&raw.mgrs_tile)?;
        let sensed_at = parse_sensing_time(&raw.sensing_time)?;
        let cloud_cover = parse_cloud_cover(&raw.cloud_cover)?;

        let tile_path = mgrs::tile_path(&sensed_at, &grid);
        let tile_url = self.endpoints.tile_url(&tile_path);
        let metadata_url = self.endpoints.metadata_url(&tile_path);

        let info = self
            .tile_info
            .fetch_tile_info(&self.endpoints.tile_info_url(&tile_path))
            .await?;
        let platform = platform_name(&info.product_name)?;

        let geometry = self.reproject(info.footprint(), &grid)?;
        let tile_geometry = self.reproject(&info.tile_geometry, &grid)?;
        let tile_origin = self.reproject(&info.tile_origin, &grid)?;

        let bbox = bounding_box(&geometry).ok_or_else(|| {
            GeometryError::InvalidCoordinates("footprint has no vertices".to_string())
        })?;

        let mut properties = Map::new();
        properties.insert("eo:platform".to_string(), json!(platform));
        properties.insert("eo:cloud_cover".to_string(), json!(cloud_cover));
        properties.insert("eo:epsg".to_string(), json!(grid.epsg));
        properties.insert("sentinel:product_id".to_string(), json!(raw.product_id));
        properties.insert(
            "sentinel:tile_geometry".to_string(),
            geometry_value(&tile_geometry)?,
        );
        properties.insert(
            "sentinel:tile_origin".to_string(),
            geometry_value(&tile_origin)?,
        );

        let mut assets: BTreeMap<String, Asset> = BAND_NAMES
            .iter()
            .enumerate()
            .map(|(index, band)| {
                (
                    band.to_string(),
                    Asset::band(format!("{}/{}.jp2", tile_url, band), index),
                )
            })
            .collect();
        assets.insert(
            "thumbnail".to_string(),
            Asset::new(format!("{}/preview.jpg", metadata_url)),
        );
        assets.insert(
            "tki".to_string(),
            Asset::new(format!("{}/TKI.jp2", tile_url)).with_description("True Color Image"),
        );
        assets.insert(
            "metadata".to_string(),
            Asset::new(format!("{}/metadata.xml", metadata_url)),
        );

        debug!(tile_path = %tile_path, epsg = %grid.epsg, "Normalized record");

        Ok(CatalogRecord {
            id: raw.granule_id.clone(),
            collection: COLLECTION_ID.to_string(),
            datetime: sensed_at,
            bbox,
            geometry,
            properties,
            assets,
            links: vec![Link::new("collection", COLLECTION_ID)],
        })
    }

    /// Reproject with the geometry's declared CRS, or the grid's UTM system
    /// when it declares none.
    fn reproject(&self, geometry: &SourceGeometry, grid: &ParsedGrid) -> Result<Geometry, GeometryError> {
        let fallback = format!("EPSG:{}", grid.epsg);
        let crs = geometry.crs_name().unwrap_or(&fallback);
        reproject(geometry, crs, &self.registry)
    }
}

fn geometry_value(geometry: &Geometry) -> Result<serde_json::Value, NormalizeError> {
    serde_json::to_value(geometry).map_err(|e| NormalizeError::malformed(e.to_string()))
}

/// Parse an ISO-8601 sensing time. A timestamp without offset is taken as UTC.
fn parse_sensing_time(value: &str) -> Result<DateTime<Utc>, NormalizeError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| NormalizeError::malformed(format!("sensing time {:?}: {}", value, e)))
}

/// Cloud cover as a whole percentage; fractional digits are dropped.
fn parse_cloud_cover(value: &str) -> Result<i64, NormalizeError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| NormalizeError::malformed(format!("cloud cover {:?}", value)))?;
    if !parsed.is_finite() {
        return Err(NormalizeError::malformed(format!("cloud cover {:?}", value)));
    }
    Ok(parsed.trunc() as i64)
}

/// `S2A_MSIL1C_...` is `Sentinel-2A`.
fn platform_name(product_name: &str) -> Result<String, NormalizeError> {
    product_name
        .chars()
        .nth(2)
        .map(|unit| format!("Sentinel-2{}", unit))
        .ok_or_else(|| NormalizeError::malformed(format!("product name {:?}", product_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EnrichmentError;
    use crate::processor::enrichment::TileInfo;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Stub enrichment source returning a fixed document for every tile.
    struct StubTileInfo {
        response: Result<Value, EnrichmentError>,
        requested: Mutex<Vec<String>>,
    }

    impl StubTileInfo {
        fn ok(document: Value) -> Self {
            Self {
                response: Ok(document),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: EnrichmentError) -> Self {
            Self {
                response: Err(error),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TileInfoSource for StubTileInfo {
        async fn fetch_tile_info(&self, url: &str) -> Result<TileInfo, EnrichmentError> {
            self.requested.lock().unwrap().push(url.to_string());
            let document = self.response.clone()?;
            serde_json::from_value(document).map_err(|e| EnrichmentError::Decode(e.to_string()))
        }
    }

    fn utm_polygon(ring: Value) -> Value {
        json!({
            "type": "Polygon",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG:8.8.1:32633"}},
            "coordinates": [ring]
        })
    }

    fn tile_info() -> Value {
        json!({
            "productName": "S2B_MSIL1C_20200501T100029_N0209_R122_T33UXP_20200501T120000",
            "tileGeometry": utm_polygon(json!([
                [600000.0, 5400000.0], [709800.0, 5400000.0], [709800.0, 5290200.0],
                [600000.0, 5290200.0], [600000.0, 5400000.0]
            ])),
            "tileDataGeometry": utm_polygon(json!([
                [600000.0, 5300040.0], [699960.0, 5300040.0], [699960.0, 5400000.0],
                [600000.0, 5400000.0], [600000.0, 5300040.0]
            ])),
            "tileOrigin": {
                "type": "Point",
                "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG:8.8.1:32633"}},
                "coordinates": [600000.0, 5400000.0]
            }
        })
    }

    fn raw_record() -> RawTileRecord {
        RawTileRecord::new("G1", "P1", "33UXP", "2020-05-01T10:00:00Z", "12")
    }

    fn normalizer(source: Arc<StubTileInfo>) -> RecordNormalizer {
        RecordNormalizer::new(
            source,
            Arc::new(CrsRegistry::default()),
            SentinelEndpoints::default(),
        )
    }

    #[tokio::test]
    async fn test_normalize_end_to_end() {
        let source = Arc::new(StubTileInfo::ok(tile_info()));
        let normalizer = normalizer(source.clone());

        let record = normalizer.normalize(&raw_record()).await.unwrap();

        assert_eq!(record.id, "G1");
        assert_eq!(record.collection, "sentinel-2-l1c");
        assert_eq!(record.properties["eo:epsg"], "32633");
        assert_eq!(record.properties["eo:cloud_cover"], 12);
        assert_eq!(record.properties["eo:platform"], "Sentinel-2B");
        assert_eq!(record.properties["sentinel:product_id"], "P1");
        assert_eq!(record.properties["sentinel:tile_origin"]["type"], "Point");
        assert_eq!(record.assets.len(), 16);
        assert_eq!(
            record.assets["B8A"].href,
            "https://sentinel-s2-l1c.s3.amazonaws.com/tiles/33/U/XP/2020/5/1/0/B8A.jp2"
        );
        assert_eq!(record.assets["B8A"].bands, Some(vec![12]));
        assert_eq!(record.assets["tki"].description.as_deref(), Some("True Color Image"));
        assert_eq!(record.links, vec![Link::new("collection", "sentinel-2-l1c")]);

        assert_eq!(
            *source.requested.lock().unwrap(),
            vec!["https://roda.sentinel-hub.com/sentinel-s2-l1c/tiles/33/U/XP/2020/5/1/0/tileInfo.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_bbox_comes_from_data_footprint() {
        let normalizer = normalizer(Arc::new(StubTileInfo::ok(tile_info())));

        let record = normalizer.normalize(&raw_record()).await.unwrap();

        assert_eq!(Some(record.bbox), bounding_box(&record.geometry));
        // West edge at the bottom-left corner; north edge at the top-left
        // corner, which lies nearer the central meridian.
        assert!((record.bbox[0] - 16.336_600_2).abs() < 1e-6);
        assert!((record.bbox[1] - 47.822_608).abs() < 1e-5);
        assert!((record.bbox[3] - 48.744_984).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_malformed_grid_code_skips_enrichment() {
        let source = Arc::new(StubTileInfo::ok(tile_info()));
        let normalizer = normalizer(source.clone());
        let raw = RawTileRecord::new("G2", "P2", "XX", "2020-05-01T10:00:00Z", "12");

        let result = normalizer.normalize(&raw).await;

        assert!(matches!(result, Err(NormalizeError::MalformedGridCode(_))));
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enrichment_failure_propagates() {
        let normalizer = normalizer(Arc::new(StubTileInfo::failing(EnrichmentError::NotFound(
            "tileInfo.json".to_string(),
        ))));

        let result = normalizer.normalize(&raw_record()).await;

        assert!(matches!(
            result,
            Err(NormalizeError::EnrichmentFailed(EnrichmentError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_self_intersecting_footprint_fails_record() {
        let mut info = tile_info();
        info["tileDataGeometry"] = utm_polygon(json!([
            [600000.0, 5300040.0], [699960.0, 5400000.0], [699960.0, 5300040.0],
            [600000.0, 5400000.0], [600000.0, 5300040.0]
        ]));
        let normalizer = normalizer(Arc::new(StubTileInfo::ok(info)));

        let result = normalizer.normalize(&raw_record()).await;

        assert!(matches!(
            result,
            Err(NormalizeError::Geometry(GeometryError::SelfIntersectingGeometry { .. }))
        ));
    }

    #[test]
    fn test_field_parsers() {
        assert_eq!(parse_cloud_cover("12.7").unwrap(), 12);
        assert_eq!(parse_cloud_cover(" 0 ").unwrap(), 0);
        assert!(parse_cloud_cover("cloudy").is_err());
        assert!(parse_cloud_cover("NaN").is_err());

        assert_eq!(
            parse_sensing_time("2015-07-06T10:20:17.447Z").unwrap().to_rfc3339(),
            "2015-07-06T10:20:17.447+00:00"
        );
        assert!(parse_sensing_time("2015-07-06T10:20:17").is_ok());
        assert!(parse_sensing_time("yesterday").is_err());

        assert_eq!(platform_name("S2A_MSIL1C").unwrap(), "Sentinel-2A");
        assert!(platform_name("S2").is_err());
    }
}
