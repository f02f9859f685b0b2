//! OpenSearch index names and mappings.

use serde_json::{json, Value};

/// The indices the catalog writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Collection descriptors, keyed by collection id.
    Collections,
    /// Catalog items, keyed by item id.
    Items,
}

impl IndexKind {
    /// The index name.
    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::Collections => "collections",
            IndexKind::Items => "items",
        }
    }
}

/// Get the index settings and mappings for the given index.
///
/// Items map their footprint as `geo_shape` and acquisition time as `date`.
/// Assets and links are stored but not indexed.
pub fn get_index_settings(kind: IndexKind) -> Value {
    let properties = match kind {
        IndexKind::Collections => json!({
            "id": { "type": "keyword" },
            "title": { "type": "text" },
            "description": { "type": "text" },
            "license": { "type": "keyword" },
            "providers": { "type": "object", "enabled": false },
            "eo:bands": { "type": "object", "enabled": false },
            "links": { "type": "object", "enabled": false }
        }),
        IndexKind::Items => json!({
            "id": { "type": "keyword" },
            "collection": { "type": "keyword" },
            "bbox": { "type": "float" },
            "geometry": { "type": "geo_shape" },
            "properties": {
                "type": "object",
                "properties": {
                    "datetime": { "type": "date" },
                    "eo:cloud_cover": { "type": "float" },
                    "eo:epsg": { "type": "keyword" },
                    "eo:platform": { "type": "keyword" },
                    "sentinel:product_id": { "type": "keyword" }
                }
            },
            "assets": { "type": "object", "enabled": false },
            "links": { "type": "object", "enabled": false }
        }),
    };

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_names() {
        assert_eq!(IndexKind::Collections.name(), "collections");
        assert_eq!(IndexKind::Items.name(), "items");
    }

    #[test]
    fn test_items_mapping_structure() {
        let settings = get_index_settings(IndexKind::Items);

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert_eq!(
            settings["mappings"]["properties"]["geometry"]["type"],
            "geo_shape"
        );
        assert_eq!(
            settings["mappings"]["properties"]["properties"]["properties"]["datetime"]["type"],
            "date"
        );
        assert_eq!(settings["mappings"]["properties"]["assets"]["enabled"], false);
    }

    #[test]
    fn test_collections_mapping_structure() {
        let settings = get_index_settings(IndexKind::Collections);
        assert_eq!(settings["mappings"]["properties"]["id"]["type"], "keyword");
        assert!(settings["mappings"]["properties"].get("geometry").is_none());
    }
}
