//! Inventory manifest reading.
//!
//! A manifest is the Sentinel-2 inventory CSV. Chunk `i` covers the data rows
//! `[i * chunk_size, (i + 1) * chunk_size)`; the header row is not counted.

use csv::{ReaderBuilder, Trim};
use stac_indexer_shared::RawTileRecord;
use tracing::warn;

use crate::errors::StorageError;

/// Columns a manifest must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "GRANULE_ID",
    "PRODUCT_ID",
    "MGRS_TILE",
    "SENSING_TIME",
    "CLOUD_COVER",
];

/// The decodable rows of one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestChunk {
    pub records: Vec<RawTileRecord>,
    /// Rows of the chunk that could not be decoded.
    pub skipped: usize,
}

fn reader(bytes: &[u8]) -> Result<csv::Reader<&[u8]>, StorageError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| StorageError::decode(format!("manifest header: {}", e)))?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(StorageError::decode(format!(
            "manifest is missing columns: {}",
            missing.join(", ")
        )));
    }

    Ok(reader)
}

/// Number of data rows in a manifest.
pub fn row_count(bytes: &[u8]) -> Result<usize, StorageError> {
    let mut reader = reader(bytes)?;
    let mut record = csv::ByteRecord::new();
    let mut rows = 0;
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => rows += 1,
            Ok(false) => return Ok(rows),
            // A broken row is still a row; it is skipped when its chunk is read.
            Err(_) => rows += 1,
        }
    }
}

/// Number of chunks needed for `rows` data rows; at least one.
pub fn chunk_count(rows: usize, chunk_size: usize) -> usize {
    rows.div_ceil(chunk_size.max(1)).max(1)
}

/// Decode the rows of chunk `chunk_index`.
///
/// Rows that fail to decode are logged and counted in `skipped`; they never
/// fail the chunk. A missing required column does.
pub fn read_chunk(
    bytes: &[u8],
    chunk_index: u32,
    chunk_size: usize,
) -> Result<ManifestChunk, StorageError> {
    let chunk_size = chunk_size.max(1);
    let start = chunk_index as usize * chunk_size;

    let mut chunk = ManifestChunk::default();
    let mut reader = reader(bytes)?;
    for (row, result) in reader
        .deserialize::<RawTileRecord>()
        .enumerate()
        .skip(start)
        .take(chunk_size)
    {
        match result {
            Ok(record) => chunk.records.push(record),
            Err(e) => {
                warn!(row = row, error = %e, "Failed to decode manifest row");
                chunk.skipped += 1;
            }
        }
    }

    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
GRANULE_ID,PRODUCT_ID,DATATAKE_IDENTIFIER,MGRS_TILE,SENSING_TIME,TOTAL_SIZE,CLOUD_COVER
G0,P0,D,33UXP,2020-05-01T10:00:00Z,1,10
G1,P1,D,33UXP,2020-05-01T10:00:00Z,1,11
G2,P2,D,33UXP,2020-05-01T10:00:00Z,1,12
G3,P3,D,33UXP,2020-05-01T10:00:00Z,1,13
G4,P4,D,33UXP,2020-05-01T10:00:00Z,1,14
";

    #[test]
    fn test_row_and_chunk_counts() {
        let rows = row_count(MANIFEST.as_bytes()).unwrap();

        assert_eq!(rows, 5);
        assert_eq!(chunk_count(rows, 2), 3);
        assert_eq!(chunk_count(4, 2), 2);
        assert_eq!(chunk_count(0, 2), 1);
    }

    #[test]
    fn test_chunks_partition_rows() {
        let ids = |index| -> Vec<String> {
            read_chunk(MANIFEST.as_bytes(), index, 2)
                .unwrap()
                .records
                .into_iter()
                .map(|r| r.granule_id)
                .collect()
        };

        assert_eq!(ids(0), vec!["G0", "G1"]);
        assert_eq!(ids(1), vec!["G2", "G3"]);
        assert_eq!(ids(2), vec!["G4"]);
        assert!(ids(3).is_empty());
    }

    #[test]
    fn test_other_columns_are_ignored() {
        let chunk = read_chunk(MANIFEST.as_bytes(), 0, 10).unwrap();

        assert_eq!(chunk.records.len(), 5);
        assert_eq!(chunk.records[2].cloud_cover, "12");
        assert_eq!(chunk.records[2].mgrs_tile, "33UXP");
    }

    #[test]
    fn test_broken_row_is_skipped() {
        let manifest = "\
GRANULE_ID,PRODUCT_ID,MGRS_TILE,SENSING_TIME,CLOUD_COVER
G0,P0,33UXP,2020-05-01T10:00:00Z,10
G1,P1
G2,P2,33UXP,2020-05-01T10:00:00Z,12
";

        let chunk = read_chunk(manifest.as_bytes(), 0, 10).unwrap();

        assert_eq!(chunk.skipped, 1);
        assert_eq!(chunk.records.len(), 2);
        assert_eq!(row_count(manifest.as_bytes()).unwrap(), 3);
    }

    #[test]
    fn test_padded_header_names_still_decode() {
        let manifest = "\
GRANULE_ID , PRODUCT_ID,MGRS_TILE ,  SENSING_TIME,CLOUD_COVER\t
G0,P0,33UXP,2020-05-01T10:00:00Z,10
G1,P1,33UXP,2020-05-01T10:00:00Z,11
";

        let chunk = read_chunk(manifest.as_bytes(), 0, 10).unwrap();

        assert_eq!(chunk.skipped, 0);
        assert_eq!(chunk.records.len(), 2);
        assert_eq!(chunk.records[1].granule_id, "G1");
        assert_eq!(chunk.records[1].cloud_cover, "11");
    }

    #[test]
    fn test_missing_column_fails() {
        let manifest = "GRANULE_ID,PRODUCT_ID\nG0,P0\n";

        let err = read_chunk(manifest.as_bytes(), 0, 10).unwrap_err();

        assert!(matches!(err, StorageError::Decode(ref msg) if msg.contains("MGRS_TILE")));
    }
}
