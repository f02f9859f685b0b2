//! MGRS tile designators.

use chrono::{DateTime, Datelike, Utc};

use crate::errors::NormalizeError;

/// A parsed MGRS grid designator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGrid {
    /// UTM zone, 1..=60.
    pub zone: u8,
    /// Latitude band letter, upper case.
    pub band: char,
    /// 100 km grid square, upper case.
    pub square: String,
    /// EPSG code of the matching WGS84 / UTM system, e.g. `32633`.
    pub epsg: String,
}

impl ParsedGrid {
    /// Whether the latitude band lies in the northern hemisphere.
    pub fn is_north(&self) -> bool {
        is_northern_band(self.band)
    }
}

/// Bands `A`..=`M` are south of the equator, `N`..=`Z` north of it.
fn is_northern_band(band: char) -> bool {
    band.to_ascii_uppercase() >= 'N'
}

/// Parse a designator such as `33UXP` or `T33UXP`.
pub fn parse(designator: &str) -> Result<ParsedGrid, NormalizeError> {
    let malformed = || NormalizeError::MalformedGridCode(designator.to_string());

    let trimmed = designator.trim();
    let code = match trimmed.strip_prefix(['T', 't']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => trimmed,
    };

    if !code.is_ascii() || !(4..=6).contains(&code.len()) {
        return Err(malformed());
    }

    let (zone, letters) = code.split_at(code.len() - 3);
    if zone.is_empty() || !zone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let zone: u8 = zone.parse().map_err(|_| malformed())?;
    if !(1..=60).contains(&zone) {
        return Err(malformed());
    }

    if !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(malformed());
    }
    let letters = letters.to_ascii_uppercase();
    let mut chars = letters.chars();
    let band = chars.next().ok_or_else(malformed)?;
    let square: String = chars.collect();

    let family = if is_northern_band(band) { 326 } else { 327 };

    Ok(ParsedGrid {
        zone,
        band,
        square,
        epsg: format!("{}{:02}", family, zone),
    })
}

/// Storage path of a tile acquisition in the public Sentinel-2 bucket.
///
/// Zone, month and day are plain integers: `tiles/33/U/XP/2020/5/1/0`.
pub fn tile_path(sensed_at: &DateTime<Utc>, grid: &ParsedGrid) -> String {
    format!(
        "tiles/{}/{}/{}/{}/{}/{}/0",
        grid.zone,
        grid.band,
        grid.square,
        sensed_at.year(),
        sensed_at.month(),
        sensed_at.day()
    )
}
