//! Compile-time registry of analysis regions.
//!
//! Each region is defined in a TOML file under `regions/`. The registry
//! embeds these at compile time and exposes them via [`all_regions`] and
//! [`region`].

use accessmap_analysis_models::BoundingBox;
use serde::Deserialize;

use crate::GeocodeError;

/// A region configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    /// Region code used in file names (e.g., `"CA"`).
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Box every coordinate in the region is clamped into.
    pub bounds: BoundingBox,
    /// Geocoding service settings.
    pub geocoder: GeocoderConfig,
}

/// Nominatim settings for a region.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
    pub base_url: String,
    /// Comma-separated ISO country filter.
    pub country_codes: String,
    /// Minimum delay between requests in milliseconds.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

/// Public Nominatim instances allow one request per second.
const fn default_rate_limit_ms() -> u64 {
    1000
}

// ── Compile-time embedded TOML files ────────────────────────────────

const REGION_TOMLS: &[(&str, &str)] = &[("ca", include_str!("../regions/ca.toml"))];

#[cfg(test)]
const EXPECTED_REGION_COUNT: usize = 1;

/// Returns all region configurations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_regions() -> Vec<Region> {
    REGION_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse region '{name}': {e}"))
        })
        .collect()
}

/// Looks up a region by code, case-insensitively.
///
/// # Errors
///
/// Returns [`GeocodeError::UnknownRegion`] if no region has that code.
pub fn region(code: &str) -> Result<Region, GeocodeError> {
    all_regions()
        .into_iter()
        .find(|r| r.code.eq_ignore_ascii_case(code))
        .ok_or_else(|| GeocodeError::UnknownRegion {
            code: code.to_string(),
        })
}
