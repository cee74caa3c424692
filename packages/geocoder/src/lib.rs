#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Positions for analysis records.
//!
//! Two coordinate policies exist and a run uses exactly one of them:
//!
//! 1. **Geocoded** (default): place names resolve through a persistent
//!    [`cache::GeocodeCache`] backed by Nominatim / `OpenStreetMap`, spaced
//!    by the process-wide [`rate_limit::RateLimiter`]. A miss drops the
//!    record.
//! 2. **Pseudo**: [`pseudo::pseudo_coordinate`] derives a stable point from
//!    the place name. Meant for deployments without network access.
//!
//! Regions (bounding box, geocoder endpoint, rate limit) are loaded from
//! the [`region_registry`].

pub mod cache;
pub mod nominatim;
pub mod pseudo;
pub mod rate_limit;
pub mod region_registry;

pub use accessmap_analysis_models::CoordinateMode;
pub use cache::GeocodeCache;
pub use pseudo::{DemographicBias, pseudo_coordinate};

use accessmap_analysis_models::Coordinates;
use accessmap_store::StoreError;
use thiserror::Error;

/// Environment variable selecting the [`CoordinateMode`].
pub const COORDINATE_MODE_ENV: &str = "ACCESSMAP_COORDINATE_MODE";

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// No region with this code is registered.
    #[error("Unknown region: {code}")]
    UnknownRegion {
        /// Requested code.
        code: String,
    },

    /// `ACCESSMAP_COORDINATE_MODE` holds an unrecognized value.
    #[error("Invalid coordinate mode '{value}' (expected 'geocoded' or 'pseudo')")]
    InvalidMode {
        /// The offending value.
        value: String,
    },

    /// Reading the persisted cache failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An external service that turns a free-form query into a position.
#[async_trait::async_trait]
pub trait GeocodeLookup: Send + Sync {
    /// Best match for `query`, or `None` when the service found nothing.
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Reads the coordinate mode from `ACCESSMAP_COORDINATE_MODE`, defaulting to
/// [`CoordinateMode::Geocoded`] when unset.
///
/// # Errors
///
/// Returns [`GeocodeError::InvalidMode`] for an unrecognized value.
pub fn coordinate_mode_from_env() -> Result<CoordinateMode, GeocodeError> {
    parse_coordinate_mode(std::env::var(COORDINATE_MODE_ENV).ok().as_deref())
}

fn parse_coordinate_mode(value: Option<&str>) -> Result<CoordinateMode, GeocodeError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(CoordinateMode::default()),
        Some(v) => v.parse().map_err(|_| GeocodeError::InvalidMode {
            value: v.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_mode_parsing() {
        assert_eq!(parse_coordinate_mode(None).unwrap(), CoordinateMode::Geocoded);
        assert_eq!(parse_coordinate_mode(Some(" ")).unwrap(), CoordinateMode::Geocoded);
        assert_eq!(parse_coordinate_mode(Some("Pseudo")).unwrap(), CoordinateMode::Pseudo);
        assert!(matches!(
            parse_coordinate_mode(Some("random")),
            Err(GeocodeError::InvalidMode { .. })
        ));
    }
}
