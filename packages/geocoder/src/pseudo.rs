//! Deterministic stand-in coordinates for deployments without geocoding.
//!
//! Never mixed with geocoded positions in one run; see
//! [`accessmap_analysis_models::CoordinateMode`].

use accessmap_analysis_models::{BoundingBox, Coordinates, scoring::DEFAULT_MEDIAN_INCOME};

/// Share of residents over 65 above which a place is pushed south.
const ELDERLY_SHIFT_THRESHOLD: f64 = 0.20;

/// Median income above which a place is pushed west.
const INCOME_SHIFT_THRESHOLD: f64 = 80_000.0;

/// Fraction of the box span a biased place is shifted by.
const SHIFT_FRACTION: f64 = 0.1;

const SEED_MODULUS: u32 = 100_000;

/// Demographics that nudge a pseudo-coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DemographicBias {
    /// Share of residents aged 65 and over, 0-1.
    pub percent_over_65: f64,
    /// Median household income.
    pub median_income: Option<f64>,
}

/// First 32 bits of the MD5 digest of `name`, big-endian.
#[must_use]
pub fn name_seed(name: &str) -> u32 {
    let mut context = md5::Context::new();
    context.consume(name.as_bytes());
    let digest = context.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Maps `name` to a stable point inside `bounds`.
///
/// Older places (more than 20% over 65) shift south and higher-income places
/// (over $80k) shift west by a tenth of the box span, then the point is
/// clamped back into the box.
#[must_use]
pub fn pseudo_coordinate(name: &str, bounds: &BoundingBox, bias: DemographicBias) -> Coordinates {
    let seed = name_seed(name);
    let lat_seed = f64::from(seed % SEED_MODULUS) / f64::from(SEED_MODULUS);
    let lng_seed = f64::from((seed / SEED_MODULUS) % SEED_MODULUS) / f64::from(SEED_MODULUS);

    let mut lat = lat_seed.mul_add(bounds.lat_span(), bounds.lat_min);
    let mut lng = lng_seed.mul_add(bounds.lng_span(), bounds.lng_min);

    if bias.percent_over_65 > ELDERLY_SHIFT_THRESHOLD {
        lat -= bounds.lat_span() * SHIFT_FRACTION;
    }
    if bias.median_income.unwrap_or(DEFAULT_MEDIAN_INCOME) > INCOME_SHIFT_THRESHOLD {
        lng -= bounds.lng_span() * SHIFT_FRACTION;
    }

    bounds.clamp(Coordinates::new(lat, lng))
}
