//! Nominatim / OpenStreetMap geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum. The
//! client itself does not wait; [`crate::cache::GeocodeCache`] spaces calls
//! through the process-wide [`crate::rate_limit::RateLimiter`].
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use accessmap_analysis_models::Coordinates;

use crate::region_registry::GeocoderConfig;
use crate::{GeocodeError, GeocodeLookup};

const USER_AGENT: &str = concat!("accessmap/", env!("CARGO_PKG_VERSION"));

/// Free-form Nominatim search restricted to a country filter.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
}

impl NominatimClient {
    /// Builds a client from a region's geocoder settings.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            country_codes: config.country_codes.clone(),
        })
    }
}

#[async_trait::async_trait]
impl GeocodeLookup for NominatimClient {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("countrycodes", self.country_codes.as_str()),
                ("format", "jsonv2"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinates>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let field = |name: &str| {
        first[name]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| GeocodeError::Parse {
                message: format!("Missing {name} in Nominatim response"),
            })
    };

    Ok(Some(Coordinates::new(field("lat")?, field("lon")?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "36.7378",
            "lon": "-119.7871",
            "display_name": "Fresno, Fresno County, California, United States"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.lat - 36.7378).abs() < 1e-4);
        assert!((result.lng - -119.7871).abs() < 1e-4);
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array() {
        let body = serde_json::json!({"error": "Unable to geocode"});
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
