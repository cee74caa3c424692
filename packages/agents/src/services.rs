//! Shared handles every agent and job needs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use accessmap_ai::{GenerativeClient, create_provider_from_env};
use accessmap_analysis_models::CoordinateMode;
use accessmap_geocoder::nominatim::NominatimClient;
use accessmap_geocoder::rate_limit::RateLimiter;
use accessmap_geocoder::region_registry::Region;
use accessmap_geocoder::{GeocodeCache, GeocodeLookup, coordinate_mode_from_env};
use accessmap_store::{DataDir, GeocodeCacheFile, ResultStore, StageStore, SurveyStore};
use tokio::sync::Mutex;

use crate::AgentError;
use crate::enhancer::CoordinateResolver;

/// The model client, stores and per-region geocode caches.
///
/// Built once per process and shared behind an `Arc`.
pub struct Services {
    pub client: GenerativeClient,
    pub data_dir: DataDir,
    pub coordinate_mode: CoordinateMode,
    pub results: ResultStore,
    pub surveys: SurveyStore,
    pub stages: StageStore,
    geocoders: Mutex<BTreeMap<String, Arc<GeocodeCache>>>,
    lookup_override: Option<Arc<dyn GeocodeLookup>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("client", &self.client)
            .field("data_dir", &self.data_dir)
            .field("coordinate_mode", &self.coordinate_mode)
            .finish_non_exhaustive()
    }
}

impl Services {
    #[must_use]
    pub fn new(client: GenerativeClient, data_dir: DataDir, coordinate_mode: CoordinateMode) -> Self {
        Self {
            client,
            results: ResultStore::new(data_dir.clone()),
            surveys: SurveyStore::new(data_dir.clone()),
            stages: StageStore::new(data_dir.clone()),
            data_dir,
            coordinate_mode,
            geocoders: Mutex::new(BTreeMap::new()),
            lookup_override: None,
        }
    }

    /// Geocodes through `lookup` instead of each region's Nominatim endpoint.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn GeocodeLookup>) -> Self {
        self.lookup_override = Some(lookup);
        self
    }

    /// Provider from `AI_PROVIDER` and friends, data directory from
    /// `ACCESSMAP_DATA_DIR`, coordinate mode from
    /// `ACCESSMAP_COORDINATE_MODE`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if no provider is configured or the coordinate
    /// mode is invalid.
    pub fn from_env() -> Result<Self, AgentError> {
        let provider = create_provider_from_env()?;
        let client = GenerativeClient::new(Arc::from(provider));
        let mode = coordinate_mode_from_env()?;
        log::info!(
            "Using {} provider, {mode} coordinates",
            client.provider_name()
        );
        Ok(Self::new(client, DataDir::from_env(), mode))
    }

    /// Coordinate resolver for one run over `region`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Geocode`] if the region's geocode cache cannot
    /// be opened or its HTTP client cannot be built.
    pub async fn resolver(&self, region: &Region) -> Result<CoordinateResolver, AgentError> {
        let bounds = region.bounds;
        match self.coordinate_mode {
            CoordinateMode::Pseudo => Ok(CoordinateResolver::Pseudo { bounds }),
            CoordinateMode::Geocoded => Ok(CoordinateResolver::Geocoded {
                bounds,
                cache: self.geocode_cache(region).await?,
            }),
        }
    }

    async fn geocode_cache(&self, region: &Region) -> Result<Arc<GeocodeCache>, AgentError> {
        let mut caches = self.geocoders.lock().await;
        if let Some(cache) = caches.get(&region.code) {
            return Ok(Arc::clone(cache));
        }

        let lookup: Arc<dyn GeocodeLookup> = match &self.lookup_override {
            Some(lookup) => Arc::clone(lookup),
            None => Arc::new(NominatimClient::new(&region.geocoder)?),
        };
        let limiter =
            RateLimiter::process_wide(Duration::from_millis(region.geocoder.rate_limit_ms));
        let file = GeocodeCacheFile::new(self.data_dir.geocode_cache(&region.code));

        let cache = Arc::new(GeocodeCache::open(file, lookup, limiter)?);
        caches.insert(region.code.clone(), Arc::clone(&cache));
        Ok(cache)
    }
}
