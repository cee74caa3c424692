//! Scripted provider, fixed geocoder and temp data directories for tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accessmap_ai::providers::{GenerationConfig, TextProvider};
use accessmap_ai::{AiError, GenerativeClient};
use accessmap_analysis_models::{CensusRecord, CoordinateMode, Coordinates};
use accessmap_geocoder::rate_limit::RateLimiter;
use accessmap_geocoder::region_registry::{self, Region};
use accessmap_geocoder::{GeocodeCache, GeocodeError, GeocodeLookup};
use accessmap_store::{DataDir, GeocodeCacheFile};

use crate::Services;
use crate::enhancer::CoordinateResolver;

/// Replays scripted responses in order and records every prompt.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(ToString::to_string).map_err(ToString::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _: &GenerationConfig) -> Result<String, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(AiError::Provider { message }),
            None => Err(AiError::Provider {
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// Answers from a fixed table keyed by lowercased query.
#[derive(Default)]
pub struct FixedLookup {
    points: BTreeMap<String, Coordinates>,
    calls: AtomicUsize,
}

impl FixedLookup {
    pub fn new(points: &[(&str, f64, f64)]) -> Arc<Self> {
        Arc::new(Self {
            points: points
                .iter()
                .map(|(q, lat, lng)| (q.to_lowercase(), Coordinates::new(*lat, *lng)))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GeocodeLookup for FixedLookup {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.points.get(&query.to_lowercase()).copied())
    }
}

pub const CENSUS_CSV: &str = "\
place,percent_over_65,percent_disabled,median_income
Fresno city,0.14,0.13,50000
Oakland city,0.13,0.11,90000
Palm Springs city,0.34,0.15,62000
Compton city,0.10,0.12,35000
";

/// The rows of [`CENSUS_CSV`], most vulnerable first.
pub fn census() -> Vec<CensusRecord> {
    let row = |place: &str, p65: f64, pdis: f64, income: f64, score: f64| CensusRecord {
        place: place.to_string(),
        state: "CA".to_string(),
        percent_over_65: p65,
        percent_disabled: pdis,
        median_income: Some(income),
        vulnerability_score: score,
    };
    vec![
        row("Palm Springs", 0.34, 0.15, 62_000.0, 7.05),
        row("Fresno", 0.14, 0.13, 50_000.0, 6.17),
        row("Compton", 0.10, 0.12, 35_000.0, 6.0),
        row("Oakland", 0.13, 0.11, 90_000.0, 4.61),
    ]
}

pub fn temp_data_dir(name: &str) -> DataDir {
    let root = std::env::temp_dir().join(format!(
        "accessmap_agents_{name}_{}",
        uuid::Uuid::new_v4().simple()
    ));
    std::fs::create_dir_all(root.join("census")).unwrap();
    std::fs::write(
        root.join("census").join("Population_Vulnerability_CA_clean_real.csv"),
        CENSUS_CSV,
    )
    .unwrap();
    DataDir::new(root)
}

pub fn california() -> Region {
    region_registry::region("CA").unwrap()
}

/// A lookup that knows every place in [`CENSUS_CSV`].
pub fn census_lookup() -> Arc<FixedLookup> {
    FixedLookup::new(&[
        ("Fresno, CA", 36.74, -119.79),
        ("Oakland, CA", 37.80, -122.27),
        ("Palm Springs, CA", 33.83, -116.55),
        ("Compton, CA", 33.90, -118.22),
    ])
}

/// Geocoded California resolver over `lookup`, caching under `data_dir`
/// and spaced by a near-zero interval.
pub fn geocoded(data_dir: &DataDir, lookup: Arc<FixedLookup>) -> CoordinateResolver {
    let limiter: &'static RateLimiter =
        Box::leak(Box::new(RateLimiter::new(Duration::from_millis(1))));
    let file = GeocodeCacheFile::new(data_dir.geocode_cache("CA"));
    CoordinateResolver::Geocoded {
        bounds: california().bounds,
        cache: Arc::new(GeocodeCache::open(file, lookup, limiter).unwrap()),
    }
}

/// Services over a fresh data directory. Geocoded mode resolves every
/// census place through [`census_lookup`].
pub fn services(
    name: &str,
    provider: Arc<ScriptedProvider>,
    mode: CoordinateMode,
) -> (Arc<Services>, Arc<FixedLookup>) {
    let lookup = census_lookup();
    let client = GenerativeClient::new(provider);
    let services = Services::new(client, temp_data_dir(name), mode).with_lookup(lookup.clone());
    (Arc::new(services), lookup)
}

pub fn cleanup(services: &Services) {
    std::fs::remove_dir_all(services.data_dir.root()).ok();
}
