//! Persistent, rate-limited geocode cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use accessmap_analysis_models::Coordinates;
use accessmap_store::GeocodeCacheFile;
use tokio::sync::{Mutex, RwLock};

use crate::rate_limit::RateLimiter;
use crate::{GeocodeError, GeocodeLookup};

/// Cache key for a query: trimmed, lowercased, inner whitespace collapsed.
#[must_use]
pub fn normalize_key(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Query to coordinate map backed by a file and an external lookup.
///
/// Hits never touch the network. Misses are serialized behind one lookup
/// lock, re-checked, spaced by the rate limiter and written through to the
/// file before returning. Failed or empty lookups are not cached.
pub struct GeocodeCache {
    file: GeocodeCacheFile,
    entries: RwLock<BTreeMap<String, Coordinates>>,
    lookup_lock: Mutex<()>,
    limiter: &'static RateLimiter,
    lookup: Arc<dyn GeocodeLookup>,
}

impl std::fmt::Debug for GeocodeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeCache")
            .field("file", &self.file)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl GeocodeCache {
    /// Loads `file` and wraps `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Store`] if the cache file exists but is
    /// unreadable; starting empty would overwrite it on the next write.
    pub fn open(
        file: GeocodeCacheFile,
        lookup: Arc<dyn GeocodeLookup>,
        limiter: &'static RateLimiter,
    ) -> Result<Self, GeocodeError> {
        let entries = file.load()?;
        log::debug!(
            "Loaded {} geocode cache entries from {}",
            entries.len(),
            file.path().display()
        );
        Ok(Self {
            file,
            entries: RwLock::new(entries),
            lookup_lock: Mutex::new(()),
            limiter,
            lookup,
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Resolves `query`, consulting the cache before the network.
    pub async fn resolve(&self, query: &str) -> Option<Coordinates> {
        let key = normalize_key(query);
        if key.is_empty() {
            return None;
        }

        if let Some(hit) = self.entries.read().await.get(&key).copied() {
            return Some(hit);
        }

        let _lookup = self.lookup_lock.lock().await;
        if let Some(hit) = self.entries.read().await.get(&key).copied() {
            return Some(hit);
        }

        self.limiter.wait().await;
        let found = match self.lookup.lookup(query.trim()).await {
            Ok(Some(coords)) => coords,
            Ok(None) => {
                log::debug!("No geocode result for '{query}'");
                return None;
            }
            Err(e) => {
                log::warn!("Geocode lookup failed for '{query}': {e}");
                return None;
            }
        };

        let mut entries = self.entries.write().await;
        entries.insert(key, found);
        if let Err(e) = self.file.persist(&entries) {
            log::error!(
                "Failed to persist geocode cache to {}: {e}",
                self.file.path().display()
            );
        }
        Some(found)
    }
}
