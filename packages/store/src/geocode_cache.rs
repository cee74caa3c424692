//! The persisted geocode cache file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use accessmap_analysis_models::Coordinates;

use crate::json_file::{read_json, write_json_atomic};
use crate::StoreError;

/// `geocode/geocode_cache_{state}.json`: normalized query to coordinates.
///
/// The in-memory map lives in the geocoder; this type only knows how to read
/// and atomically replace the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeCacheFile {
    path: PathBuf,
}

impl GeocodeCacheFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored entries. A missing file is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<BTreeMap<String, Coordinates>, StoreError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Replaces the file with `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails; the previous file is left
    /// untouched in that case.
    pub fn persist(&self, entries: &BTreeMap<String, Coordinates>) -> Result<(), StoreError> {
        write_json_atomic(&self.path, entries)
    }
}
