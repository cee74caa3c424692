#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistence for the analysis pipeline.
//!
//! Everything lives as JSON under one data directory (see [`paths`]).
//! Writers replace files atomically (temp file + rename) and serialize
//! through per-store mutexes, so readers only ever see the last complete
//! version of a document.

pub mod geocode_cache;
pub mod jobs;
pub mod json_file;
pub mod paths;
pub mod results;
pub mod stages;
pub mod surveys;

pub use geocode_cache::GeocodeCacheFile;
pub use jobs::{JobKind, JobRegistry, JobState, JobStatus};
pub use paths::DataDir;
pub use results::ResultStore;
pub use stages::{Stage, StageStore};
pub use surveys::SurveyStore;

use std::path::PathBuf;

/// Errors that can occur reading or writing stored documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A stored document is not valid JSON of the expected shape.
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Serializing a document failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
