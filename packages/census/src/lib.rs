#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Census vulnerability data for a region.
//!
//! The dataset is a CSV under `census/` in the data directory with one row
//! per place: `place`, `percent_over_65`, `percent_disabled`,
//! `median_income`, and optionally `state` and `vulnerability_score`.
//! Acquiring the file is outside this crate; a missing file is a
//! [`CensusError::MissingInput`].

pub mod loader;
pub mod place;
pub mod vulnerability;

pub use loader::{load_census, read_census_csv, sort_by_vulnerability};
pub use place::clean_place_name;
pub use vulnerability::vulnerability_score;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur loading census data.
#[derive(Debug, Error)]
pub enum CensusError {
    /// No usable census dataset exists for the region.
    #[error("No census data for {state} (looked for {})", display_paths(.searched))]
    MissingInput {
        /// Region code.
        state: String,
        /// Files that were tried.
        searched: Vec<PathBuf>,
    },

    /// The CSV is malformed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },

    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
