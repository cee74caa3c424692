#![allow(clippy::module_name_repetitions)]
//! Canonical file paths inside the data directory.
//!
//! The directory defaults to `data/` at the workspace root and can be moved
//! with the `ACCESSMAP_DATA_DIR` environment variable.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ACCESSMAP_DATA_DIR";

/// Census CSV suffixes, most preferred first.
const CENSUS_SUFFIXES: &[&str] = &["_clean_real.csv", "_processed.csv", ".csv"];

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`, falling back to the
/// current directory.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// A data directory and the files the pipeline keeps in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Uses `root` as the data directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `ACCESSMAP_DATA_DIR`, or `data/` under the workspace root.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var_os(DATA_DIR_ENV).map_or_else(
            || Self::new(project_root().join("data")),
            Self::new,
        )
    }

    /// The directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `census/`.
    #[must_use]
    pub fn census_dir(&self) -> PathBuf {
        self.root.join("census")
    }

    /// `results/`.
    #[must_use]
    pub fn results_dir(&self) -> PathBuf {
        self.root.join("results")
    }

    /// `surveys/`.
    #[must_use]
    pub fn surveys_dir(&self) -> PathBuf {
        self.root.join("surveys")
    }

    /// `geocode/`.
    #[must_use]
    pub fn geocode_dir(&self) -> PathBuf {
        self.root.join("geocode")
    }

    /// Census CSV paths for `state`, most preferred first.
    #[must_use]
    pub fn census_candidates(&self, state: &str) -> Vec<PathBuf> {
        let dir = self.census_dir();
        CENSUS_SUFFIXES
            .iter()
            .map(|suffix| dir.join(format!("Population_Vulnerability_{state}{suffix}")))
            .collect()
    }

    /// The aggregate analysis result for `state`.
    #[must_use]
    pub fn analysis_result(&self, state: &str) -> PathBuf {
        self.results_dir()
            .join(format!("multi_agent_analysis_{state}.json"))
    }

    /// A standalone stage output file, e.g. `scan_results_CA.json`.
    #[must_use]
    pub fn stage_output(&self, stem: &str, state: &str) -> PathBuf {
        self.results_dir().join(format!("{stem}_{state}.json"))
    }

    /// Stored survey submissions for `state`.
    #[must_use]
    pub fn survey_submissions(&self, state: &str) -> PathBuf {
        self.surveys_dir()
            .join(format!("survey_submissions_{state}.json"))
    }

    /// Persisted geocode cache for `state`.
    #[must_use]
    pub fn geocode_cache(&self, state: &str) -> PathBuf {
        self.geocode_dir()
            .join(format!("geocode_cache_{state}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layout() {
        let dir = DataDir::new("/data");
        assert_eq!(
            dir.analysis_result("CA"),
            PathBuf::from("/data/results/multi_agent_analysis_CA.json")
        );
        assert_eq!(
            dir.stage_output("priority_areas", "CA"),
            PathBuf::from("/data/results/priority_areas_CA.json")
        );
        assert_eq!(
            dir.survey_submissions("CA"),
            PathBuf::from("/data/surveys/survey_submissions_CA.json")
        );
        assert_eq!(
            dir.geocode_cache("CA"),
            PathBuf::from("/data/geocode/geocode_cache_CA.json")
        );
    }

    #[test]
    fn census_candidates_prefer_clean_real() {
        let candidates = DataDir::new("/d").census_candidates("CA");
        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].ends_with("Population_Vulnerability_CA_clean_real.csv"));
        assert!(candidates[2].ends_with("Population_Vulnerability_CA.csv"));
    }
}
