//! Reads the census CSV for a region.

use std::path::Path;

use accessmap_analysis_models::CensusRecord;
use accessmap_store::DataDir;
use serde::Deserialize;

use crate::{CensusError, clean_place_name, vulnerability_score};

/// One CSV row before validation. Every column but `place` may be absent.
#[derive(Debug, Deserialize)]
struct RawRow {
    place: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    percent_over_65: Option<f64>,
    #[serde(default)]
    percent_disabled: Option<f64>,
    #[serde(default)]
    median_income: Option<f64>,
    #[serde(default)]
    vulnerability_score: Option<f64>,
}

/// Shares above 1 are taken to be percentages.
fn as_share(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 1.0 => (v / 100.0).min(1.0),
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// The census API marks unavailable incomes with large negative sentinels.
fn as_income(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl RawRow {
    fn into_record(self, default_state: &str) -> Option<CensusRecord> {
        let place = clean_place_name(&self.place);
        if place.is_empty() {
            return None;
        }

        let percent_over_65 = as_share(self.percent_over_65);
        let percent_disabled = as_share(self.percent_disabled);
        let median_income = as_income(self.median_income);
        let vulnerability_score = self
            .vulnerability_score
            .filter(|v| v.is_finite())
            .map_or_else(
                || vulnerability_score(percent_over_65, percent_disabled, median_income),
                |v| v.clamp(0.0, 10.0),
            );

        Some(CensusRecord {
            place,
            state: self
                .state
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default_state.to_string()),
            percent_over_65,
            percent_disabled,
            median_income,
            vulnerability_score,
        })
    }
}

/// Parses one census CSV. Rows without a place name are skipped.
///
/// # Errors
///
/// Returns [`CensusError::Csv`] if the file cannot be read or a row is
/// malformed.
pub fn read_census_csv(path: &Path, state: &str) -> Result<Vec<CensusRecord>, CensusError> {
    let csv_error = |source| CensusError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<RawRow>() {
        match row.map_err(csv_error)?.into_record(state) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} rows without a place name in {}", path.display());
    }
    Ok(records)
}

/// Loads the census dataset for `state` from the first existing candidate
/// file (`_clean_real.csv`, then `_processed.csv`, then `.csv`).
///
/// # Errors
///
/// Returns [`CensusError::MissingInput`] if no candidate exists or the file
/// has no rows, or a read error from [`read_census_csv`].
pub fn load_census(dir: &DataDir, state: &str) -> Result<Vec<CensusRecord>, CensusError> {
    let candidates = dir.census_candidates(state);
    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
        return Err(CensusError::MissingInput {
            state: state.to_string(),
            searched: candidates,
        });
    };

    log::info!("Loading census data from {}", path.display());
    let records = read_census_csv(path, state)?;
    if records.is_empty() {
        return Err(CensusError::MissingInput {
            state: state.to_string(),
            searched: vec![path.clone()],
        });
    }

    log::info!("Loaded {} census places for {state}", records.len());
    Ok(records)
}

/// Sorts most vulnerable first. Ties keep file order.
pub fn sort_by_vulnerability(records: &mut [CensusRecord]) {
    records.sort_by(|a, b| b.vulnerability_score.total_cmp(&a.vulnerability_score));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir(name: &str) -> DataDir {
        let root = std::env::temp_dir().join(format!(
            "accessmap_census_{name}_{}",
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::create_dir_all(root.join("census")).unwrap();
        DataDir::new(root)
    }

    const SAMPLE: &str = "\
place,percent_over_65,percent_disabled,median_income
\"Los Angeles city, California\",0.13,0.11,69778
Fresno city,0.12,0.13,-666666666
,0.2,0.2,20000
Palm Springs,34.5,15.2,62000
";

    #[test]
    fn missing_file_is_missing_input() {
        let dir = data_dir("missing");
        let err = load_census(&dir, "CA").unwrap_err();
        match err {
            CensusError::MissingInput { state, searched } => {
                assert_eq!(state, "CA");
                assert_eq!(searched.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_dir_all(dir.root()).ok();
    }

    #[test]
    fn loads_cleans_and_scores() {
        let dir = data_dir("load");
        std::fs::write(dir.census_dir().join("Population_Vulnerability_CA.csv"), SAMPLE).unwrap();

        let records = load_census(&dir, "CA").unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].place, "Los Angeles");
        assert_eq!(records[0].state, "CA");
        assert_eq!(records[0].median_income, Some(69_778.0));

        assert_eq!(records[1].place, "Fresno");
        assert_eq!(records[1].median_income, None);

        assert!((records[2].percent_over_65 - 0.345).abs() < 1e-9);
        assert!(records.iter().all(|r| (0.0..=10.0).contains(&r.vulnerability_score)));
        std::fs::remove_dir_all(dir.root()).ok();
    }

    #[test]
    fn prefers_clean_real_file() {
        let dir = data_dir("prefer");
        std::fs::write(dir.census_dir().join("Population_Vulnerability_CA.csv"), SAMPLE).unwrap();
        std::fs::write(
            dir.census_dir().join("Population_Vulnerability_CA_clean_real.csv"),
            "place,percent_over_65,percent_disabled,median_income,vulnerability_score\nOakland,0.14,0.12,90000,4.5\n",
        )
        .unwrap();

        let records = load_census(&dir, "CA").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].place, "Oakland");
        assert!((records[0].vulnerability_score - 4.5).abs() < 1e-9);
        std::fs::remove_dir_all(dir.root()).ok();
    }

    #[test]
    fn sorts_most_vulnerable_first() {
        let dir = data_dir("sort");
        std::fs::write(dir.census_dir().join("Population_Vulnerability_CA.csv"), SAMPLE).unwrap();
        let mut records = load_census(&dir, "CA").unwrap();
        sort_by_vulnerability(&mut records);
        assert_eq!(records[0].place, "Palm Springs");
        std::fs::remove_dir_all(dir.root()).ok();
    }
}
