//! Derived 0-10 vulnerability score of a place.

use accessmap_analysis_models::scoring::{disability_score, elderly_score, income_score};

/// Mean of the elderly, disability and income component scores, 0-10.
///
/// Uses the same component curves as priority scoring so the two rank places
/// consistently.
#[must_use]
pub fn vulnerability_score(
    percent_over_65: f64,
    percent_disabled: f64,
    median_income: Option<f64>,
) -> f64 {
    let total = elderly_score(percent_over_65)
        + disability_score(percent_disabled)
        + income_score(median_income);
    (total / 3.0).clamp(0.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_components() {
        // elderly 10, disability 0, income 0
        let score = vulnerability_score(0.20, 0.0, Some(70_000.0));
        assert!((score - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn saturates_at_ten() {
        let score = vulnerability_score(0.9, 0.9, Some(0.0));
        assert!((score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn more_vulnerable_places_score_higher() {
        let low = vulnerability_score(0.05, 0.05, Some(120_000.0));
        let high = vulnerability_score(0.25, 0.18, Some(30_000.0));
        assert!(high > low);
    }
}
