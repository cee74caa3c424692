//! Priority scoring.
//!
//! The priority score is the equally weighted mean of four 0-10 component
//! scores: elderly share, disability share, income (lower income scores
//! higher) and the worst gap severity observed at the location.

use crate::{PriorityLevel, Severity};

/// Income assumed when a census row has none.
pub const DEFAULT_MEDIAN_INCOME: f64 = 50_000.0;

/// Severity score used when no gap matched the location.
pub const DEFAULT_SEVERITY_SCORE: f64 = 2.0;

const COMPONENT_WEIGHT: f64 = 0.25;

/// `min(10, pct_over_65 * 100 / 2)`.
#[must_use]
pub fn elderly_score(percent_over_65: f64) -> f64 {
    (percent_over_65 * 100.0 / 2.0).min(10.0)
}

/// `min(10, pct_disabled * 100 / 1.5)`.
#[must_use]
pub fn disability_score(percent_disabled: f64) -> f64 {
    (percent_disabled * 100.0 / 1.5).min(10.0)
}

/// `max(0, (70000 - income) / 7000)`.
#[must_use]
pub fn income_score(median_income: Option<f64>) -> f64 {
    let income = median_income.unwrap_or(DEFAULT_MEDIAN_INCOME);
    ((70_000.0 - income) / 7_000.0).max(0.0)
}

/// Worst severity weight among the given gaps, or
/// [`DEFAULT_SEVERITY_SCORE`] when there are none.
#[must_use]
pub fn severity_score<I: IntoIterator<Item = Severity>>(severities: I) -> f64 {
    severities
        .into_iter()
        .map(Severity::weight)
        .reduce(f64::max)
        .unwrap_or(DEFAULT_SEVERITY_SCORE)
}

/// The four component scores of one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Share of residents 65+, 0-1.
    pub percent_over_65: f64,
    /// Share of residents with a disability, 0-1.
    pub percent_disabled: f64,
    /// Median household income.
    pub median_income: Option<f64>,
    /// Result of [`severity_score`].
    pub severity_score: f64,
}

impl ScoreInputs {
    /// Computes the unrounded 0-10 priority score.
    #[must_use]
    pub fn priority_score(&self) -> f64 {
        COMPONENT_WEIGHT.mul_add(
            elderly_score(self.percent_over_65),
            COMPONENT_WEIGHT.mul_add(
                disability_score(self.percent_disabled),
                COMPONENT_WEIGHT.mul_add(
                    income_score(self.median_income),
                    COMPONENT_WEIGHT * self.severity_score,
                ),
            ),
        )
    }

    /// Score plus the level it maps to.
    #[must_use]
    pub fn evaluate(&self) -> (f64, PriorityLevel) {
        let score = self.priority_score();
        (score, PriorityLevel::from_score(score))
    }
}
