#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Domain types for the accessibility equity analysis.
//!
//! Every stage of the agent pipeline produces one of the record types
//! defined here: [`AccessibilityGap`] (scan), [`PriorityArea`]
//! (prioritization) and [`Recommendation`] (planning). The persisted
//! aggregate is [`AnalysisResult`]. The closed enumerations carry
//! lenient `coerce` constructors used when reading free-form model output;
//! anything they reject is dropped by the caller rather than stored.

pub mod result;
pub mod scoring;
pub mod survey;

pub use result::AnalysisResult;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::survey::{SurveyIssue, SurveyLocation};

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a new point.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The geographic box every coordinate in a region must fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
    /// Western edge.
    pub lng_min: f64,
    /// Eastern edge.
    pub lng_max: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its edges.
    #[must_use]
    pub const fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        }
    }

    /// Height of the box in degrees.
    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Width of the box in degrees.
    #[must_use]
    pub fn lng_span(&self) -> f64 {
        self.lng_max - self.lng_min
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            self.lat_span().mul_add(0.5, self.lat_min),
            self.lng_span().mul_add(0.5, self.lng_min),
        )
    }

    /// Returns `true` if the point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.lat)
            && (self.lng_min..=self.lng_max).contains(&point.lng)
    }

    /// Clamps a point into the box.
    ///
    /// Non-finite components collapse to the box center on that axis.
    #[must_use]
    pub fn clamp(&self, point: Coordinates) -> Coordinates {
        let center = self.center();
        let lat = if point.lat.is_finite() {
            point.lat.clamp(self.lat_min, self.lat_max)
        } else {
            center.lat
        };
        let lng = if point.lng.is_finite() {
            point.lng.clamp(self.lng_min, self.lng_max)
        } else {
            center.lng
        };
        Coordinates::new(lat, lng)
    }
}

/// How severe an accessibility gap is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Blocks access outright.
    Critical,
    /// Impedes access.
    Moderate,
    /// Minor or already largely accessible.
    Good,
}

impl Severity {
    /// Scoring weight used by the priority formula.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Critical => 10.0,
            Self::Moderate => 6.0,
            Self::Good => 2.0,
        }
    }

    /// Leniently interprets a model-supplied severity string.
    ///
    /// Returns `None` when the value cannot be mapped onto the enumeration.
    #[must_use]
    pub fn coerce(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" | "high" | "severe" | "urgent" => Some(Self::Critical),
            "moderate" | "medium" => Some(Self::Moderate),
            "good" | "low" | "minor" => Some(Self::Good),
            _ => None,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Critical, Self::Moderate, Self::Good]
    }
}

/// The fixed set of barrier kinds the scan stage may report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum IssueType {
    /// No ramp at a curb crossing.
    #[serde(rename = "Missing Curb Ramps")]
    #[strum(serialize = "Missing Curb Ramps")]
    MissingCurbRamps,
    /// Cracked, heaved or missing sidewalk.
    #[serde(rename = "Broken Sidewalk")]
    #[strum(serialize = "Broken Sidewalk")]
    BrokenSidewalk,
    /// Stops or vehicles that cannot be boarded.
    #[serde(rename = "Inaccessible Transit")]
    #[strum(serialize = "Inaccessible Transit")]
    InaccessibleTransit,
    /// No detectable warning surface.
    #[serde(rename = "No Tactile Paving")]
    #[strum(serialize = "No Tactile Paving")]
    NoTactilePaving,
    /// Slope beyond what mobility devices can manage.
    #[serde(rename = "Steep Grade")]
    #[strum(serialize = "Steep Grade")]
    SteepGrade,
    /// Insufficient lighting along a route.
    #[serde(rename = "Poor Lighting")]
    #[strum(serialize = "Poor Lighting")]
    PoorLighting,
    /// Too few or unusable accessible parking spaces.
    #[serde(rename = "Missing Accessible Parking")]
    #[strum(serialize = "Missing Accessible Parking")]
    MissingAccessibleParking,
    /// Obstructed pedestrian route.
    #[serde(rename = "Blocked Walkway")]
    #[strum(serialize = "Blocked Walkway")]
    BlockedWalkway,
}

impl IssueType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MissingCurbRamps,
            Self::BrokenSidewalk,
            Self::InaccessibleTransit,
            Self::NoTactilePaving,
            Self::SteepGrade,
            Self::PoorLighting,
            Self::MissingAccessibleParking,
            Self::BlockedWalkway,
        ]
    }

    /// Leniently interprets a model-supplied issue type.
    ///
    /// Accepts the canonical label in any case, `snake_case` spellings, and
    /// falls back to keyword matching. Returns `None` for anything that does
    /// not resemble one of the known barrier kinds.
    #[must_use]
    pub fn coerce(raw: &str) -> Option<Self> {
        const KEYWORDS: &[(&[&str], IssueType)] = &[
            (&["tactile"], IssueType::NoTactilePaving),
            (&["curb", "ramp"], IssueType::MissingCurbRamps),
            (&["sidewalk"], IssueType::BrokenSidewalk),
            (
                &["transit", "bus", "train", "station"],
                IssueType::InaccessibleTransit,
            ),
            (&["grade", "slope", "incline"], IssueType::SteepGrade),
            (&["light"], IssueType::PoorLighting),
            (&["parking"], IssueType::MissingAccessibleParking),
            (
                &["walkway", "blocked", "obstruct", "pathway"],
                IssueType::BlockedWalkway,
            ),
        ];

        let normalized = raw
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");

        if let Some(exact) = Self::all()
            .iter()
            .find(|t| t.as_ref().eq_ignore_ascii_case(&normalized))
        {
            return Some(*exact);
        }

        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|w| normalized.contains(w)))
            .map(|(_, issue)| *issue)
    }
}

/// Intervention urgency, mapped from a priority score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum PriorityLevel {
    /// Score of 8 or more.
    #[serde(rename = "Immediate")]
    #[strum(serialize = "Immediate")]
    Immediate,
    /// Score of 6 up to 8.
    #[serde(rename = "Short-term")]
    #[strum(serialize = "Short-term")]
    ShortTerm,
    /// Score of 4 up to 6.
    #[serde(rename = "Medium-term")]
    #[strum(serialize = "Medium-term")]
    MediumTerm,
    /// Anything below 4.
    #[serde(rename = "Long-term")]
    #[strum(serialize = "Long-term")]
    LongTerm,
}

impl PriorityLevel {
    /// Maps a 0-10 priority score onto a level.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::Immediate
        } else if score >= 6.0 {
            Self::ShortTerm
        } else if score >= 4.0 {
            Self::MediumTerm
        } else {
            Self::LongTerm
        }
    }

    /// The recommended timeline for acting on this level.
    #[must_use]
    pub const fn timeline(self) -> &'static str {
        match self {
            Self::Immediate => "0-3 months",
            Self::ShortTerm => "3-6 months",
            Self::MediumTerm => "6-12 months",
            Self::LongTerm => "12+ months",
        }
    }

    /// Leniently interprets a model-supplied level ("short term",
    /// "Short-Term", "short_term", ...).
    #[must_use]
    pub fn coerce(raw: &str) -> Option<Self> {
        let compact: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "immediate" => Some(Self::Immediate),
            "shortterm" => Some(Self::ShortTerm),
            "mediumterm" => Some(Self::MediumTerm),
            "longterm" => Some(Self::LongTerm),
            _ => None,
        }
    }

    /// Returns all variants of this enum, most urgent first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Immediate,
            Self::ShortTerm,
            Self::MediumTerm,
            Self::LongTerm,
        ]
    }
}

/// Expected impact of an intervention.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Impact {
    /// High impact.
    High,
    /// Medium impact.
    Medium,
    /// Low impact.
    Low,
}

impl Impact {
    /// Impact of acting on a priority area with the given score.
    #[must_use]
    pub fn from_priority_score(score: f64) -> Self {
        if score >= 7.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Leniently interprets a model-supplied impact.
    #[must_use]
    pub fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// Category of a recommendation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RecommendationType {
    /// Physical improvements.
    Infrastructure,
    /// Regulation, standards and enforcement.
    Policy,
    /// Apps, sensors, smart systems.
    #[serde(alias = "tech")]
    #[strum(to_string = "technology", serialize = "tech")]
    Technology,
    /// Outreach, education and volunteer programs.
    Community,
}

impl RecommendationType {
    /// Leniently interprets a model-supplied recommendation type.
    #[must_use]
    pub fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// Which pipeline participant produced a record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AgentName {
    /// Scan stage.
    AccessScanner,
    /// Prioritization stage.
    EquityAdvisor,
    /// Planning stage.
    PlannerBot,
    /// Single-submission survey enrichment.
    SurveyBot,
}

/// How records without model-supplied coordinates are positioned.
///
/// A run uses exactly one mode; it is recorded in the result metadata.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CoordinateMode {
    /// Resolve through the geocode cache; unresolved records are dropped.
    #[default]
    Geocoded,
    /// Derive a deterministic position from the location name.
    Pseudo,
}

/// One census place with its vulnerability indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusRecord {
    /// Place name (e.g. "Los Angeles").
    pub place: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Share of residents aged 65 and over, 0-1.
    pub percent_over_65: f64,
    /// Share of residents with a disability, 0-1.
    pub percent_disabled: f64,
    /// Median household income in dollars.
    pub median_income: Option<f64>,
    /// Derived 0-10 vulnerability score.
    pub vulnerability_score: f64,
}

impl CensusRecord {
    /// Elderly share as a percentage.
    #[must_use]
    pub fn elderly_pct(&self) -> f64 {
        self.percent_over_65 * 100.0
    }

    /// Disabled share as a percentage.
    #[must_use]
    pub fn disabled_pct(&self) -> f64 {
        self.percent_disabled * 100.0
    }

    /// Median income, falling back to [`scoring::DEFAULT_MEDIAN_INCOME`].
    #[must_use]
    pub fn income_or_default(&self) -> f64 {
        self.median_income
            .unwrap_or(scoring::DEFAULT_MEDIAN_INCOME)
    }

    /// `"{place}, {state}"`.
    #[must_use]
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.place, self.state)
    }

    /// `"18.2% elderly, 12.1% disabled"`.
    #[must_use]
    pub fn vulnerable_population(&self) -> String {
        format!(
            "{:.1}% elderly, {:.1}% disabled",
            self.elderly_pct(),
            self.disabled_pct()
        )
    }

    /// Risk factors attached to scan results at this place.
    #[must_use]
    pub fn risk_factors(&self) -> Vec<String> {
        let mut factors = Vec::new();
        if self.percent_over_65 > 0.15 {
            factors.push("High elderly population".to_string());
        }
        if self.percent_disabled > 0.10 {
            factors.push("High disability rate".to_string());
        }
        if self.median_income.is_some_and(|income| income < 40_000.0) {
            factors.push("Low income area".to_string());
        }
        if factors.is_empty() {
            factors.push("Standard risk profile".to_string());
        }
        factors
    }

    /// Equity factors attached to priority areas at this place.
    #[must_use]
    pub fn equity_factors(&self) -> Vec<String> {
        let mut factors = Vec::new();
        if self.elderly_pct() > 15.0 {
            factors.push("High elderly population".to_string());
        }
        if self.disabled_pct() > 10.0 {
            factors.push("High disability rate".to_string());
        }
        if self.income_or_default() < 40_000.0 {
            factors.push("Low income".to_string());
        }
        if factors.is_empty() {
            factors.push("Standard demographics".to_string());
        }
        factors
    }
}

/// An accessibility barrier found by the scan stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityGap {
    /// `scan_{n}`.
    pub id: String,
    /// `"{place}, {state}"`.
    pub location: String,
    /// Where the barrier is.
    pub coordinates: Coordinates,
    /// What kind of barrier.
    pub issue_type: IssueType,
    /// How severe.
    pub severity: Severity,
    /// Model-written description.
    pub description: String,
    /// Confidence in the finding, 0-1.
    pub confidence: f64,
    /// Demographic summary of the place.
    pub vulnerable_population: String,
    /// Census-derived risk factors.
    pub risk_factors: Vec<String>,
    /// Date the scan ran.
    pub detected_date: NaiveDate,
    /// Always [`AgentName::AccessScanner`].
    pub agent: AgentName,
}

/// A place ranked for intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityArea {
    /// `priority_{n}`.
    pub id: String,
    /// `"{place}, {state}"`.
    pub location: String,
    /// Where the area is.
    pub coordinates: Coordinates,
    /// 0-10 score; stored unrounded so it always agrees with `priority_level`.
    pub priority_score: f64,
    /// Level mapped from `priority_score`.
    pub priority_level: PriorityLevel,
    /// Most pressing barrier at the place.
    pub top_issue: String,
    /// Census-derived equity factors.
    pub equity_factors: Vec<String>,
    /// Demographic summary including income.
    pub vulnerable_population: String,
    /// Timeline implied by `priority_level`.
    pub recommended_timeline: String,
    /// Impact implied by `priority_score`.
    pub potential_impact: Impact,
    /// Cost band ("high" / "medium" / "low").
    pub implementation_cost: String,
    /// Why the area ranks where it does.
    pub rationale: String,
    /// Always [`AgentName::EquityAdvisor`].
    pub agent: AgentName,
}

/// One entry of a recommendation's coordinate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    /// Location name, matching the parallel `target_locations` entry.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Barrier kind at this point, when it came from a scan result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    /// Barrier severity at this point, when it came from a scan result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Where a survey-derived recommendation came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyOrigin {
    /// Submission id.
    pub survey_id: String,
    /// Submission location.
    pub survey_location: SurveyLocation,
    /// Submission issue.
    pub survey_issue: SurveyIssue,
    /// When the submission arrived.
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// An actionable improvement plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// `rec_{n}` for pipeline output, `survey_rec_{survey_id}` for surveys.
    pub id: String,
    /// Category.
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Location names, in display order.
    pub target_locations: Vec<String>,
    /// Coordinates parallel to `target_locations`.
    pub coordinates: Vec<LocationPoint>,
    /// Expected impact.
    pub impact: Impact,
    /// Cost band in dollars.
    pub cost_estimate: String,
    /// Delivery timeline.
    pub timeline: String,
    /// Ordered steps.
    pub implementation_steps: Vec<String>,
    /// How success is measured.
    pub success_metrics: Vec<String>,
    /// Urgency.
    pub priority_level: PriorityLevel,
    /// Number of locations covered.
    pub locations_affected: usize,
    /// Sustainable Development Goal target served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdg_alignment: Option<String>,
    /// Who benefits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity_impact: Option<String>,
    /// Why this plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Date the plan was produced.
    pub generated_date: NaiveDate,
    /// Provenance tag.
    pub agent: AgentName,
    /// Present only on survey-derived recommendations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey: Option<SurveyOrigin>,
}

impl Recommendation {
    /// Whether this entry was produced from a community survey rather than
    /// by the planning stage.
    #[must_use]
    pub fn is_survey_based(&self) -> bool {
        self.agent == AgentName::SurveyBot && self.survey.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn california() -> BoundingBox {
        BoundingBox::new(32.5343, 42.0095, -124.4096, -114.1318)
    }

    #[test]
    fn clamp_pulls_outside_points_onto_the_edge() {
        let bbox = california();
        let clamped = bbox.clamp(Coordinates::new(50.0, -130.0));
        assert!((clamped.lat - 42.0095).abs() < f64::EPSILON);
        assert!((clamped.lng - -124.4096).abs() < f64::EPSILON);
        assert!(bbox.contains(clamped));
    }

    #[test]
    fn clamp_replaces_non_finite_components_with_center() {
        let bbox = california();
        let clamped = bbox.clamp(Coordinates::new(f64::NAN, -120.0));
        assert!((clamped.lat - bbox.center().lat).abs() < 1e-9);
        assert!((clamped.lng - -120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn priority_level_threshold_boundaries() {
        assert_eq!(PriorityLevel::from_score(8.0), PriorityLevel::Immediate);
        assert_eq!(PriorityLevel::from_score(7.999), PriorityLevel::ShortTerm);
        assert_eq!(PriorityLevel::from_score(6.0), PriorityLevel::ShortTerm);
        assert_eq!(PriorityLevel::from_score(5.999), PriorityLevel::MediumTerm);
        assert_eq!(PriorityLevel::from_score(4.0), PriorityLevel::MediumTerm);
        assert_eq!(PriorityLevel::from_score(3.0), PriorityLevel::LongTerm);
    }

    #[test]
    fn issue_type_coercion() {
        assert_eq!(
            IssueType::coerce("missing curb ramps"),
            Some(IssueType::MissingCurbRamps)
        );
        assert_eq!(
            IssueType::coerce("missing_accessible_parking"),
            Some(IssueType::MissingAccessibleParking)
        );
        assert_eq!(
            IssueType::coerce("Lack of tactile paving at crossings"),
            Some(IssueType::NoTactilePaving)
        );
        assert_eq!(
            IssueType::coerce("Bus stop without boarding pad"),
            Some(IssueType::InaccessibleTransit)
        );
        assert_eq!(IssueType::coerce("Noise pollution"), None);
    }

    #[test]
    fn issue_type_serializes_as_label() {
        let json = serde_json::to_string(&IssueType::NoTactilePaving).unwrap();
        assert_eq!(json, "\"No Tactile Paving\"");
        assert_eq!(IssueType::SteepGrade.to_string(), "Steep Grade");
    }

    #[test]
    fn severity_coercion() {
        assert_eq!(Severity::coerce("Critical"), Some(Severity::Critical));
        assert_eq!(Severity::coerce("medium"), Some(Severity::Moderate));
        assert_eq!(Severity::coerce("minor"), Some(Severity::Good));
        assert_eq!(Severity::coerce("catastrophic"), None);
    }

    #[test]
    fn recommendation_type_accepts_tech_alias() {
        assert_eq!(
            RecommendationType::coerce("tech"),
            Some(RecommendationType::Technology)
        );
        assert_eq!(
            RecommendationType::coerce("Community"),
            Some(RecommendationType::Community)
        );
        let parsed: RecommendationType = serde_json::from_str("\"tech\"").unwrap();
        assert_eq!(parsed, RecommendationType::Technology);
        assert_eq!(RecommendationType::Technology.to_string(), "technology");
    }

    #[test]
    fn priority_level_coercion_and_serde_label() {
        assert_eq!(
            PriorityLevel::coerce("short term"),
            Some(PriorityLevel::ShortTerm)
        );
        assert_eq!(
            PriorityLevel::coerce("Long_Term"),
            Some(PriorityLevel::LongTerm)
        );
        assert_eq!(PriorityLevel::coerce("soon"), None);
        let json = serde_json::to_string(&PriorityLevel::MediumTerm).unwrap();
        assert_eq!(json, "\"Medium-term\"");
    }

    #[test]
    fn risk_factors_fall_back_to_standard_profile() {
        let record = CensusRecord {
            place: "Davis".to_string(),
            state: "CA".to_string(),
            percent_over_65: 0.10,
            percent_disabled: 0.05,
            median_income: Some(75_000.0),
            vulnerability_score: 1.0,
        };
        assert_eq!(record.risk_factors(), vec!["Standard risk profile"]);
        assert_eq!(record.equity_factors(), vec!["Standard demographics"]);
    }
}
