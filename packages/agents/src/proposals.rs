//! Typed readings of model output.
//!
//! Models return loosely shaped JSON: numbers as strings, missing fields,
//! labels in the wrong case. Each proposal type reads only the fields its
//! stage uses, applies the default-fill rules documented per field, and
//! returns `None` for records that cannot be coerced. Dropped records are
//! never replaced with invented ones.

use accessmap_ai::RepairError;
use accessmap_ai::repair::{repair_array, repair_object};
use accessmap_analysis_models::{
    Coordinates, Impact, IssueType, PriorityLevel, RecommendationType, Severity,
};
use serde_json::Value;

fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value, key: &str) -> Option<f64> {
    let n = match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn text_list(value: &Value, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = match value.get(key)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => vec![s.trim().to_string()],
        _ => Vec::new(),
    };
    (!items.is_empty()).then_some(items)
}

fn coordinates(value: &Value, key: &str) -> Option<Coordinates> {
    let point = value.get(key)?;
    let lat = number(point, "lat").or_else(|| number(point, "latitude"))?;
    let lng = number(point, "lng")
        .or_else(|| number(point, "lon"))
        .or_else(|| number(point, "longitude"))?;
    Some(Coordinates::new(lat, lng))
}

/// Reads an optional enumerated field. `Ok(None)` when absent, `Err(())`
/// when present but not coercible.
fn enumerated<T>(value: &Value, key: &str, coerce: fn(&str) -> Option<T>) -> Result<Option<T>, ()> {
    text(value, key).map_or(Ok(None), |raw| coerce(&raw).map(Some).ok_or(()))
}

/// Repairs `text` into an array and keeps the records `read` accepts.
///
/// # Errors
///
/// Returns the repair error, or [`RepairError::NoUsableRecords`] when every
/// record was rejected, so the caller's retry budget treats an unusable
/// response like an unparseable one.
pub fn parse_records<T>(
    text: &str,
    what: &str,
    read: fn(&Value) -> Option<T>,
) -> Result<Vec<T>, RepairError> {
    let values = repair_array(text)?;
    let total = values.len();
    let records: Vec<T> = values.iter().filter_map(read).collect();

    if records.is_empty() {
        return Err(RepairError::NoUsableRecords {
            what: what.to_string(),
        });
    }
    if records.len() < total {
        log::debug!("Dropped {} of {total} {what}", total - records.len());
    }
    Ok(records)
}

/// A gap proposed by the scan model.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedGap {
    /// Location as written by the model; may be empty.
    pub location: String,
    /// Required; records without a recognizable type are dropped.
    pub issue_type: IssueType,
    /// Defaults to moderate when absent; unrecognized values drop the record.
    pub severity: Severity,
    pub description: Option<String>,
    /// Kept only when within 0-1.
    pub confidence: Option<f64>,
    pub coordinates: Option<Coordinates>,
}

impl ProposedGap {
    #[must_use]
    pub fn read(value: &Value) -> Option<Self> {
        let issue_type = IssueType::coerce(&text(value, "issue_type")?)?;
        let severity = enumerated(value, "severity", Severity::coerce)
            .ok()?
            .unwrap_or(Severity::Moderate);

        Some(Self {
            location: text(value, "location").unwrap_or_default(),
            issue_type,
            severity,
            description: text(value, "description"),
            confidence: number(value, "confidence").filter(|c| (0.0..=1.0).contains(c)),
            coordinates: coordinates(value, "coordinates"),
        })
    }
}

/// A priority area proposed by the equity model.
///
/// Scores and levels are always recomputed; only descriptive fields are
/// taken from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedPriority {
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub top_issue: Option<String>,
    /// `"high"`, `"medium"` or `"low"` when recognizable.
    pub implementation_cost: Option<String>,
    pub rationale: Option<String>,
}

impl ProposedPriority {
    #[must_use]
    pub fn read(value: &Value) -> Option<Self> {
        let location = text(value, "location")?;
        let implementation_cost = text(value, "implementation_cost")
            .and_then(|c| Impact::coerce(&c))
            .map(|c| c.to_string());

        Some(Self {
            location,
            coordinates: coordinates(value, "coordinates"),
            top_issue: text(value, "top_issue"),
            implementation_cost,
            rationale: text(value, "rationale"),
        })
    }
}

/// A recommendation proposed by the planning model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedRecommendation {
    /// Unrecognized types fall back to the caller's default.
    pub kind: Option<RecommendationType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub impact: Option<Impact>,
    pub cost_estimate: Option<String>,
    pub timeline: Option<String>,
    pub implementation_steps: Option<Vec<String>>,
    pub success_metrics: Option<Vec<String>>,
    pub sdg_alignment: Option<String>,
    pub equity_impact: Option<String>,
    pub priority_level: Option<PriorityLevel>,
    pub rationale: Option<String>,
}

impl ProposedRecommendation {
    /// Requires a title or a description.
    #[must_use]
    pub fn read(value: &Value) -> Option<Self> {
        let title = text(value, "title");
        let description = text(value, "description");
        if title.is_none() && description.is_none() {
            return None;
        }

        Some(Self {
            kind: text(value, "type").and_then(|t| RecommendationType::coerce(&t)),
            title,
            description,
            impact: text(value, "impact").and_then(|i| Impact::coerce(&i)),
            cost_estimate: text(value, "cost_estimate"),
            timeline: text(value, "timeline"),
            implementation_steps: text_list(value, "implementation_steps"),
            success_metrics: text_list(value, "success_metrics"),
            sdg_alignment: text(value, "sdg_alignment"),
            equity_impact: text(value, "equity_impact"),
            priority_level: text(value, "priority_level").and_then(|p| PriorityLevel::coerce(&p)),
            rationale: text(value, "rationale"),
        })
    }
}

/// The single plan object returned for a survey submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyPlan {
    pub kind: Option<RecommendationType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub recommended_actions: Option<Vec<String>>,
    pub expected_impact: Option<String>,
    pub detailed_plan: Option<String>,
}

impl SurveyPlan {
    /// Requires a title or a description.
    #[must_use]
    pub fn read(value: &Value) -> Option<Self> {
        let title = text(value, "title");
        let description = text(value, "description");
        if title.is_none() && description.is_none() {
            return None;
        }

        Some(Self {
            kind: text(value, "type").and_then(|t| RecommendationType::coerce(&t)),
            title,
            description,
            recommended_actions: text_list(value, "recommended_actions"),
            expected_impact: text(value, "expected_impact"),
            detailed_plan: text(value, "detailed_plan"),
        })
    }

    /// Repairs `text` into one object and reads it.
    ///
    /// # Errors
    ///
    /// Returns the repair error, or [`RepairError::NoUsableRecords`] when
    /// the object has neither title nor description.
    pub fn parse(text: &str) -> Result<Self, RepairError> {
        let value = repair_object(text)?;
        Self::read(&value).ok_or_else(|| RepairError::NoUsableRecords {
            what: "survey plan".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn gap_defaults_and_coercion() {
        let gap = ProposedGap::read(&json!({
            "location": "Fresno, CA",
            "issue_type": "curb ramps missing",
            "confidence": "0.9"
        }))
        .unwrap();
        assert_eq!(gap.issue_type, IssueType::MissingCurbRamps);
        assert_eq!(gap.severity, Severity::Moderate);
        assert_eq!(gap.confidence, Some(0.9));
        assert!(gap.coordinates.is_none());
    }

    #[test]
    fn uncoercible_gaps_are_dropped() {
        assert!(ProposedGap::read(&json!({"location": "X", "issue_type": "noise"})).is_none());
        assert!(
            ProposedGap::read(&json!({
                "location": "X",
                "issue_type": "Steep Grade",
                "severity": "catastrophic"
            }))
            .is_none()
        );
        assert!(ProposedGap::read(&json!({"location": "X"})).is_none());
    }

    #[test]
    fn gap_reads_string_coordinates() {
        let gap = ProposedGap::read(&json!({
            "issue_type": "Poor Lighting",
            "severity": "HIGH",
            "coordinates": {"lat": "36.7", "lon": -119.8},
            "confidence": 3
        }))
        .unwrap();
        assert_eq!(gap.severity, Severity::Critical);
        assert_eq!(gap.coordinates, Some(Coordinates::new(36.7, -119.8)));
        assert_eq!(gap.confidence, None);
        assert_eq!(gap.location, "");
    }

    #[test]
    fn parse_records_requires_one_usable_record() {
        let err = parse_records(
            r#"[{"issue_type": "alien invasion"}]"#,
            "accessibility gaps",
            ProposedGap::read,
        )
        .unwrap_err();
        assert!(matches!(err, RepairError::NoUsableRecords { .. }));

        let ok = parse_records(
            r#"Sure! [{"issue_type": "Broken Sidewalk"}, {"issue_type": "???"}]"#,
            "accessibility gaps",
            ProposedGap::read,
        )
        .unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn recommendation_keeps_known_fields() {
        let rec = ProposedRecommendation::read(&json!({
            "type": "tech",
            "title": "Smart crossings",
            "impact": "High",
            "priority_level": "short term",
            "implementation_steps": ["Survey", "Install"]
        }))
        .unwrap();
        assert_eq!(rec.kind, Some(RecommendationType::Technology));
        assert_eq!(rec.impact, Some(Impact::High));
        assert_eq!(rec.priority_level, Some(PriorityLevel::ShortTerm));
        assert_eq!(rec.implementation_steps.unwrap().len(), 2);
        assert!(ProposedRecommendation::read(&json!({"type": "policy"})).is_none());
    }

    #[test]
    fn survey_plan_parses_single_object() {
        let plan = SurveyPlan::parse(
            "Here is the plan:\n{\"title\": \"Fix ramps\", \"type\": \"infrastructure\"}",
        )
        .unwrap();
        assert_eq!(plan.title.as_deref(), Some("Fix ramps"));
        assert_eq!(plan.kind, Some(RecommendationType::Infrastructure));

        assert!(matches!(
            SurveyPlan::parse("{\"priority\": \"High\"}"),
            Err(RepairError::NoUsableRecords { .. })
        ));
    }

    #[test]
    fn priority_cost_is_normalized() {
        let p = ProposedPriority::read(&json!({
            "location": "Oakland, CA",
            "implementation_cost": "Medium",
            "coordinates": {"lat": 37.8, "lng": -122.27}
        }))
        .unwrap();
        assert_eq!(p.implementation_cost.as_deref(), Some("medium"));
        assert_eq!(p.coordinates, Some(Coordinates::new(37.8, -122.27)));
    }
}
