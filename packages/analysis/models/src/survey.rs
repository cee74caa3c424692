//! Community survey submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Coordinates, Recommendation, Severity};

/// Where the reported issue is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyLocation {
    /// City name as entered by the reporter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Street address, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Map pin. Required for enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// What was reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyIssue {
    /// Free-form issue kind, usually `snake_case` (`missing_curb_ramps`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Reporter's description.
    #[serde(default)]
    pub description: String,
    /// Reporter's severity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// Who is affected and how often.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyImpact {
    /// How often the issue is encountered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    /// Affected age groups.
    #[serde(default)]
    pub age_groups: Vec<String>,
}

/// Reporter demographics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyDemographics {
    /// Mobility needs of the affected people.
    #[serde(default)]
    pub mobility_needs: Vec<String>,
}

/// Optional reporter contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyContact {
    /// Name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One community-reported accessibility issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySubmission {
    /// `survey_{n}`; assigned on submit when empty.
    #[serde(default)]
    pub id: String,
    /// Location.
    pub location: SurveyLocation,
    /// Issue.
    pub issue: SurveyIssue,
    /// Impact.
    #[serde(default)]
    pub impact: SurveyImpact,
    /// Demographics.
    #[serde(default)]
    pub demographics: SurveyDemographics,
    /// Contact.
    #[serde(default)]
    pub contact: SurveyContact,
    /// When the submission arrived.
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
    /// Enrichment output; set once the submission has been processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_recommendation: Option<Recommendation>,
}

impl SurveySubmission {
    /// City name, or `"Location"` when the reporter left it blank.
    #[must_use]
    pub fn city(&self) -> &str {
        self.location
            .city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("Location")
    }

    /// Issue kind in title case: `missing_curb_ramps` becomes
    /// `Missing Curb Ramps`.
    #[must_use]
    pub fn issue_label(&self) -> String {
        let kind = if self.issue.kind.trim().is_empty() {
            "accessibility issue"
        } else {
            self.issue.kind.as_str()
        };
        kind.split(['_', ' '])
            .filter(|w| !w.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Reporter severity, defaulting to moderate when absent or unrecognized.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.issue
            .severity
            .as_deref()
            .and_then(Severity::coerce)
            .unwrap_or(Severity::Moderate)
    }

    /// Mobility needs joined for prose, with a fallback phrase.
    #[must_use]
    pub fn mobility_needs_or(&self, fallback: &str) -> String {
        join_or(&self.demographics.mobility_needs, fallback)
    }

    /// Age groups joined for prose, with a fallback phrase.
    #[must_use]
    pub fn age_groups_or(&self, fallback: &str) -> String {
        join_or(&self.impact.age_groups, fallback)
    }
}

fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}
