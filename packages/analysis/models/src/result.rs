//! The persisted aggregate of one region's analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AccessibilityGap, AgentName, CoordinateMode, Impact, PriorityArea, PriorityLevel,
    Recommendation, Severity,
};

/// Data source label for pipeline-produced results.
pub const PIPELINE_DATA_SOURCE: &str = "Multi-Agent Generative Analysis";

/// Data source label for results created only to hold survey output.
pub const SURVEY_DATA_SOURCE: &str = "Community Surveys";

/// Sustainable Development Goal 11 targets every analysis addresses.
pub const SDG_11_TARGETS: &[&str] = &[
    "11.2: Accessible and affordable transport systems",
    "11.3: Inclusive and sustainable urbanization",
    "11.7: Universal access to inclusive public spaces",
    "11.C: Support sustainable and resilient building",
];

/// Run-level facts about an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Region code, e.g. `CA`.
    pub state: String,
    /// When the analysis ran.
    pub analysis_date: DateTime<Utc>,
    /// Wall-clock duration of the pipeline.
    #[serde(default)]
    pub analysis_duration_seconds: f64,
    /// Number of census rows fed to the pipeline.
    #[serde(default)]
    pub total_locations_analyzed: usize,
    /// Stage order.
    #[serde(default)]
    pub agent_workflow: Vec<AgentName>,
    /// Where the records came from.
    #[serde(default)]
    pub data_source: String,
    /// Coordinate policy of the run; absent for survey-only results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate_mode: Option<CoordinateMode>,
    /// Whether survey recommendations are spliced in.
    #[serde(default)]
    pub survey_recommendations_included: bool,
    /// How many survey recommendations are spliced in.
    #[serde(default)]
    pub total_survey_recommendations: usize,
    /// Last time the survey splice changed the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Counters over the three record lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSummary {
    pub total_issues_identified: usize,
    pub critical_issues: usize,
    pub moderate_issues: usize,
    pub good_issues: usize,
    pub immediate_priority_areas: usize,
    pub short_term_priority_areas: usize,
    pub medium_term_priority_areas: usize,
    pub long_term_priority_areas: usize,
    pub high_impact_recommendations: usize,
    pub medium_impact_recommendations: usize,
    pub low_impact_recommendations: usize,
}

impl AnalysisSummary {
    /// Counts records by severity, level and impact.
    #[must_use]
    pub fn from_parts(
        scan_results: &[AccessibilityGap],
        priority_areas: &[PriorityArea],
        recommendations: &[Recommendation],
    ) -> Self {
        let severity = |s: Severity| scan_results.iter().filter(|g| g.severity == s).count();
        let level = |l: PriorityLevel| {
            priority_areas
                .iter()
                .filter(|p| p.priority_level == l)
                .count()
        };
        let impact = |i: Impact| recommendations.iter().filter(|r| r.impact == i).count();

        Self {
            total_issues_identified: scan_results.len(),
            critical_issues: severity(Severity::Critical),
            moderate_issues: severity(Severity::Moderate),
            good_issues: severity(Severity::Good),
            immediate_priority_areas: level(PriorityLevel::Immediate),
            short_term_priority_areas: level(PriorityLevel::ShortTerm),
            medium_term_priority_areas: level(PriorityLevel::MediumTerm),
            long_term_priority_areas: level(PriorityLevel::LongTerm),
            high_impact_recommendations: impact(Impact::High),
            medium_impact_recommendations: impact(Impact::Medium),
            low_impact_recommendations: impact(Impact::Low),
        }
    }
}

/// SDG 11 framing attached to pipeline results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdgAlignment {
    pub sdg_11_targets_addressed: Vec<String>,
    pub equity_focus: String,
    pub measurable_impact: String,
}

impl SdgAlignment {
    /// The standard block for a run over `locations` census rows.
    #[must_use]
    pub fn for_locations(locations: usize) -> Self {
        Self {
            sdg_11_targets_addressed: SDG_11_TARGETS.iter().map(ToString::to_string).collect(),
            equity_focus: "Prioritizes vulnerable populations (elderly, disabled, low-income)"
                .to_string(),
            measurable_impact: format!("Addresses accessibility needs across {locations} locations"),
        }
    }
}

/// The three stage outputs of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub scan_results: Vec<AccessibilityGap>,
    pub priority_areas: Vec<PriorityArea>,
    pub recommendations: Vec<Recommendation>,
}

/// The single persisted document per region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
    #[serde(default)]
    pub scan_results: Vec<AccessibilityGap>,
    #[serde(default)]
    pub priority_areas: Vec<PriorityArea>,
    /// Survey-derived entries first, then pipeline entries.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub summary: AnalysisSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdg_alignment: Option<SdgAlignment>,
}

impl AnalysisResult {
    /// Assembles a completed pipeline run.
    #[must_use]
    pub fn from_pipeline(
        state: &str,
        analysis_date: DateTime<Utc>,
        duration_seconds: f64,
        total_locations: usize,
        coordinate_mode: CoordinateMode,
        output: PipelineOutput,
    ) -> Self {
        let summary = AnalysisSummary::from_parts(
            &output.scan_results,
            &output.priority_areas,
            &output.recommendations,
        );
        Self {
            metadata: AnalysisMetadata {
                state: state.to_string(),
                analysis_date,
                analysis_duration_seconds: duration_seconds,
                total_locations_analyzed: total_locations,
                agent_workflow: vec![
                    AgentName::AccessScanner,
                    AgentName::EquityAdvisor,
                    AgentName::PlannerBot,
                ],
                data_source: PIPELINE_DATA_SOURCE.to_string(),
                coordinate_mode: Some(coordinate_mode),
                survey_recommendations_included: false,
                total_survey_recommendations: 0,
                last_updated: None,
            },
            scan_results: output.scan_results,
            priority_areas: output.priority_areas,
            recommendations: output.recommendations,
            summary,
            sdg_alignment: Some(SdgAlignment::for_locations(total_locations)),
        }
    }

    /// A result with no pipeline output, used to hold survey
    /// recommendations for a region that has never been analyzed.
    #[must_use]
    pub fn empty(state: &str) -> Self {
        Self {
            metadata: AnalysisMetadata {
                state: state.to_string(),
                analysis_date: Utc::now(),
                analysis_duration_seconds: 0.0,
                total_locations_analyzed: 0,
                agent_workflow: Vec::new(),
                data_source: SURVEY_DATA_SOURCE.to_string(),
                coordinate_mode: None,
                survey_recommendations_included: false,
                total_survey_recommendations: 0,
                last_updated: None,
            },
            scan_results: Vec::new(),
            priority_areas: Vec::new(),
            recommendations: Vec::new(),
            summary: AnalysisSummary::default(),
            sdg_alignment: None,
        }
    }

    /// Number of survey-derived recommendations currently present.
    #[must_use]
    pub fn survey_recommendation_count(&self) -> usize {
        self.recommendations
            .iter()
            .filter(|r| r.is_survey_based())
            .count()
    }

    /// Replaces every survey-derived recommendation with `survey`, placed
    /// ahead of the pipeline entries.
    ///
    /// Returns `false` and leaves `self` untouched when the recommendation
    /// list would come out identical, so callers can skip the write.
    pub fn splice_survey_recommendations(&mut self, survey: Vec<Recommendation>) -> bool {
        let total = survey.len();
        let mut spliced = survey;
        spliced.extend(
            self.recommendations
                .iter()
                .filter(|r| !r.is_survey_based())
                .cloned(),
        );

        if spliced == self.recommendations {
            return false;
        }

        self.recommendations = spliced;
        self.metadata.survey_recommendations_included = total > 0;
        self.metadata.total_survey_recommendations = total;
        self.metadata.last_updated = Some(Utc::now());
        self.summary = AnalysisSummary::from_parts(
            &self.scan_results,
            &self.priority_areas,
            &self.recommendations,
        );
        true
    }
}

/// Renders the markdown brief for city officials.
#[must_use]
pub fn executive_summary(result: &AnalysisResult) -> String {
    let metadata = &result.metadata;
    let summary = &result.summary;
    let workflow = if metadata.agent_workflow.is_empty() {
        "none (survey recommendations only)".to_string()
    } else {
        metadata
            .agent_workflow
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" → ")
    };

    let mut lines = vec![
        "# AccessMap AI Analysis Executive Summary".to_string(),
        format!(
            "**Analysis Date:** {}",
            metadata.analysis_date.format("%Y-%m-%d %H:%M UTC")
        ),
        format!("**Region:** {}", metadata.state),
        "**Analysis Method:** Multi-Agent AI System".to_string(),
    ];
    if let Some(mode) = metadata.coordinate_mode {
        lines.push(format!("**Coordinate Mode:** {mode}"));
    }

    lines.extend([
        String::new(),
        "## Key Findings".to_string(),
        format!(
            "- **Total Accessibility Issues Identified:** {}",
            summary.total_issues_identified
        ),
        format!("- **Critical Priority Issues:** {}", summary.critical_issues),
        format!(
            "- **Immediate Action Areas:** {}",
            summary.immediate_priority_areas
        ),
        format!(
            "- **High-Impact Recommendations:** {}",
            summary.high_impact_recommendations
        ),
        format!(
            "- **Community Survey Recommendations:** {}",
            metadata.total_survey_recommendations
        ),
    ]);

    if let Some(top) = result
        .priority_areas
        .iter()
        .max_by(|a, b| a.priority_score.total_cmp(&b.priority_score))
    {
        lines.push(format!(
            "- **Highest Priority Area:** {} ({:.1}/10, {})",
            top.location, top.priority_score, top.priority_level
        ));
    }

    lines.extend([
        String::new(),
        "## SDG 11 Impact".to_string(),
        "This analysis supports UN Sustainable Development Goal 11: Sustainable Cities and Communities"
            .to_string(),
    ]);
    lines.extend(SDG_11_TARGETS.iter().map(|target| format!("- {target}")));

    lines.extend([
        String::new(),
        "## Next Steps".to_string(),
        "1. Review immediate priority areas requiring 0-3 month action".to_string(),
        "2. Allocate resources for high-impact infrastructure improvements".to_string(),
        "3. Implement community engagement and monitoring programs".to_string(),
        "4. Establish regular accessibility auditing schedule".to_string(),
        String::new(),
        format!("**AI Agents Used:** {workflow}"),
    ]);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
