//! `PlannerBot`: turns gaps and priority areas into recommendations.

use accessmap_ai::GenerativeClient;
use accessmap_ai::providers::GenerationConfig;
use accessmap_analysis_models::{
    AccessibilityGap, AgentName, Impact, LocationPoint, PriorityArea, PriorityLevel,
    Recommendation, RecommendationType, Severity,
};
use chrono::Utc;

use crate::AgentError;
use crate::enhancer::{distribute, format_dollars};
use crate::proposals::{ProposedRecommendation, parse_records};

/// Gaps shown to the model.
pub const GAP_SAMPLE: usize = 15;

/// Recommendations kept per run.
pub const MAX_RECOMMENDATIONS: usize = 8;

/// Critical gaps above which unspecified priority becomes immediate.
const IMMEDIATE_CRITICAL_GAPS: usize = 10;

/// High-scoring priority areas above which unspecified impact becomes high.
const HIGH_IMPACT_PRIORITIES: usize = 5;

const DEFAULT_SDG: &str = "SDG 11.2: Accessible and affordable transport systems";

const DEFAULT_STEPS: &[&str] = &[
    "Conduct comprehensive assessment",
    "Develop detailed implementation plan",
    "Secure necessary approvals and funding",
    "Execute phased implementation",
    "Monitor and evaluate outcomes",
];

fn config() -> GenerationConfig {
    GenerationConfig::new(2000, 0.3)
}

#[allow(clippy::cast_precision_loss)]
fn default_cost(kind: RecommendationType, locations: usize) -> String {
    match kind {
        RecommendationType::Infrastructure => {
            let n = locations as f64;
            format!(
                "{} - {}",
                format_dollars(n * 5_000.0),
                format_dollars(n * 15_000.0)
            )
        }
        RecommendationType::Policy => "$50,000 - $150,000".to_string(),
        RecommendationType::Technology => "$200,000 - $500,000".to_string(),
        RecommendationType::Community => "$25,000 - $75,000".to_string(),
    }
}

const fn default_timeline(kind: RecommendationType) -> &'static str {
    match kind {
        RecommendationType::Infrastructure => "6-18 months",
        RecommendationType::Policy => "3-6 months",
        RecommendationType::Technology => "9-15 months",
        RecommendationType::Community => "2-4 months",
    }
}

fn default_metrics(kind: RecommendationType, locations: usize) -> Vec<String> {
    match kind {
        RecommendationType::Infrastructure => vec![
            format!("Install compliant infrastructure at {locations} locations"),
            "Achieve 95%+ ADA compliance rate".to_string(),
            "Reduce accessibility complaints by 60%".to_string(),
        ],
        RecommendationType::Policy => vec![
            "Establish comprehensive accessibility standards".to_string(),
            "Train 100% of relevant city staff".to_string(),
            "Achieve policy compliance across all departments".to_string(),
        ],
        RecommendationType::Technology => vec![
            "Deploy monitoring systems at key locations".to_string(),
            "Achieve 90% citizen app adoption in target areas".to_string(),
            "Reduce response time to accessibility issues by 50%".to_string(),
        ],
        RecommendationType::Community => vec![
            "Recruit 50+ community accessibility champions".to_string(),
            "Establish neighborhood reporting network".to_string(),
            "Increase community engagement by 200%".to_string(),
        ],
    }
}

fn build_prompt(
    gaps: &[AccessibilityGap],
    priorities: &[PriorityArea],
    state: &str,
) -> Result<String, serde_json::Error> {
    let gaps = serde_json::to_string_pretty(gaps)?;
    let priorities = serde_json::to_string_pretty(priorities)?;

    Ok(format!(
        r#"You are PlannerBotAgent, an expert urban planning AI that creates actionable improvement plans for accessibility and equity.

AccessScanner identified these accessibility gaps:
{gaps}

EquityAdvisor prioritized these areas:
{priorities}

Your task: Create comprehensive improvement recommendations that directly address the identified accessibility gaps with specific, actionable plans.

Return ONLY a JSON array with this structure:
[
    {{
        "type": "infrastructure",
        "title": "Install ADA-Compliant Curb Ramps",
        "description": "Systematic installation of accessible curb ramps in high-priority areas",
        "target_locations": ["Los Angeles, {state}", "San Francisco, {state}"],
        "impact": "high",
        "cost_estimate": "$150,000 - $300,000",
        "timeline": "6-12 months",
        "implementation_steps": [
            "Conduct detailed site surveys",
            "Obtain permits and approvals",
            "Procure materials and contractors",
            "Execute phased installation",
            "Conduct accessibility audits"
        ],
        "success_metrics": ["Number of compliant intersections", "User satisfaction surveys"],
        "sdg_alignment": "SDG 11.2: Accessible transportation systems",
        "equity_impact": "Directly serves 15.3% elderly and 8.2% disabled population",
        "priority_level": "Immediate",
        "rationale": "Critical accessibility barrier affecting vulnerable populations in high-priority areas"
    }}
]

Recommendation types: "infrastructure", "policy", "technology", "community"
Impact levels: "high", "medium", "low"
Priority levels: "Immediate", "Short-term", "Medium-term", "Long-term"

Focus on:
1. Directly addressing the specific accessibility gaps identified
2. Specific, actionable solutions for each gap type
3. Clear implementation pathways with realistic timelines
4. Measurable outcomes and success metrics
5. Equity-centered approaches prioritizing vulnerable populations
6. SDG 11 alignment for sustainable urban development

IMPORTANT: Generate recommendations that directly correspond to the accessibility gaps identified.
Create targeted recommendations for each major accessibility issue found."#
    ))
}

/// Defaults derived from the whole run rather than one proposal.
struct RunDefaults {
    impact: Impact,
    priority_level: PriorityLevel,
}

impl RunDefaults {
    fn new(gaps: &[AccessibilityGap], priorities: &[PriorityArea]) -> Self {
        let critical = gaps
            .iter()
            .filter(|g| g.severity == Severity::Critical)
            .count();
        let high_priority = priorities
            .iter()
            .filter(|p| p.priority_score >= 7.0)
            .count();

        Self {
            impact: if high_priority > HIGH_IMPACT_PRIORITIES {
                Impact::High
            } else {
                Impact::Medium
            },
            priority_level: if critical > IMMEDIATE_CRITICAL_GAPS {
                PriorityLevel::Immediate
            } else {
                PriorityLevel::ShortTerm
            },
        }
    }
}

fn location_points(gaps: &[AccessibilityGap]) -> Vec<LocationPoint> {
    gaps.iter()
        .map(|g| LocationPoint {
            name: g.location.clone(),
            lat: g.coordinates.lat,
            lng: g.coordinates.lng,
            issue_type: Some(g.issue_type),
            severity: Some(g.severity),
        })
        .collect()
}

fn fill(
    index: usize,
    proposal: ProposedRecommendation,
    points: Vec<LocationPoint>,
    defaults: &RunDefaults,
) -> Recommendation {
    let kind = proposal.kind.unwrap_or(RecommendationType::Infrastructure);
    let n = points.len();

    Recommendation {
        id: format!("rec_{}", index + 1),
        kind,
        title: proposal
            .title
            .unwrap_or_else(|| format!("Accessibility Improvement Plan {}", index + 1)),
        description: proposal
            .description
            .unwrap_or_else(|| "AI-generated accessibility improvement plan".to_string()),
        target_locations: points.iter().map(|p| p.name.clone()).collect(),
        coordinates: points,
        impact: proposal.impact.unwrap_or(defaults.impact),
        cost_estimate: proposal
            .cost_estimate
            .unwrap_or_else(|| default_cost(kind, n)),
        timeline: proposal
            .timeline
            .unwrap_or_else(|| default_timeline(kind).to_string()),
        implementation_steps: proposal
            .implementation_steps
            .unwrap_or_else(|| DEFAULT_STEPS.iter().map(ToString::to_string).collect()),
        success_metrics: proposal
            .success_metrics
            .unwrap_or_else(|| default_metrics(kind, n)),
        priority_level: proposal.priority_level.unwrap_or(defaults.priority_level),
        locations_affected: n,
        sdg_alignment: Some(proposal.sdg_alignment.unwrap_or_else(|| DEFAULT_SDG.to_string())),
        equity_impact: Some(proposal.equity_impact.unwrap_or_else(|| {
            format!(
                "Addresses accessibility needs for vulnerable populations across {n} identified locations"
            )
        })),
        rationale: Some(proposal.rationale.unwrap_or_else(|| {
            format!("AI-generated recommendation addressing {kind} needs")
        })),
        generated_date: Utc::now().date_naive(),
        agent: AgentName::PlannerBot,
        survey: None,
    }
}

/// The planning stage.
pub struct PlanAgent<'a> {
    client: &'a GenerativeClient,
}

impl<'a> PlanAgent<'a> {
    #[must_use]
    pub const fn new(client: &'a GenerativeClient) -> Self {
        Self { client }
    }

    /// Generates up to [`MAX_RECOMMENDATIONS`] recommendations.
    ///
    /// Every gap location is spread across the recommendations with
    /// [`distribute`]; fields the model left out are filled from per-type
    /// tables. Returns an empty list without calling the model when there
    /// are no gaps.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Ai`] if generation exhausts its retries.
    pub async fn plan(
        &self,
        gaps: &[AccessibilityGap],
        priorities: &[PriorityArea],
        state: &str,
    ) -> Result<Vec<Recommendation>, AgentError> {
        if gaps.is_empty() {
            log::warn!("PlannerBot: no accessibility gaps for {state}, nothing to plan");
            return Ok(Vec::new());
        }
        log::info!(
            "PlannerBot: planning for {} gaps and {} priority areas in {state}",
            gaps.len(),
            priorities.len()
        );

        let sample = &gaps[..gaps.len().min(GAP_SAMPLE)];
        let prompt = build_prompt(sample, priorities, state)?;
        let mut proposals = self
            .client
            .generate_parsed(&prompt, &config(), |text| {
                parse_records(text, "recommendations", ProposedRecommendation::read)
            })
            .await?;
        proposals.truncate(MAX_RECOMMENDATIONS);

        let defaults = RunDefaults::new(gaps, priorities);
        let points = location_points(gaps);
        let count = proposals.len();

        let recommendations: Vec<Recommendation> = proposals
            .into_iter()
            .enumerate()
            .map(|(i, proposal)| fill(i, proposal, distribute(&points, i, count), &defaults))
            .collect();

        log::info!(
            "PlannerBot: {} recommendations for {state}",
            recommendations.len()
        );
        Ok(recommendations)
    }
}
