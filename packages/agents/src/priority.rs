//! `EquityAdvisor`: ranks places for intervention.
//!
//! The model only nominates places. Scores, levels, timelines and impact
//! are recomputed from census data and the severities of gaps found there,
//! so two runs over the same inputs rank identically.

use accessmap_ai::GenerativeClient;
use accessmap_ai::providers::GenerationConfig;
use accessmap_analysis_models::scoring::{ScoreInputs, severity_score};
use accessmap_analysis_models::{
    AccessibilityGap, AgentName, CensusRecord, Coordinates, Impact, PriorityArea,
};
use accessmap_census::sort_by_vulnerability;

use crate::AgentError;
use crate::enhancer::{CensusIndex, CoordinateResolver, dedupe_by_key, format_dollars};
use crate::proposals::{ProposedPriority, parse_records};

/// Gaps shown to the model.
pub const GAP_SAMPLE: usize = 10;

/// Census rows shown to the model and eligible for pairing.
pub const CENSUS_SAMPLE: usize = 10;

const MIN_AREAS: usize = 3;
const MAX_AREAS: usize = 10;

fn config() -> GenerationConfig {
    GenerationConfig::new(1500, 0.3)
}

/// Half the gap count, kept within 3-10.
#[must_use]
pub fn area_cap(gap_count: usize) -> usize {
    (gap_count / 2).clamp(MIN_AREAS, MAX_AREAS)
}

fn build_prompt(
    gaps: &[AccessibilityGap],
    census: &[CensusRecord],
    state: &str,
) -> Result<String, serde_json::Error> {
    let gaps = serde_json::to_string_pretty(gaps)?;
    let census = serde_json::to_string_pretty(census)?;

    Ok(format!(
        r#"You are EquityAdvisorAgent, an expert in urban equity and accessibility prioritization.

AccessScanner found these issues:
{gaps}

Census vulnerability data:
{census}

Your task: Identify the top 3-6 priority areas for accessibility improvements based on:
1. Severity of accessibility barriers
2. Vulnerability of population (elderly, disabled, low-income)
3. Equity impact potential
4. Implementation feasibility

Return ONLY a JSON array with 3-6 priority areas using this structure:
[
    {{
        "location": "City Name, {state}",
        "coordinates": {{"lat": 34.0522, "lng": -118.2437}},
        "priority_score": 8.7,
        "priority_level": "Immediate",
        "top_issue": "Multiple accessibility barriers",
        "equity_factors": ["High elderly population", "Low income", "High disability rate"],
        "vulnerable_population": "18.2% elderly, 12.1% disabled, median income $35,000",
        "recommended_timeline": "0-3 months",
        "potential_impact": "high",
        "implementation_cost": "medium",
        "rationale": "Critical accessibility gaps in highly vulnerable community"
    }}
]

Priority levels: "Immediate" (0-3 months), "Short-term" (3-6 months), "Medium-term" (6-12 months), "Long-term" (12+ months)
Priority scores: 1-10 scale where 10 = highest priority
Potential impact: "high", "medium", "low"
Implementation cost: "high", "medium", "low"

Focus on equity-driven prioritization that serves the most vulnerable populations first.
Generate only 3-6 priority areas, not more."#
    ))
}

/// Builds one area from a paired proposal.
fn score_area(
    proposal: ProposedPriority,
    census: &CensusRecord,
    gaps: &[AccessibilityGap],
    coordinates: Coordinates,
    state: &str,
) -> PriorityArea {
    let at_place: Vec<&AccessibilityGap> = gaps
        .iter()
        .filter(|g| g.location.contains(census.place.as_str()))
        .collect();

    let (priority_score, priority_level) = ScoreInputs {
        percent_over_65: census.percent_over_65,
        percent_disabled: census.percent_disabled,
        median_income: census.median_income,
        severity_score: severity_score(at_place.iter().map(|g| g.severity)),
    }
    .evaluate();

    let top_issue = at_place
        .first()
        .map(|g| g.issue_type.to_string())
        .or(proposal.top_issue)
        .unwrap_or_else(|| "Potential accessibility gaps".to_string());

    PriorityArea {
        id: String::new(),
        location: format!("{}, {state}", census.place),
        coordinates,
        priority_score,
        priority_level,
        top_issue,
        equity_factors: census.equity_factors(),
        vulnerable_population: format!(
            "{}, median income {}",
            census.vulnerable_population(),
            format_dollars(census.income_or_default())
        ),
        recommended_timeline: priority_level.timeline().to_string(),
        potential_impact: Impact::from_priority_score(priority_score),
        implementation_cost: proposal
            .implementation_cost
            .unwrap_or_else(|| "medium".to_string()),
        rationale: proposal.rationale.unwrap_or_else(|| {
            format!(
                "Priority {priority_score:.1}/10 based on vulnerability analysis and accessibility gaps"
            )
        }),
        agent: AgentName::EquityAdvisor,
    }
}

/// The prioritization stage.
pub struct PriorityAgent<'a> {
    client: &'a GenerativeClient,
    resolver: &'a CoordinateResolver,
}

impl<'a> PriorityAgent<'a> {
    #[must_use]
    pub const fn new(client: &'a GenerativeClient, resolver: &'a CoordinateResolver) -> Self {
        Self { client, resolver }
    }

    /// Ranks places using the first [`GAP_SAMPLE`] gaps and the
    /// [`CENSUS_SAMPLE`] most vulnerable census rows.
    ///
    /// Areas are deduplicated by place, sorted by score and capped at
    /// [`area_cap`] of the gap count.
    ///
    /// # Errors
    ///
    /// * [`AgentError::Ai`] if generation exhausts its retries
    /// * [`AgentError::NoUsableRecords`] if no area survived enrichment
    pub async fn prioritize(
        &self,
        gaps: &[AccessibilityGap],
        census: &[CensusRecord],
        state: &str,
    ) -> Result<Vec<PriorityArea>, AgentError> {
        log::info!("EquityAdvisor: prioritizing areas for {state}");

        let mut ranked = census.to_vec();
        sort_by_vulnerability(&mut ranked);
        ranked.truncate(CENSUS_SAMPLE);

        let sample = &gaps[..gaps.len().min(GAP_SAMPLE)];
        let prompt = build_prompt(sample, &ranked, state)?;
        let proposals = self
            .client
            .generate_parsed(&prompt, &config(), |text| {
                parse_records(text, "priority areas", ProposedPriority::read)
            })
            .await?;

        let mut index = CensusIndex::new(&ranked);
        let paired: Vec<(ProposedPriority, &CensusRecord)> = proposals
            .into_iter()
            .filter_map(|p| index.pair(&p.location).map(|row| (p, row)))
            .collect();
        let paired = dedupe_by_key(paired, |(_, row)| row.place.clone());

        let mut areas = Vec::with_capacity(paired.len());
        for (proposal, row) in paired {
            let Some(coordinates) = self.resolver.resolve(proposal.coordinates, row).await else {
                continue;
            };
            areas.push(score_area(proposal, row, gaps, coordinates, state));
        }

        areas.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        areas.truncate(area_cap(gaps.len()));
        for (i, area) in areas.iter_mut().enumerate() {
            area.id = format!("priority_{}", i + 1);
        }

        if areas.is_empty() {
            return Err(AgentError::NoUsableRecords {
                stage: AgentName::EquityAdvisor.to_string(),
            });
        }

        log::info!("EquityAdvisor: {} priority areas for {state}", areas.len());
        Ok(areas)
    }
}
