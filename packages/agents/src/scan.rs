//! `AccessScanner`: finds accessibility gaps in census places.

use accessmap_ai::providers::GenerationConfig;
use accessmap_ai::{GenerativeClient, RepairError};
use accessmap_analysis_models::{AccessibilityGap, AgentName, CensusRecord, IssueType};
use accessmap_census::sort_by_vulnerability;
use chrono::Utc;

use crate::AgentError;
use crate::enhancer::{CensusIndex, CoordinateResolver, dedupe_by_key, gap_confidence};
use crate::proposals::{ProposedGap, parse_records};

/// Census rows shown to the model per request.
pub const BATCH_SIZE: usize = 25;

/// Requests per scan.
pub const MAX_BATCHES: usize = 4;

/// Gaps kept per scan.
pub const MAX_GAPS: usize = 40;

const STOP_SEQUENCE: &str = "}]";

const WHAT: &str = "accessibility gaps";

fn config() -> GenerationConfig {
    GenerationConfig::new(800, 0.1).with_stop_sequences([STOP_SEQUENCE])
}

fn build_prompt(batch: &[CensusRecord], state: &str) -> Result<String, serde_json::Error> {
    let census = serde_json::to_string_pretty(batch)?;
    let issue_types = IssueType::all()
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(", ");

    Ok(format!(
        r#"You are AccessScannerAgent, an expert accessibility auditor analyzing census data.

Census Data for {state}:
{census}

Analyze this data and identify 10-15 accessibility barriers across different locations. Return ONLY a JSON array using this EXACT format:
[
    {{
        "location": "City Name, {state}",
        "issue_type": "Missing Curb Ramps",
        "severity": "critical",
        "description": "Specific accessibility barrier identified based on population demographics"
    }}
]

Issue types: {issue_types}
Severity: critical, moderate, good

Focus on areas with high elderly populations (>15%) or disability rates (>10%). Return ONLY the JSON array."#
    ))
}

/// Parses a scan response. A record the model did not finish is dropped.
fn parse_gaps(text: &str) -> Result<Vec<ProposedGap>, RepairError> {
    parse_records(text, WHAT, ProposedGap::read)
}

/// A proposal paired with its census row.
struct Candidate<'a> {
    location: String,
    proposal: ProposedGap,
    census: &'a CensusRecord,
}

/// The scan stage.
pub struct ScanAgent<'a> {
    client: &'a GenerativeClient,
    resolver: &'a CoordinateResolver,
}

impl<'a> ScanAgent<'a> {
    #[must_use]
    pub const fn new(client: &'a GenerativeClient, resolver: &'a CoordinateResolver) -> Self {
        Self { client, resolver }
    }

    /// Scans the most vulnerable places in `census`.
    ///
    /// Up to [`MAX_BATCHES`] batches of [`BATCH_SIZE`] rows are sent in
    /// order of vulnerability. Proposals are paired with the rows of their
    /// own batch, merged, deduplicated by location and issue type, then
    /// positioned until [`MAX_GAPS`] gaps are collected.
    ///
    /// # Errors
    ///
    /// * [`AgentError::Ai`] if any batch exhausts its retries
    /// * [`AgentError::NoUsableRecords`] if every proposal was dropped
    pub async fn scan(
        &self,
        census: &[CensusRecord],
        state: &str,
    ) -> Result<Vec<AccessibilityGap>, AgentError> {
        let mut ranked = census.to_vec();
        sort_by_vulnerability(&mut ranked);

        let mut candidates = Vec::new();
        for (i, batch) in ranked.chunks(BATCH_SIZE).take(MAX_BATCHES).enumerate() {
            log::info!(
                "AccessScanner: scanning batch {} ({} places) for {state}",
                i + 1,
                batch.len()
            );
            let prompt = build_prompt(batch, state)?;
            let proposals = self
                .client
                .generate_parsed(&prompt, &config(), parse_gaps)
                .await?;
            log::debug!("Batch {} proposed {} gaps", i + 1, proposals.len());

            let mut index = CensusIndex::new(batch);
            for proposal in proposals {
                let Some(row) = index.pair(&proposal.location) else {
                    log::debug!("No census row left for '{}'", proposal.location);
                    continue;
                };
                candidates.push(Candidate {
                    location: format!("{}, {state}", row.place),
                    proposal,
                    census: row,
                });
            }
        }

        let candidates = dedupe_by_key(candidates, |c| (c.location.clone(), c.proposal.issue_type));
        let detected_date = Utc::now().date_naive();

        let mut gaps = Vec::with_capacity(MAX_GAPS.min(candidates.len()));
        for candidate in candidates {
            if gaps.len() == MAX_GAPS {
                break;
            }
            let Some(coordinates) = self
                .resolver
                .resolve(candidate.proposal.coordinates, candidate.census)
                .await
            else {
                continue;
            };

            let census = candidate.census;
            gaps.push(AccessibilityGap {
                id: format!("scan_{}", gaps.len() + 1),
                location: candidate.location,
                coordinates,
                issue_type: candidate.proposal.issue_type,
                severity: candidate.proposal.severity,
                description: candidate
                    .proposal
                    .description
                    .unwrap_or_else(|| "AI-identified accessibility issue".to_string()),
                confidence: gap_confidence(candidate.proposal.confidence, &census.place),
                vulnerable_population: census.vulnerable_population(),
                risk_factors: census.risk_factors(),
                detected_date,
                agent: AgentName::AccessScanner,
            });
        }

        if gaps.is_empty() {
            return Err(AgentError::NoUsableRecords {
                stage: AgentName::AccessScanner.to_string(),
            });
        }

        log::info!("AccessScanner: {} gaps for {state}", gaps.len());
        Ok(gaps)
    }
}
