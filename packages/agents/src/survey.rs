//! `SurveyBot`: enriches single community reports and merges them into the
//! region's analysis result.

use std::sync::Arc;

use accessmap_ai::providers::GenerationConfig;
use accessmap_analysis_models::survey::SurveySubmission;
use accessmap_analysis_models::{
    AgentName, AnalysisResult, Coordinates, Impact, IssueType, LocationPoint, PriorityLevel,
    Recommendation, RecommendationType, Severity, SurveyOrigin,
};
use accessmap_geocoder::region_registry::{self, Region};
use chrono::Utc;

use crate::enhancer::dedupe_by_key;
use crate::proposals::SurveyPlan;
use crate::{AgentError, Services};

const SDG_TRANSPORT: &str = "SDG 11.2: Accessible and affordable transport systems";
const SDG_PUBLIC_SPACES: &str = "SDG 11.7: Safe and inclusive public spaces";
const SDG_URBANIZATION: &str = "SDG 11.3: Inclusive and sustainable urbanization";

const DEFAULT_ACTIONS: &[&str] = &[
    "Conduct on-site assessment of the reported issue",
    "Engage with local disability advocacy groups",
    "Develop detailed implementation plan",
    "Coordinate with city planning department",
    "Monitor progress and community feedback",
];

fn config() -> GenerationConfig {
    GenerationConfig::new(1000, 0.7)
}

/// `"Missing Curb Ramps"` and `"missing-curb-ramps"` become
/// `"missing_curb_ramps"`.
fn issue_key(kind: &str) -> String {
    kind.trim()
        .to_lowercase()
        .split(|c: char| c == ' ' || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn sdg_for_issue(key: &str) -> &'static str {
    match key {
        "poor_lighting" | "lack_of_signage" | "poor_visibility" | "hazardous_conditions" => {
            SDG_PUBLIC_SPACES
        }
        "inaccessible_buildings" => SDG_URBANIZATION,
        _ => SDG_TRANSPORT,
    }
}

fn type_for_issue(key: &str) -> RecommendationType {
    match key {
        "lack_of_signage" | "poor_visibility" => RecommendationType::Technology,
        _ => RecommendationType::Infrastructure,
    }
}

#[allow(clippy::too_many_lines)]
fn success_metrics_for_issue(key: &str, city: &str) -> Vec<String> {
    let metrics: [String; 4] = match key {
        "missing_curb_ramps" => [
            format!("100% ADA-compliant curb ramps installed in {city}"),
            "95% reduction in mobility barriers for wheelchair users".into(),
            "90% improvement in pedestrian safety scores".into(),
            "Increased accessibility compliance from 60% to 95%".into(),
        ],
        "inaccessible_transit" => [
            format!("All public transit stops in {city} meet ADA standards"),
            "80% increase in transit usage by disabled residents".into(),
            "100% of bus routes now have accessible stops".into(),
            "Reduced transit-related accessibility complaints by 85%".into(),
        ],
        "poor_lighting" => [
            format!("Enhanced lighting coverage in {city} by 90%"),
            "75% reduction in safety incidents in poorly lit areas".into(),
            "Improved visibility ratings from 3/10 to 8/10".into(),
            "Increased evening pedestrian activity by 60%".into(),
        ],
        "steep_grade" => [
            format!("All steep pathways in {city} now have accessible alternatives"),
            "100% of grade-separated crossings meet accessibility standards".into(),
            "Reduced mobility barriers for elderly residents by 90%".into(),
            "Improved pathway accessibility scores from 4/10 to 9/10".into(),
        ],
        "missing_accessible_parking" => [
            format!("ADA-compliant parking spaces increased by 200% in {city}"),
            "95% of public facilities now have accessible parking".into(),
            "Reduced parking-related accessibility complaints by 80%".into(),
            "Improved parking accessibility ratings from 5/10 to 9/10".into(),
        ],
        "lack_of_signage" => [
            format!("Comprehensive signage system installed across {city}"),
            "90% improvement in navigation for visually impaired users".into(),
            "100% of key locations now have accessible signage".into(),
            "Reduced navigation-related incidents by 70%".into(),
        ],
        "broken_sidewalk" => [
            format!("All sidewalks in {city} now meet safety standards"),
            "95% reduction in sidewalk-related mobility issues".into(),
            "Improved sidewalk condition ratings from 3/10 to 8/10".into(),
            "Increased pedestrian safety scores by 85%".into(),
        ],
        "narrow_pathways" => [
            format!("All pathways in {city} now meet minimum width requirements"),
            "100% of pathways accommodate mobility devices".into(),
            "Improved pathway accessibility from 40% to 95%".into(),
            "Reduced pathway-related mobility barriers by 90%".into(),
        ],
        "missing_ramps" => [
            format!("All buildings in {city} now have accessible ramps"),
            "100% ADA compliance for ramp installations".into(),
            "Improved building accessibility from 50% to 95%".into(),
            "Reduced ramp-related accessibility complaints by 85%".into(),
        ],
        "inaccessible_buildings" => [
            format!("All public buildings in {city} now meet accessibility standards"),
            "100% of buildings have accessible entrances and facilities".into(),
            "Improved building accessibility ratings from 3/10 to 9/10".into(),
            "Increased building accessibility compliance by 90%".into(),
        ],
        "poor_visibility" => [
            format!("Enhanced visibility measures implemented across {city}"),
            "80% improvement in visibility for all users".into(),
            "Reduced visibility-related incidents by 75%".into(),
            "Improved safety ratings from 4/10 to 8/10".into(),
        ],
        "hazardous_conditions" => [
            format!("All hazardous conditions in {city} have been addressed"),
            "100% of identified hazards have been remediated".into(),
            "Improved safety scores from 2/10 to 9/10".into(),
            "Reduced safety-related incidents by 90%".into(),
        ],
        _ => [
            format!("Improved accessibility in {city} by 85%"),
            "95% community satisfaction with accessibility improvements".into(),
            "90% reduction in accessibility barriers".into(),
            "Enhanced quality of life for all residents".into(),
        ],
    };
    metrics.into()
}

/// Severity-derived fields of a survey recommendation.
struct SeverityProfile {
    impact: Impact,
    priority_level: PriorityLevel,
    priority_label: &'static str,
    cost_estimate: &'static str,
    timeline: &'static str,
}

const fn severity_profile(severity: Severity) -> SeverityProfile {
    match severity {
        Severity::Critical => SeverityProfile {
            impact: Impact::High,
            priority_level: PriorityLevel::Immediate,
            priority_label: "High",
            cost_estimate: "$25,000 - $100,000",
            timeline: "8-16 weeks",
        },
        Severity::Moderate => SeverityProfile {
            impact: Impact::Medium,
            priority_level: PriorityLevel::ShortTerm,
            priority_label: "Medium",
            cost_estimate: "$15,000 - $50,000",
            timeline: "6-12 weeks",
        },
        Severity::Good => SeverityProfile {
            impact: Impact::Low,
            priority_level: PriorityLevel::MediumTerm,
            priority_label: "Low",
            cost_estimate: "$5,000 - $25,000",
            timeline: "4-8 weeks",
        },
    }
}

fn build_prompt(submission: &SurveySubmission, region: &Region) -> String {
    let city = submission.city();
    let issue = submission.issue_label();
    let issue_kind = if submission.issue.kind.trim().is_empty() {
        "accessibility issue"
    } else {
        submission.issue.kind.as_str()
    };
    let issue_lower = issue.to_lowercase();
    let description = if submission.issue.description.trim().is_empty() {
        "Not specified"
    } else {
        submission.issue.description.as_str()
    };
    let severity = submission.issue.severity.as_deref().unwrap_or("Not specified");
    let frequency = submission.impact.frequency.as_deref().unwrap_or("Not specified");
    let affected = submission.mobility_needs_or("community members");
    let ages = submission.age_groups_or("all ages");
    let impact_ages = submission.age_groups_or("all community members");
    let impact_needs = submission.mobility_needs_or("diverse mobility needs");
    let equity_needs = submission.mobility_needs_or("vulnerable populations");
    let profile = severity_profile(submission.severity());
    let priority = profile.priority_label;
    let cost = profile.cost_estimate;
    let timeline = profile.timeline;
    let region_name = &region.name;

    format!(
        r#"You are an expert accessibility consultant and urban planner specializing in creating comprehensive, actionable improvement plans for accessibility issues. You have deep knowledge of ADA compliance, universal design principles, community engagement strategies, technology solutions, and policy development.

CONTEXT:
Location: {city}, {region_name}
Issue Type: {issue_kind}
Issue Description: {description}
Severity: {severity}
Affected Groups: {affected}
Impact Frequency: {frequency}
Age Groups Affected: {ages}

Create a comprehensive, detailed accessibility improvement plan that addresses the specific issue while considering the unique needs of the affected population and the local context.

RECOMMENDATION TYPE GUIDELINES:
- Choose the most appropriate type from: "infrastructure", "tech", "policy", or "community"
- "infrastructure": Physical improvements (ramps, lighting, sidewalks, etc.)
- "tech": Technology solutions (apps, sensors, digital signage, smart systems)
- "policy": Policy changes, regulations, enforcement, standards
- "community": Community programs, education, awareness, volunteer initiatives

Make your recommendation SPECIFIC and DETAILED to the issue type. For example:
- For signage issues: Consider tech solutions (digital signage, mobile apps) or policy (signage standards)
- For lighting issues: Consider infrastructure (physical lighting) or tech (smart lighting systems)
- For transit issues: Consider infrastructure (physical improvements) or policy (accessibility requirements)
- For building access: Consider infrastructure (ramps, elevators) or policy (accessibility laws)

IMPORTANT: Return ONLY the JSON object below. Do not include any additional text, explanations, or disclaimers.

{{
  "priority": "{priority}",
  "title": "Comprehensive Accessibility Improvement Plan for {city} - {issue}",
  "description": "A detailed, community-focused plan to address {issue_lower} affecting {affected} in {city}. This plan prioritizes safety, independence, and equitable access for all residents.",
  "recommended_actions": [
    "Conduct comprehensive on-site accessibility audit with certified accessibility experts",
    "Engage with local disability advocacy groups and affected community members",
    "Perform detailed cost-benefit analysis and secure funding sources",
    "Develop phased implementation timeline with clear milestones",
    "Coordinate with city planning, public works, and disability services departments",
    "Implement ADA-compliant solutions following universal design principles",
    "Establish regular maintenance and monitoring protocols",
    "Create community education and awareness programs",
    "Conduct post-implementation accessibility assessments",
    "Establish feedback mechanisms for continuous improvement"
  ],
  "cost_estimate": "{cost}",
  "timeline": "{timeline}",
  "expected_impact": "Significantly improve accessibility, safety, and independence for {impact_ages} with {impact_needs}, enhancing quality of life and community participation.",
  "type": "Choose the most appropriate type: infrastructure, tech, policy, or community",
  "detailed_plan": "Phase 1 (Weeks 1-2): Comprehensive assessment and community engagement. Phase 2 (Weeks 3-8): Design and planning with stakeholder input. Phase 3 (Weeks 9-12): Implementation and testing. Phase 4 (Weeks 13-16): Verification, training, and ongoing monitoring.",
  "equity_impact": "This plan directly addresses the needs of {equity_needs} in {city}, promoting social equity, community inclusion, and equal access to public spaces and services."
}}"#
    )
}

/// Builds the `SurveyBot` recommendation for one submission.
///
/// Only the title, description, actions, type and rationale come from the
/// model. Everything else is derived from the reported severity and issue.
fn build_recommendation(
    submission: &SurveySubmission,
    plan: SurveyPlan,
    point: Coordinates,
) -> Recommendation {
    let city = submission.city();
    let key = issue_key(&submission.issue.kind);
    let severity = submission.severity();
    let profile = severity_profile(severity);
    let kind = plan.kind.unwrap_or_else(|| type_for_issue(&key));

    Recommendation {
        id: format!("survey_rec_{}", submission.id),
        kind,
        title: plan
            .title
            .unwrap_or_else(|| format!("Accessibility Improvement Plan for {city}")),
        description: plan.description.unwrap_or_else(|| {
            format!(
                "Address {} affecting {}",
                submission.issue_label().to_lowercase(),
                submission.mobility_needs_or("community members")
            )
        }),
        target_locations: vec![city.to_string()],
        coordinates: vec![LocationPoint {
            name: city.to_string(),
            lat: point.lat,
            lng: point.lng,
            issue_type: IssueType::coerce(&submission.issue.kind),
            severity: Some(severity),
        }],
        impact: profile.impact,
        cost_estimate: profile.cost_estimate.to_string(),
        timeline: profile.timeline.to_string(),
        implementation_steps: plan
            .recommended_actions
            .unwrap_or_else(|| DEFAULT_ACTIONS.iter().map(ToString::to_string).collect()),
        success_metrics: success_metrics_for_issue(&key, city),
        priority_level: profile.priority_level,
        locations_affected: 1,
        sdg_alignment: Some(sdg_for_issue(&key).to_string()),
        equity_impact: Some(format!(
            "Addresses accessibility needs for {} in {city}",
            submission.mobility_needs_or("vulnerable populations")
        )),
        rationale: plan.expected_impact.or(plan.detailed_plan),
        generated_date: Utc::now().date_naive(),
        agent: AgentName::SurveyBot,
        survey: None,
    }
}

/// Survey-based recommendations for every submission that has one, with
/// provenance attached. At most one per submission id.
#[must_use]
pub fn rebuild_survey_recommendations(submissions: &[SurveySubmission]) -> Vec<Recommendation> {
    let rebuilt = submissions
        .iter()
        .filter_map(|s| {
            let mut rec = s.ai_recommendation.clone()?;
            rec.id = format!("survey_rec_{}", s.id);
            rec.agent = AgentName::SurveyBot;
            rec.survey = Some(SurveyOrigin {
                survey_id: s.id.clone(),
                survey_location: s.location.clone(),
                survey_issue: s.issue.clone(),
                submitted_at: s.submitted_at,
            });
            Some(rec)
        })
        .collect();
    dedupe_by_key(rebuilt, |r: &Recommendation| r.id.clone())
}

/// Accepts community submissions and keeps the region result in sync.
#[derive(Debug, Clone)]
pub struct SurveyRecommendationService {
    services: Arc<Services>,
}

impl SurveyRecommendationService {
    #[must_use]
    pub const fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    /// Enriches and stores one submission, then merges.
    ///
    /// Submissions without an id get the next free `survey_{n}`; a
    /// submission with an existing id replaces the stored one. Nothing is
    /// stored when enrichment fails.
    ///
    /// # Errors
    ///
    /// * [`AgentError::InvalidSubmission`] if the location has no coordinates
    /// * [`AgentError::Ai`] if generation exhausts its retries
    /// * [`AgentError::Store`] if storing or merging fails
    pub async fn submit(
        &self,
        region_code: &str,
        mut submission: SurveySubmission,
    ) -> Result<SurveySubmission, AgentError> {
        let region = region_registry::region(region_code)?;
        let Some(point) = submission.location.coordinates else {
            return Err(AgentError::InvalidSubmission {
                reason: "location.coordinates is required".to_string(),
            });
        };

        let surveys = &self.services.surveys;
        let reserved = if submission.id.trim().is_empty() {
            let id = surveys.reserve_id(&region.code).await?;
            submission.id.clone_from(&id);
            Some(id)
        } else {
            None
        };

        if let Err(e) = self.enrich_and_store(&region, &mut submission, point).await {
            if let Some(id) = reserved {
                surveys.release_id(&region.code, &id).await;
            }
            log::error!("SurveyBot: submission {} failed: {e}", submission.id);
            return Err(e);
        }

        self.merge(&region.code).await?;
        Ok(submission)
    }

    async fn enrich_and_store(
        &self,
        region: &Region,
        submission: &mut SurveySubmission,
        point: Coordinates,
    ) -> Result<(), AgentError> {
        log::info!(
            "SurveyBot: enriching submission {} ({} in {})",
            submission.id,
            submission.issue_label(),
            submission.city()
        );
        let prompt = build_prompt(submission, region);
        let plan = self
            .services
            .client
            .generate_parsed(&prompt, &config(), SurveyPlan::parse)
            .await?;

        let recommendation = build_recommendation(submission, plan, region.bounds.clamp(point));
        submission.ai_recommendation = Some(recommendation);
        self.services
            .surveys
            .upsert(&region.code, submission.clone())
            .await?;
        Ok(())
    }

    /// Replaces the survey-based recommendations in the region result with
    /// ones rebuilt from stored submissions, placed first.
    ///
    /// Creates an empty result when none exists. Returns whether anything
    /// was written; an unchanged recommendation list is not rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the region is unknown or reading or writing
    /// fails.
    pub async fn merge(&self, region_code: &str) -> Result<bool, AgentError> {
        let state = region_registry::region(region_code)?.code;
        let surveys = &self.services.surveys;

        let written = self
            .services
            .results
            .update(
                &state,
                |slot: &mut Option<AnalysisResult>| -> Result<bool, AgentError> {
                    let survey = rebuild_survey_recommendations(&surveys.load(&state)?);
                    let result = slot.get_or_insert_with(|| AnalysisResult::empty(&state));
                    Ok(result.splice_survey_recommendations(survey))
                },
            )
            .await?;

        if written {
            log::info!("Merged survey recommendations into {state} analysis result");
        } else {
            log::debug!("Survey recommendations for {state} unchanged");
        }
        Ok(written)
    }

    /// Survey-based recommendations for a region as they would be merged.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the region is unknown or the stored
    /// submissions cannot be read.
    pub fn survey_recommendations(&self, region_code: &str) -> Result<Vec<Recommendation>, AgentError> {
        let state = region_registry::region(region_code)?.code;
        Ok(rebuild_survey_recommendations(
            &self.services.surveys.load(&state)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use accessmap_analysis_models::CoordinateMode;

    use super::*;
    use crate::test_support::{ScriptedProvider, cleanup, services};

    const PLAN: &str = r#"Sure, here is the plan:
{
  "priority": "High",
  "title": "Curb ramps for Fresno",
  "description": "Install ramps at Blackstone and Shields",
  "recommended_actions": ["Audit corners", "Install ramps"],
  "type": "Choose the most appropriate type: infrastructure, tech, policy, or community",
  "expected_impact": "Safer crossings"
}"#;

    fn submission(id: &str, with_coordinates: bool) -> SurveySubmission {
        let coordinates = if with_coordinates {
            r#", "coordinates": {"lat": 36.8, "lng": -119.77}"#
        } else {
            ""
        };
        serde_json::from_str(&format!(
            r#"{{
                "id": "{id}",
                "location": {{"city": "Fresno"{coordinates}}},
                "issue": {{"type": "missing_curb_ramps", "description": "No ramps", "severity": "critical"}},
                "demographics": {{"mobility_needs": ["wheelchair users"]}}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn issue_tables() {
        assert_eq!(issue_key("Missing Curb Ramps"), "missing_curb_ramps");
        assert_eq!(sdg_for_issue("poor_lighting"), SDG_PUBLIC_SPACES);
        assert_eq!(sdg_for_issue("unknown"), SDG_TRANSPORT);
        assert_eq!(type_for_issue("lack_of_signage"), RecommendationType::Technology);
        assert_eq!(type_for_issue("broken_sidewalk"), RecommendationType::Infrastructure);
        assert_eq!(
            success_metrics_for_issue("steep_grade", "Fresno")[0],
            "All steep pathways in Fresno now have accessible alternatives"
        );
    }

    #[tokio::test]
    async fn rejects_missing_coordinates_without_calling_model() {
        let provider = ScriptedProvider::new(vec![]);
        let (services, _) = services("survey_reject", provider.clone(), CoordinateMode::Pseudo);
        let service = SurveyRecommendationService::new(Arc::clone(&services));

        let err = service.submit("CA", submission("", false)).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidSubmission { .. }));
        assert_eq!(provider.calls(), 0);
        assert!(services.surveys.load("CA").unwrap().is_empty());
        cleanup(&services);
    }

    #[tokio::test]
    async fn submit_assigns_id_enriches_and_merges() {
        let provider = ScriptedProvider::new(vec![Ok(PLAN)]);
        let (services, _) = services("survey_submit", provider, CoordinateMode::Pseudo);
        let service = SurveyRecommendationService::new(Arc::clone(&services));

        let stored = service.submit("ca", submission("", true)).await.unwrap();
        assert_eq!(stored.id, "survey_1");

        let rec = stored.ai_recommendation.as_ref().unwrap();
        assert_eq!(rec.id, "survey_rec_survey_1");
        assert_eq!(rec.kind, RecommendationType::Infrastructure);
        assert_eq!(rec.title, "Curb ramps for Fresno");
        assert_eq!(rec.impact, Impact::High);
        assert_eq!(rec.cost_estimate, "$25,000 - $100,000");
        assert_eq!(rec.timeline, "8-16 weeks");
        assert_eq!(rec.sdg_alignment.as_deref(), Some(SDG_TRANSPORT));
        assert_eq!(
            rec.equity_impact.as_deref(),
            Some("Addresses accessibility needs for wheelchair users in Fresno")
        );
        assert_eq!(rec.coordinates[0].issue_type, Some(IssueType::MissingCurbRamps));

        let result = services.results.load("CA").unwrap().unwrap();
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].is_survey_based());
        assert!(result.metadata.survey_recommendations_included);
        assert_eq!(result.metadata.total_survey_recommendations, 1);
        cleanup(&services);
    }

    #[tokio::test]
    async fn resubmission_replaces_and_merge_is_idempotent() {
        let provider = ScriptedProvider::new(vec![Ok(PLAN), Ok(PLAN)]);
        let (services, _) = services("survey_resubmit", provider, CoordinateMode::Pseudo);
        let service = SurveyRecommendationService::new(Arc::clone(&services));

        service.submit("CA", submission("survey_7", true)).await.unwrap();
        service.submit("CA", submission("survey_7", true)).await.unwrap();

        assert_eq!(services.surveys.load("CA").unwrap().len(), 1);
        let result = services.results.load("CA").unwrap().unwrap();
        assert_eq!(result.survey_recommendation_count(), 1);

        assert!(!service.merge("CA").await.unwrap());
        assert_eq!(services.results.load("CA").unwrap().unwrap(), result);
        cleanup(&services);
    }

    #[tokio::test]
    async fn new_submission_adds_exactly_one_survey_recommendation() {
        let provider = ScriptedProvider::new(vec![Ok(PLAN), Ok(PLAN)]);
        let (services, _) = services("survey_count", provider.clone(), CoordinateMode::Pseudo);
        let service = SurveyRecommendationService::new(Arc::clone(&services));

        let first = service.submit("CA", submission("", true)).await.unwrap();
        let mut planner = first.ai_recommendation.unwrap();
        planner.id = "rec_1".to_string();
        planner.agent = AgentName::PlannerBot;
        planner.survey = None;

        let mut result = services.results.load("CA").unwrap().unwrap();
        result.recommendations.push(planner.clone());
        services.results.save(&result).await.unwrap();
        let before = result.survey_recommendation_count();

        let second = service.submit("CA", submission("", true)).await.unwrap();
        assert_eq!(second.id, "survey_2");

        let after = services.results.load("CA").unwrap().unwrap();
        assert_eq!(after.survey_recommendation_count(), before + 1);
        assert_eq!(after.recommendations.len(), 3);
        assert_eq!(after.recommendations.last(), Some(&planner));

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.contains("Fresno")));
        cleanup(&services);
    }

    #[tokio::test]
    async fn failed_enrichment_stores_nothing() {
        let provider = ScriptedProvider::new(vec![Ok("no json"), Ok("still none"), Err("503")]);
        let (services, _) = services("survey_fail", provider, CoordinateMode::Pseudo);
        let service = SurveyRecommendationService::new(Arc::clone(&services));

        let err = service.submit("CA", submission("", true)).await.unwrap_err();
        assert!(matches!(err, AgentError::Ai(_)));
        assert!(services.surveys.load("CA").unwrap().is_empty());
        assert!(services.results.load("CA").unwrap().is_none());

        // the released id is handed out again
        assert_eq!(services.surveys.reserve_id("CA").await.unwrap(), "survey_1");
        cleanup(&services);
    }

    #[test]
    fn rebuild_attaches_provenance() {
        let mut with_rec = submission("survey_2", true);
        with_rec.ai_recommendation = Some(build_recommendation(
            &with_rec,
            SurveyPlan::parse(PLAN).unwrap(),
            Coordinates::new(36.8, -119.77),
        ));
        let without = submission("survey_3", true);

        let recs = rebuild_survey_recommendations(&[with_rec.clone(), without, with_rec]);
        assert_eq!(recs.len(), 1);
        let origin = recs[0].survey.as_ref().unwrap();
        assert_eq!(origin.survey_id, "survey_2");
        assert_eq!(origin.survey_location.city.as_deref(), Some("Fresno"));
        assert!(recs[0].is_survey_based());
    }
}
