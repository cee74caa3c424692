//! Sequences the three stages and persists the region's result.

use std::sync::Arc;
use std::time::Instant;

use accessmap_analysis_models::result::PipelineOutput;
use accessmap_analysis_models::{AccessibilityGap, AnalysisResult, PriorityArea, Recommendation};
use accessmap_census::load_census;
use accessmap_geocoder::region_registry::{self, Region};
use accessmap_store::Stage;
use async_trait::async_trait;
use chrono::Utc;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::enhancer::CoordinateResolver;
use crate::plan::PlanAgent;
use crate::priority::PriorityAgent;
use crate::scan::ScanAgent;
use crate::survey::rebuild_survey_recommendations;
use crate::{AgentError, Services};

/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineState {
    Initializing,
    Scanning,
    Prioritizing,
    Planning,
    Completed,
    Failed,
}

/// Observes state transitions of a run.
#[async_trait]
pub trait StageTracker: Send + Sync {
    async fn enter(&self, state: PipelineState);
}

/// Logs transitions and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

#[async_trait]
impl StageTracker for NoopTracker {
    async fn enter(&self, state: PipelineState) {
        log::debug!("Pipeline state: {state}");
    }
}

/// Runs the full pipeline or single stages for a region.
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    services: Arc<Services>,
}

impl PipelineOrchestrator {
    #[must_use]
    pub const fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    #[must_use]
    pub const fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Runs scan, prioritize and plan in order and persists the result with
    /// the region's survey recommendations spliced in.
    ///
    /// A failing stage ends the run in [`PipelineState::Failed`] and nothing
    /// is persisted.
    ///
    /// # Errors
    ///
    /// Returns the first [`AgentError`] raised by setup or any stage.
    pub async fn run(
        &self,
        region_code: &str,
        tracker: &dyn StageTracker,
    ) -> Result<AnalysisResult, AgentError> {
        tracker.enter(PipelineState::Initializing).await;

        match self.run_stages(region_code, tracker).await {
            Ok(result) => {
                tracker.enter(PipelineState::Completed).await;
                log::info!(
                    "Analysis for {} completed in {:.1}s",
                    result.metadata.state,
                    result.metadata.analysis_duration_seconds
                );
                Ok(result)
            }
            Err(e) => {
                log::error!("Analysis for {region_code} failed: {e}");
                tracker.enter(PipelineState::Failed).await;
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        region_code: &str,
        tracker: &dyn StageTracker,
    ) -> Result<AnalysisResult, AgentError> {
        let started = Instant::now();
        let analysis_date = Utc::now();
        let (region, resolver) = self.setup(region_code).await?;
        let state = region.code.as_str();
        let census = load_census(&self.services.data_dir, state)?;
        let client = &self.services.client;

        tracker.enter(PipelineState::Scanning).await;
        let scan_results = ScanAgent::new(client, &resolver).scan(&census, state).await?;

        tracker.enter(PipelineState::Prioritizing).await;
        let priority_areas = PriorityAgent::new(client, &resolver)
            .prioritize(&scan_results, &census, state)
            .await?;

        tracker.enter(PipelineState::Planning).await;
        let recommendations = PlanAgent::new(client)
            .plan(&scan_results, &priority_areas, state)
            .await?;

        let mut result = AnalysisResult::from_pipeline(
            state,
            analysis_date,
            started.elapsed().as_secs_f64(),
            census.len(),
            resolver.mode(),
            PipelineOutput {
                scan_results,
                priority_areas,
                recommendations,
            },
        );

        let surveys = &self.services.surveys;
        self.services
            .results
            .update(
                state,
                |slot: &mut Option<AnalysisResult>| -> Result<bool, AgentError> {
                    let survey = rebuild_survey_recommendations(&surveys.load(state)?);
                    if !survey.is_empty() {
                        log::info!("Including {} survey recommendations", survey.len());
                    }
                    result.splice_survey_recommendations(survey);
                    *slot = Some(result.clone());
                    Ok(true)
                },
            )
            .await?;

        Ok(result)
    }

    async fn setup(&self, region_code: &str) -> Result<(Region, CoordinateResolver), AgentError> {
        let region = region_registry::region(region_code)?;
        let resolver = self.services.resolver(&region).await?;
        log::info!(
            "Analyzing {} ({}) with {} coordinates",
            region.name,
            region.code,
            resolver.mode()
        );
        Ok((region, resolver))
    }

    /// Runs the scan stage alone and stores its output.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if census loading, the scan or storing fails.
    pub async fn run_scan(&self, region_code: &str) -> Result<Vec<AccessibilityGap>, AgentError> {
        let (region, resolver) = self.setup(region_code).await?;
        let census = load_census(&self.services.data_dir, &region.code)?;

        let gaps = ScanAgent::new(&self.services.client, &resolver)
            .scan(&census, &region.code)
            .await?;
        self.services.stages.save(Stage::Scan, &region.code, &gaps)?;
        Ok(gaps)
    }

    /// Runs prioritization over stored scan output and stores the areas.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingInput`] if no scan output is stored, or
    /// any error from the stage itself.
    pub async fn run_prioritize(&self, region_code: &str) -> Result<Vec<PriorityArea>, AgentError> {
        let (region, resolver) = self.setup(region_code).await?;
        let gaps = self.stored::<AccessibilityGap>(Stage::Scan, &region.code)?;
        let census = load_census(&self.services.data_dir, &region.code)?;

        let areas = PriorityAgent::new(&self.services.client, &resolver)
            .prioritize(&gaps, &census, &region.code)
            .await?;
        self.services.stages.save(Stage::Priority, &region.code, &areas)?;
        Ok(areas)
    }

    /// Runs planning over stored scan and priority output and stores the
    /// recommendations.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingInput`] if either upstream output is
    /// missing, or any error from the stage itself.
    pub async fn run_plan(&self, region_code: &str) -> Result<Vec<Recommendation>, AgentError> {
        let region = region_registry::region(region_code)?;
        let gaps = self.stored::<AccessibilityGap>(Stage::Scan, &region.code)?;
        let areas = self.stored::<PriorityArea>(Stage::Priority, &region.code)?;

        let recommendations = PlanAgent::new(&self.services.client)
            .plan(&gaps, &areas, &region.code)
            .await?;
        self.services
            .stages
            .save(Stage::Plan, &region.code, &recommendations)?;
        Ok(recommendations)
    }

    fn stored<T: serde::de::DeserializeOwned>(
        &self,
        stage: Stage,
        state: &str,
    ) -> Result<Vec<T>, AgentError> {
        self.services
            .stages
            .load(stage, state)?
            .ok_or_else(|| AgentError::MissingInput {
                what: format!("{stage} output for {state}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use accessmap_analysis_models::survey::SurveySubmission;
    use accessmap_analysis_models::{AgentName, CoordinateMode, Coordinates, Severity};

    use super::*;
    use crate::test_support::{ScriptedProvider, cleanup, services};

    const SCAN: &str = r#"[
  {"location": "Fresno, CA", "issue_type": "Missing Curb Ramps", "severity": "critical"},
  {"location": "Palm Springs, CA", "issue_type": "Poor Lighting", "severity": "moderate"},
  {"location": "Compton, CA", "issue_type": "Broken Sidewalk", "severity": "critical"}
]"#;

    const PRIORITY: &str = r#"[
  {"location": "Fresno, CA"},
  {"location": "Palm Springs, CA"},
  {"location": "Compton, CA"}
]"#;

    const PLAN: &str = r#"[
  {"type": "infrastructure", "title": "Ramp program", "description": "Install curb ramps"},
  {"type": "policy", "title": "Lighting standards", "description": "Adopt lighting standards"}
]"#;

    #[derive(Default)]
    struct RecordingTracker {
        states: Mutex<Vec<PipelineState>>,
    }

    #[async_trait]
    impl StageTracker for RecordingTracker {
        async fn enter(&self, state: PipelineState) {
            self.states.lock().unwrap().push(state);
        }
    }

    #[tokio::test]
    async fn full_run_persists_result_with_survey_recommendations_first() {
        let provider = ScriptedProvider::new(vec![Ok(SCAN), Ok(PRIORITY), Ok(PLAN)]);
        let (services, _) = services("orch_full", provider.clone(), CoordinateMode::Pseudo);

        let mut submission: SurveySubmission = serde_json::from_str(
            r#"{"id": "survey_1", "location": {"city": "Fresno", "coordinates": {"lat": 36.7, "lng": -119.8}},
                "issue": {"type": "poor_lighting", "severity": "critical"}}"#,
        )
        .unwrap();
        submission.ai_recommendation = Some(Recommendation {
            id: String::new(),
            kind: accessmap_analysis_models::RecommendationType::Infrastructure,
            title: "Light the corridor".to_string(),
            description: "Add lighting".to_string(),
            target_locations: vec!["Fresno".to_string()],
            coordinates: Vec::new(),
            impact: accessmap_analysis_models::Impact::High,
            cost_estimate: "$25,000 - $100,000".to_string(),
            timeline: "8-16 weeks".to_string(),
            implementation_steps: Vec::new(),
            success_metrics: Vec::new(),
            priority_level: accessmap_analysis_models::PriorityLevel::Immediate,
            locations_affected: 1,
            sdg_alignment: None,
            equity_impact: None,
            rationale: None,
            generated_date: Utc::now().date_naive(),
            agent: AgentName::SurveyBot,
            survey: None,
        });
        services.surveys.upsert("CA", submission).await.unwrap();

        let tracker = RecordingTracker::default();
        let result = PipelineOrchestrator::new(Arc::clone(&services))
            .run("ca", &tracker)
            .await
            .unwrap();

        assert_eq!(
            *tracker.states.lock().unwrap(),
            vec![
                PipelineState::Initializing,
                PipelineState::Scanning,
                PipelineState::Prioritizing,
                PipelineState::Planning,
                PipelineState::Completed,
            ]
        );
        assert_eq!(provider.calls(), 3);

        assert_eq!(result.metadata.state, "CA");
        assert_eq!(result.metadata.total_locations_analyzed, 4);
        assert_eq!(result.metadata.coordinate_mode, Some(CoordinateMode::Pseudo));
        assert_eq!(result.scan_results.len(), 3);
        assert_eq!(result.summary.critical_issues, 2);
        assert!(result.scan_results.iter().any(|g| g.severity == Severity::Moderate));

        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.recommendations[0].id, "survey_rec_survey_1");
        assert!(result.recommendations[0].is_survey_based());
        assert_eq!(result.recommendations[1].agent, AgentName::PlannerBot);
        assert_eq!(result.metadata.total_survey_recommendations, 1);

        assert_eq!(services.results.load("CA").unwrap(), Some(result));
        cleanup(&services);
    }

    #[tokio::test]
    async fn geocoded_run_looks_each_place_up_once() {
        let provider = ScriptedProvider::new(vec![Ok(SCAN), Ok(PRIORITY), Ok(PLAN)]);
        let (services, lookup) = services("orch_geocoded", provider, CoordinateMode::Geocoded);

        let result = PipelineOrchestrator::new(Arc::clone(&services))
            .run("CA", &NoopTracker)
            .await
            .unwrap();

        assert_eq!(result.metadata.coordinate_mode, Some(CoordinateMode::Geocoded));
        let fresno = result
            .scan_results
            .iter()
            .find(|g| g.location == "Fresno, CA")
            .unwrap();
        assert_eq!(fresno.coordinates, Coordinates::new(36.74, -119.79));
        let area = result
            .priority_areas
            .iter()
            .find(|a| a.location == "Fresno, CA")
            .unwrap();
        assert_eq!(area.coordinates, fresno.coordinates);

        // priority areas reuse the scan's cached lookups
        assert_eq!(lookup.calls(), 3);
        assert!(services.data_dir.geocode_cache("CA").exists());
        cleanup(&services);
    }

    #[tokio::test]
    async fn failed_stage_persists_nothing() {
        let provider = ScriptedProvider::new(vec![
            Ok(SCAN),
            Err("overloaded"),
            Err("overloaded"),
            Err("overloaded"),
        ]);
        let (services, _) = services("orch_fail", provider, CoordinateMode::Pseudo);
        let tracker = RecordingTracker::default();

        let err = PipelineOrchestrator::new(Arc::clone(&services))
            .run("CA", &tracker)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Ai(_)));
        assert_eq!(
            tracker.states.lock().unwrap().last(),
            Some(&PipelineState::Failed)
        );
        assert!(services.results.load("CA").unwrap().is_none());
        cleanup(&services);
    }

    #[tokio::test]
    async fn unknown_region_fails_before_scanning() {
        let provider = ScriptedProvider::new(vec![]);
        let (services, _) = services("orch_region", provider.clone(), CoordinateMode::Pseudo);
        let tracker = RecordingTracker::default();

        let err = PipelineOrchestrator::new(Arc::clone(&services))
            .run("ZZ", &tracker)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Geocode(_)));
        assert_eq!(
            *tracker.states.lock().unwrap(),
            vec![PipelineState::Initializing, PipelineState::Failed]
        );
        assert_eq!(provider.calls(), 0);
        cleanup(&services);
    }

    #[tokio::test]
    async fn single_stages_chain_through_stored_output() {
        let provider = ScriptedProvider::new(vec![Ok(SCAN), Ok(PRIORITY), Ok(PLAN)]);
        let (services, _) = services("orch_stages", provider, CoordinateMode::Pseudo);
        let orchestrator = PipelineOrchestrator::new(Arc::clone(&services));

        let err = orchestrator.run_plan("CA").await.unwrap_err();
        assert!(matches!(err, AgentError::MissingInput { .. }));
        let err = orchestrator.run_prioritize("CA").await.unwrap_err();
        assert!(matches!(err, AgentError::MissingInput { .. }));

        let gaps = orchestrator.run_scan("CA").await.unwrap();
        assert_eq!(gaps.len(), 3);
        let areas = orchestrator.run_prioritize("CA").await.unwrap();
        assert_eq!(areas.len(), 3);
        let recs = orchestrator.run_plan("CA").await.unwrap();
        assert_eq!(recs.len(), 2);

        let stored: Vec<Recommendation> = services.stages.load(Stage::Plan, "CA").unwrap().unwrap();
        assert_eq!(stored, recs);
        // single stages never touch the aggregate result
        assert!(services.results.load("CA").unwrap().is_none());
        cleanup(&services);
    }
}
