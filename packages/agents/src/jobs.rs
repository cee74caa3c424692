//! Background execution of pipeline and survey work.
//!
//! Each `spawn_*` call registers a job, starts it on the runtime and
//! returns the job id immediately. Callers poll the [`JobRegistry`].

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use accessmap_analysis_models::result::AnalysisSummary;
use accessmap_analysis_models::survey::SurveySubmission;
use accessmap_store::{JobKind, JobRegistry, Stage};
use async_trait::async_trait;

use crate::{
    AgentError, PipelineOrchestrator, PipelineState, Services, StageTracker,
    SurveyRecommendationService,
};

/// What a finished job reports back.
#[derive(Debug, Default)]
struct JobOutcome {
    summary: Option<AnalysisSummary>,
    results_file: Option<String>,
}

fn file_label(path: &Path) -> String {
    path.display().to_string()
}

/// Mirrors pipeline states into the job's `stage` field.
struct JobStageTracker {
    registry: Arc<JobRegistry>,
    job_id: String,
}

#[async_trait]
impl StageTracker for JobStageTracker {
    async fn enter(&self, state: PipelineState) {
        log::debug!("Job {} entering {state}", self.job_id);
        self.registry.set_stage(&self.job_id, state.as_ref()).await;
    }
}

/// Spawns jobs against one set of services.
#[derive(Debug, Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    services: Arc<Services>,
}

impl JobRunner {
    #[must_use]
    pub const fn new(registry: Arc<JobRegistry>, services: Arc<Services>) -> Self {
        Self { registry, services }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    async fn spawn<F, Fut>(&self, kind: JobKind, region: &str, work: F) -> String
    where
        F: FnOnce(PipelineOrchestrator, JobStageTracker, String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<JobOutcome, AgentError>> + Send + 'static,
    {
        let code = region.trim().to_uppercase();
        let job_id = self.registry.create(kind, &code).await;
        let registry = Arc::clone(&self.registry);
        let orchestrator = PipelineOrchestrator::new(Arc::clone(&self.services));
        let tracker = JobStageTracker {
            registry: Arc::clone(&registry),
            job_id: job_id.clone(),
        };

        let id = job_id.clone();
        tokio::spawn(async move {
            registry.mark_running(&id).await;
            match work(orchestrator, tracker, code).await {
                Ok(outcome) => {
                    registry
                        .complete(&id, outcome.summary, outcome.results_file)
                        .await;
                }
                Err(e) => registry.fail(&id, e.to_string()).await,
            }
        });

        log::info!("Started {kind} job {job_id}");
        job_id
    }

    /// Runs the full pipeline.
    pub async fn spawn_complete(&self, region: &str) -> String {
        self.spawn(JobKind::Complete, region, |orchestrator, tracker, code| async move {
            let result = orchestrator.run(&code, &tracker).await?;
            Ok(JobOutcome {
                summary: Some(result.summary),
                results_file: Some(file_label(
                    &orchestrator
                        .services()
                        .data_dir
                        .analysis_result(&result.metadata.state),
                )),
            })
        })
        .await
    }

    /// Runs the scan stage alone.
    pub async fn spawn_scan(&self, region: &str) -> String {
        self.spawn(JobKind::Scan, region, |orchestrator, _, code| async move {
            let gaps = orchestrator.run_scan(&code).await?;
            Ok(stage_outcome(
                &orchestrator,
                Stage::Scan,
                &code,
                AnalysisSummary::from_parts(&gaps, &[], &[]),
            ))
        })
        .await
    }

    /// Runs prioritization over the stored scan output.
    pub async fn spawn_prioritize(&self, region: &str) -> String {
        self.spawn(JobKind::Prioritize, region, |orchestrator, _, code| async move {
            let areas = orchestrator.run_prioritize(&code).await?;
            Ok(stage_outcome(
                &orchestrator,
                Stage::Priority,
                &code,
                AnalysisSummary::from_parts(&[], &areas, &[]),
            ))
        })
        .await
    }

    /// Runs planning over the stored scan and priority output.
    pub async fn spawn_plan(&self, region: &str) -> String {
        self.spawn(JobKind::Plan, region, |orchestrator, _, code| async move {
            let recommendations = orchestrator.run_plan(&code).await?;
            Ok(stage_outcome(
                &orchestrator,
                Stage::Plan,
                &code,
                AnalysisSummary::from_parts(&[], &[], &recommendations),
            ))
        })
        .await
    }

    /// Enriches and merges one survey submission.
    pub async fn spawn_survey(&self, region: &str, submission: SurveySubmission) -> String {
        self.spawn(JobKind::Survey, region, move |orchestrator, _, code| async move {
            let services = Arc::clone(orchestrator.services());
            let stored = SurveyRecommendationService::new(Arc::clone(&services))
                .submit(&code, submission)
                .await?;
            log::info!("Survey {} merged into {code}", stored.id);
            Ok(JobOutcome {
                summary: services.results.load(&code)?.map(|r| r.summary),
                results_file: Some(file_label(&services.data_dir.analysis_result(&code))),
            })
        })
        .await
    }
}

fn stage_outcome(
    orchestrator: &PipelineOrchestrator,
    stage: Stage,
    code: &str,
    summary: AnalysisSummary,
) -> JobOutcome {
    JobOutcome {
        summary: Some(summary),
        results_file: Some(file_label(
            &orchestrator
                .services()
                .data_dir
                .stage_output(stage.as_ref(), code),
        )),
    }
}
