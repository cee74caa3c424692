//! In-memory status registry for background jobs.
//!
//! Jobs are never cancelled; a caller that stops polling leaves the job
//! running to completion or failure.

use std::collections::BTreeMap;

use accessmap_analysis_models::result::AnalysisSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tokio::sync::RwLock;

/// What a job runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    Scan,
    Prioritize,
    Plan,
    Complete,
    Survey,
}

/// Lifecycle state of a job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Whether the job has finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Pollable status of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub kind: JobKind,
    pub region: String,
    pub state: JobState,
    /// Pipeline stage currently running, for multi-stage jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<AnalysisSummary>,
    /// File the job wrote, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_file: Option<String>,
}

/// Shared job table. Clone the surrounding `Arc`, not the registry.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<BTreeMap<String, JobStatus>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a queued job and returns its id,
    /// `{kind}_{region}_{timestamp}_{suffix}`.
    pub async fn create(&self, kind: JobKind, region: &str) -> String {
        let now = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let job_id = format!(
            "{kind}_{region}_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        );

        let status = JobStatus {
            job_id: job_id.clone(),
            kind,
            region: region.to_string(),
            state: JobState::Queued,
            stage: None,
            started_at: now,
            completed_at: None,
            error: None,
            summary: None,
            results_file: None,
        };
        self.jobs.write().await.insert(job_id.clone(), status);
        log::debug!("Registered job {job_id}");
        job_id
    }

    async fn modify(&self, job_id: &str, f: impl FnOnce(&mut JobStatus)) {
        let mut jobs = self.jobs.write().await;
        if let Some(status) = jobs.get_mut(job_id) {
            f(status);
        } else {
            log::warn!("Status update for unknown job {job_id}");
        }
    }

    pub async fn mark_running(&self, job_id: &str) {
        self.modify(job_id, |s| s.state = JobState::Running).await;
    }

    /// Records the stage a running job has reached.
    pub async fn set_stage(&self, job_id: &str, stage: &str) {
        self.modify(job_id, |s| s.stage = Some(stage.to_string()))
            .await;
    }

    /// Marks the job completed.
    pub async fn complete(
        &self,
        job_id: &str,
        summary: Option<AnalysisSummary>,
        results_file: Option<String>,
    ) {
        self.modify(job_id, |s| {
            s.state = JobState::Completed;
            s.completed_at = Some(Utc::now());
            s.summary = summary;
            s.results_file = results_file;
        })
        .await;
        log::info!("Job {job_id} completed");
    }

    /// Marks the job failed with `error`.
    pub async fn fail(&self, job_id: &str, error: impl Into<String>) {
        let error = error.into();
        log::error!("Job {job_id} failed: {error}");
        self.modify(job_id, |s| {
            s.state = JobState::Failed;
            s.completed_at = Some(Utc::now());
            s.error = Some(error);
        })
        .await;
    }

    pub async fn get(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<_> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle() {
        let registry = JobRegistry::new();
        let id = registry.create(JobKind::Scan, "CA").await;
        assert!(id.starts_with("scan_CA_"));

        let status = registry.get(&id).await.unwrap();
        assert_eq!(status.state, JobState::Queued);

        registry.mark_running(&id).await;
        registry.set_stage(&id, "scanning").await;
        let status = registry.get(&id).await.unwrap();
        assert_eq!(status.state, JobState::Running);
        assert_eq!(status.stage.as_deref(), Some("scanning"));

        registry
            .complete(&id, Some(AnalysisSummary::default()), Some("out.json".into()))
            .await;
        let status = registry.get(&id).await.unwrap();
        assert!(status.state.is_terminal());
        assert!(status.completed_at.is_some());
        assert_eq!(status.results_file.as_deref(), Some("out.json"));
    }

    #[tokio::test]
    async fn failure_keeps_message() {
        let registry = JobRegistry::new();
        let id = registry.create(JobKind::Survey, "CA").await;
        registry.fail(&id, "generation failed after 3 attempts").await;

        let status = registry.get(&id).await.unwrap();
        assert_eq!(status.state, JobState::Failed);
        assert_eq!(
            status.error.as_deref(),
            Some("generation failed after 3 attempts")
        );
        assert!(registry.get("missing").await.is_none());
        assert_eq!(registry.list().await.len(), 1);
    }
}
