//! Renders pipeline state transitions on an `indicatif` bar.

use accessmap_agents::{PipelineState, StageTracker};
use accessmap_cli_utils::{MultiProgress, StageProgress};
use async_trait::async_trait;

const STAGES: u64 = 3;

/// A [`StageTracker`] that drives a three-stage [`StageProgress`].
pub struct BarTracker {
    progress: StageProgress,
}

impl BarTracker {
    #[must_use]
    pub fn new(multi: &MultiProgress, region: &str) -> Self {
        Self {
            progress: StageProgress::stages(multi, &format!("Analyzing {region}"), STAGES),
        }
    }
}

#[async_trait]
impl StageTracker for BarTracker {
    async fn enter(&self, state: PipelineState) {
        match state {
            PipelineState::Initializing => self.progress.set_message("Loading census data"),
            PipelineState::Scanning => self.progress.enter_stage(0, "AccessScanner: scanning"),
            PipelineState::Prioritizing => {
                self.progress.enter_stage(1, "EquityAdvisor: prioritizing");
            }
            PipelineState::Planning => self.progress.enter_stage(2, "PlannerBot: planning"),
            PipelineState::Completed => self.progress.finish("Analysis complete"),
            PipelineState::Failed => self.progress.fail("Analysis failed"),
        }
    }
}
