#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The three-stage accessibility analysis pipeline.
//!
//! Census data flows through three generative agents:
//!
//! 1. [`scan::ScanAgent`] (`AccessScanner`) finds accessibility gaps.
//! 2. [`priority::PriorityAgent`] (`EquityAdvisor`) ranks places by
//!    vulnerability and gap severity.
//! 3. [`plan::PlanAgent`] (`PlannerBot`) turns gaps and priorities into
//!    recommendations.
//!
//! Each agent prompts the model, repairs and coerces its output into typed
//! [`proposals`], and enriches those with census ground truth through the
//! [`enhancer`]. The [`orchestrator`] sequences the stages and persists the
//! aggregate result; the [`survey`] service enriches single community
//! submissions and splices them into the same result. [`jobs`] runs either
//! as a background task tracked in a job registry.

pub mod enhancer;
pub mod jobs;
pub mod orchestrator;
pub mod plan;
pub mod priority;
pub mod proposals;
pub mod scan;
pub mod services;
pub mod survey;

#[cfg(test)]
mod test_support;

pub use jobs::JobRunner;
pub use orchestrator::{NoopTracker, PipelineOrchestrator, PipelineState, StageTracker};
pub use services::Services;
pub use survey::SurveyRecommendationService;

use accessmap_ai::AiError;
use accessmap_census::CensusError;
use accessmap_geocoder::GeocodeError;
use accessmap_store::StoreError;
use thiserror::Error;

/// Errors that can occur running an agent or the pipeline.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Generation or parsing failed after every attempt.
    #[error(transparent)]
    Ai(#[from] AiError),

    /// Census data could not be loaded.
    #[error(transparent)]
    Census(#[from] CensusError),

    /// Reading or writing stored documents failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Region or geocoder setup failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// Building a prompt failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stage's upstream output has not been produced yet.
    #[error("Missing input: {what}")]
    MissingInput {
        /// What is missing.
        what: String,
    },

    /// A survey submission cannot be processed.
    #[error("Invalid submission: {reason}")]
    InvalidSubmission {
        /// Why it was rejected.
        reason: String,
    },

    /// Every record a stage produced was dropped during enrichment.
    #[error("{stage} produced no usable records")]
    NoUsableRecords {
        /// Stage name.
        stage: String,
    },
}
