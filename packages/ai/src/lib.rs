#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Generative text client with provider abstraction.
//!
//! Supports Anthropic Claude, `OpenAI` (and any `OpenAI`-compatible
//! local/self-hosted server via the `AI_BASE_URL` environment variable),
//! and IBM watsonx.ai. The [`GenerativeClient`] wraps a provider with a
//! bounded retry budget, and [`repair`] turns loosely formatted model output
//! into JSON values.

pub mod client;
pub mod providers;
pub mod repair;
pub mod retry;

pub use client::GenerativeClient;
pub use providers::{GenerationConfig, TextProvider, create_provider_from_env};
pub use repair::RepairError;

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// Every attempt failed and the last failure came from the service.
    #[error("Generation failed after {attempts} attempts: {message}")]
    Generation {
        /// Attempts made.
        attempts: u32,
        /// The last service error.
        message: String,
    },

    /// Every attempt failed and the last failure was unparseable output.
    #[error("Generated text could not be parsed: {0}")]
    Parse(#[from] RepairError),
}
