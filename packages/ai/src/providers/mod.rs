//! Text generation provider abstraction and implementations.
//!
//! Supports Anthropic Claude, `OpenAI` and IBM watsonx.ai via a common
//! trait.

pub mod anthropic;
pub mod openai;
pub mod watsonx;

use crate::AiError;

/// Sampling parameters for one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Sampling temperature. Zero means greedy decoding.
    pub temperature: f32,
    /// Sequences that end generation early. When the service reports that
    /// it stopped on one, the returned text ends with that sequence.
    /// Output cut off by the token limit is returned as is.
    pub stop_sequences: Vec<String>,
}

impl GenerationConfig {
    /// Creates a config without stop sequences.
    #[must_use]
    pub const fn new(max_output_tokens: u32, temperature: f32) -> Self {
        Self {
            max_output_tokens,
            temperature,
            stop_sequences: Vec::new(),
        }
    }

    /// Adds stop sequences.
    #[must_use]
    pub fn with_stop_sequences<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences.extend(stops.into_iter().map(Into::into));
        self
    }
}

/// Trait for text generation providers.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Sends one prompt and returns the raw generated text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the service reports an
    /// error.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AiError>;
}

/// Creates a provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `WATSONX_API_KEY` set -> IBM watsonx.ai
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 3. `OPENAI_API_KEY` or `AI_BASE_URL` set -> `OpenAI` (or compatible)
///
/// The model comes from `AI_MODEL`, falling back to a per-provider default.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn TextProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());
    let model = std::env::var("AI_MODEL").ok();

    match provider.to_lowercase().as_str() {
        "watsonx" | "ibm" => {
            let api_key = required_env("WATSONX_API_KEY")?;
            let project_id = required_env("WATSONX_PROJECT_ID")?;
            let base_url = std::env::var("WATSONX_URL").unwrap_or_else(|_| {
                let region =
                    std::env::var("WATSONX_REGION").unwrap_or_else(|_| "us-south".to_string());
                format!("https://{region}.ml.cloud.ibm.com")
            });
            let model = model.unwrap_or_else(|| watsonx::DEFAULT_MODEL.to_string());
            Ok(Box::new(watsonx::WatsonxProvider::new(
                api_key, project_id, model, base_url,
            )))
        }
        "anthropic" | "claude" => {
            let api_key = required_env("ANTHROPIC_API_KEY")?;
            let model = model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let base_url = std::env::var("AI_BASE_URL").ok();
            // Local OpenAI-compatible servers usually take no key.
            let api_key = match (std::env::var("OPENAI_API_KEY"), &base_url) {
                (Ok(key), _) => Some(key),
                (Err(_), Some(_)) => None,
                (Err(_), None) => {
                    return Err(AiError::Config {
                        message: "OPENAI_API_KEY environment variable not set".to_string(),
                    });
                }
            };
            let model = model.unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            Ok(Box::new(openai::OpenAiProvider::new(api_key, model, base_url)))
        }
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'watsonx', 'anthropic', or 'openai'."
            ),
        }),
    }
}

fn required_env(name: &str) -> Result<String, AiError> {
    std::env::var(name).map_err(|_| AiError::Config {
        message: format!("{name} environment variable not set"),
    })
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> String {
    detect_provider_with(|name| std::env::var(name).is_ok())
}

fn detect_provider_with(is_set: impl Fn(&str) -> bool) -> String {
    if is_set("WATSONX_API_KEY") {
        log::info!("Auto-detected AI provider: watsonx (WATSONX_API_KEY found)");
        return "watsonx".to_string();
    }

    if is_set("ANTHROPIC_API_KEY") {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    if is_set("OPENAI_API_KEY") || is_set("AI_BASE_URL") {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY or AI_BASE_URL found)");
        return "openai".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set one of: WATSONX_API_KEY (with \
         WATSONX_PROJECT_ID), ANTHROPIC_API_KEY, OPENAI_API_KEY, or AI_BASE_URL. \
         You can also set AI_PROVIDER explicitly."
    );

    // Falls through to a clear missing-key error
    "watsonx".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_prefers_watsonx_then_anthropic_then_openai() {
        assert_eq!(
            detect_provider_with(|k| k == "WATSONX_API_KEY" || k == "ANTHROPIC_API_KEY"),
            "watsonx"
        );
        assert_eq!(
            detect_provider_with(|k| k == "ANTHROPIC_API_KEY" || k == "OPENAI_API_KEY"),
            "anthropic"
        );
        assert_eq!(detect_provider_with(|k| k == "AI_BASE_URL"), "openai");
        assert_eq!(detect_provider_with(|_| false), "watsonx");
    }

    #[test]
    fn config_builder_collects_stops() {
        let config = GenerationConfig::new(800, 0.1).with_stop_sequences(["}]"]);
        assert_eq!(config.max_output_tokens, 800);
        assert_eq!(config.stop_sequences, vec!["}]".to_string()]);
    }
}
