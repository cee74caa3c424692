//! IBM watsonx.ai text generation provider.
//!
//! Authenticates by exchanging the API key for a short-lived IAM bearer
//! token, which is cached and refreshed a minute before it expires.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{GenerationConfig, TextProvider};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "ibm/granite-3-3-8b-instruct";

const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";
const API_VERSION: &str = "2023-05-29";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const REPETITION_PENALTY: f32 = 1.1;

/// watsonx.ai provider.
pub struct WatsonxProvider {
    api_key: String,
    project_id: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    refresh_after: Instant,
}

impl WatsonxProvider {
    /// Creates a new watsonx provider. `base_url` is the regional endpoint,
    /// e.g. `https://us-south.ml.cloud.ibm.com`.
    #[must_use]
    pub fn new(api_key: String, project_id: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            project_id,
            model,
            endpoint: format!(
                "{}/ml/v1/text/generation?version={API_VERSION}",
                base_url.trim_end_matches('/')
            ),
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    async fn bearer_token(&self) -> Result<String, AiError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_after
        {
            return Ok(token.value.clone());
        }

        log::debug!("Requesting watsonx IAM token");
        let resp = self
            .client
            .post(IAM_TOKEN_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(format!(
                "grant_type=urn:ibm:params:oauth:grant-type:apikey&apikey={}",
                self.api_key
            ))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AiError::Provider {
                message: format!("IAM token exchange failed: HTTP {status}: {body}"),
            });
        }

        let token: IamToken = serde_json::from_str(&body)?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_after: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct IamToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    input: &'a str,
    parameters: GenerationParameters<'a>,
}

#[derive(Serialize)]
struct GenerationParameters<'a> {
    decoding_method: &'a str,
    max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    repetition_penalty: f32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop_sequences: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    include_stop_sequence: Option<bool>,
}

impl<'a> GenerationParameters<'a> {
    fn from_config(config: &'a GenerationConfig) -> Self {
        let greedy = config.temperature <= 0.0;
        Self {
            decoding_method: if greedy { "greedy" } else { "sample" },
            max_new_tokens: config.max_output_tokens,
            temperature: (!greedy).then_some(config.temperature),
            repetition_penalty: REPETITION_PENALTY,
            stop_sequences: &config.stop_sequences,
            include_stop_sequence: (!config.stop_sequences.is_empty()).then_some(true),
        }
    }
}

#[derive(Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Deserialize)]
struct GenerationResult {
    generated_text: String,
}

#[derive(Deserialize)]
struct WatsonxError {
    errors: Vec<WatsonxErrorDetail>,
}

#[derive(Deserialize)]
struct WatsonxErrorDetail {
    message: String,
}

fn response_text(body: &str) -> Result<String, AiError> {
    let response: GenerationResponse = serde_json::from_str(body)?;
    response
        .results
        .into_iter()
        .next()
        .map(|r| r.generated_text)
        .ok_or_else(|| AiError::Provider {
            message: "No results in watsonx response".to_string(),
        })
}

#[async_trait::async_trait]
impl TextProvider for WatsonxProvider {
    fn name(&self) -> &str {
        "watsonx"
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AiError> {
        let token = self.bearer_token().await?;

        let request = GenerationRequest {
            model_id: &self.model,
            project_id: &self.project_id,
            input: prompt,
            parameters: GenerationParameters::from_config(config),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Force a fresh token on the next attempt.
            self.token.lock().await.take();
        }

        if !status.is_success() {
            let message = serde_json::from_str::<WatsonxError>(&body)
                .ok()
                .and_then(|e| e.errors.into_iter().next())
                .map_or_else(|| format!("HTTP {status}: {body}"), |e| e.message);
            return Err(AiError::Provider { message });
        }

        response_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_temperature_is_greedy() {
        let config = GenerationConfig::new(800, 0.0).with_stop_sequences(["}]"]);
        let params = serde_json::to_value(GenerationParameters::from_config(&config)).unwrap();
        assert_eq!(params["decoding_method"], "greedy");
        assert!(params.get("temperature").is_none());
        assert_eq!(params["stop_sequences"][0], "}]");
        assert_eq!(params["include_stop_sequence"], true);
    }

    #[test]
    fn positive_temperature_samples() {
        let config = GenerationConfig::new(1000, 0.7);
        let params = serde_json::to_value(GenerationParameters::from_config(&config)).unwrap();
        assert_eq!(params["decoding_method"], "sample");
        assert_eq!(params["max_new_tokens"], 1000);
        assert!(params.get("stop_sequences").is_none());
        assert!(params.get("include_stop_sequence").is_none());
    }

    #[test]
    fn reads_generated_text() {
        let body = r#"{"model_id": "m", "results": [{"generated_text": "[{}]", "stop_reason": "eos_token"}]}"#;
        assert_eq!(response_text(body).unwrap(), "[{}]");
    }

    #[test]
    fn endpoint_includes_version() {
        let provider = WatsonxProvider::new(
            "k".to_string(),
            "p".to_string(),
            DEFAULT_MODEL.to_string(),
            "https://us-south.ml.cloud.ibm.com/".to_string(),
        );
        assert_eq!(
            provider.endpoint,
            "https://us-south.ml.cloud.ibm.com/ml/v1/text/generation?version=2023-05-29"
        );
    }
}
