//! `OpenAI` chat completions provider implementation.
//!
//! Also serves any `OpenAI`-compatible server (Ollama, vLLM, llama.cpp,
//! LM Studio) when a base URL is given.

use serde::{Deserialize, Serialize};

use super::{GenerationConfig, TextProvider};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` API provider.
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
    ///
    /// `base_url` is the API root (e.g. `http://localhost:11434/v1`); the
    /// public `OpenAI` endpoint is used when it is `None`.
    #[must_use]
    pub fn new(api_key: Option<String>, model: String, base_url: Option<String>) -> Self {
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: [OpenAiMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// Reads the first choice.
///
/// The API strips a matched stop sequence and reports `"stop"` for both a
/// natural end and a stop-sequence match, so the sequence is restored only
/// when it is the single one requested. A `"length"` finish is left as is.
fn response_text(body: &str, stop_sequences: &[String]) -> Result<String, AiError> {
    let response: OpenAiResponse = serde_json::from_str(body)?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::Provider {
            message: "No choices in OpenAI response".to_string(),
        })?;

    let mut text = match choice.message.content {
        Some(text) if !text.is_empty() => text,
        _ => {
            return Err(AiError::Provider {
                message: "OpenAI response contained no text".to_string(),
            });
        }
    };

    if choice.finish_reason.as_deref() == Some("stop")
        && let [sequence] = stop_sequences
        && !text.ends_with(sequence.as_str())
    {
        text.push_str(sequence);
    }

    Ok(text)
}

#[async_trait::async_trait]
impl TextProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AiError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: [OpenAiMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: config.max_output_tokens,
            temperature: config.temperature,
            stop: &config.stop_sequences,
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let resp = builder.json(&request).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: OpenAiError = serde_json::from_str(&body).unwrap_or_else(|_| OpenAiError {
                error: OpenAiErrorDetail {
                    message: format!("HTTP {status}: {body}"),
                },
            });
            return Err(AiError::Provider {
                message: err.error.message,
            });
        }

        response_text(&body, &config.stop_sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let provider = OpenAiProvider::new(
            None,
            "llama3".to_string(),
            Some("http://localhost:11434/v1/".to_string()),
        );
        assert_eq!(provider.endpoint, "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn reads_first_choice() {
        let body = r#"{"choices": [{"message": {"content": "[]"}, "finish_reason": "stop"}]}"#;
        assert_eq!(response_text(body, &[]).unwrap(), "[]");
    }

    #[test]
    fn restores_single_stop_sequence_only_on_stop() {
        let stops = vec!["}]".to_string()];
        let stopped = r#"{"choices": [{"message": {"content": "[{\"a\": 1"}, "finish_reason": "stop"}]}"#;
        assert_eq!(response_text(stopped, &stops).unwrap(), "[{\"a\": 1}]");

        let cut = r#"{"choices": [{"message": {"content": "[{\"a\": 1"}, "finish_reason": "length"}]}"#;
        assert_eq!(response_text(cut, &stops).unwrap(), "[{\"a\": 1");
    }

    #[test]
    fn missing_content_is_a_provider_error() {
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        assert!(matches!(response_text(body, &[]), Err(AiError::Provider { .. })));
        assert!(matches!(
            response_text(r#"{"choices": []}"#, &[]),
            Err(AiError::Provider { .. })
        ));
    }
}
