//! Retrying wrapper around a [`TextProvider`].

use std::fmt;
use std::sync::Arc;

use crate::providers::{GenerationConfig, TextProvider};
use crate::repair::RepairError;
use crate::{AiError, retry};

/// Attempts per call, shared between service and parse failures.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Generates text through a provider with a bounded retry budget.
///
/// Every attempt sends the same prompt. Nothing is carried between
/// attempts; a response that fails to parse is discarded and generation is
/// re-run.
#[derive(Clone)]
pub struct GenerativeClient {
    provider: Arc<dyn TextProvider>,
    max_attempts: u32,
}

impl fmt::Debug for GenerativeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeClient")
            .field("provider", &self.provider.name())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Why one attempt failed.
enum AttemptFailure {
    Service(AiError),
    Parse(RepairError),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl GenerativeClient {
    /// Creates a client with the default budget of three attempts.
    #[must_use]
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Name of the wrapped provider.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generates raw text, retrying service failures.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Generation`] once every attempt has failed.
    pub async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AiError> {
        self.generate_parsed(prompt, config, |text| Ok(text.to_string()))
            .await
    }

    /// Generates text and parses it, retrying either kind of failure under
    /// one shared budget.
    ///
    /// # Errors
    ///
    /// * [`AiError::Generation`] if the last attempt failed at the service
    /// * [`AiError::Parse`] if the last attempt produced unparseable text
    pub async fn generate_parsed<T, P>(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        parse: P,
    ) -> Result<T, AiError>
    where
        P: Fn(&str) -> Result<T, RepairError> + Send + Sync,
        T: Send,
    {
        let label = format!("{} generation", self.provider.name());
        let provider = &self.provider;
        let parse = &parse;

        let outcome = retry::attempt(&label, self.max_attempts, |attempt| async move {
            log::debug!(
                "Sending prompt ({} chars, attempt {attempt})",
                prompt.len()
            );
            let text = provider
                .generate(prompt, config)
                .await
                .map_err(AttemptFailure::Service)?;
            log::trace!("Generated text: {text}");
            parse(&text).map_err(|e| {
                log::debug!(
                    "Unparseable output ({} chars): {}",
                    text.len(),
                    text.chars().take(300).collect::<String>()
                );
                AttemptFailure::Parse(e)
            })
        })
        .await;

        outcome.map_err(|failure| match failure {
            AttemptFailure::Service(e) => AiError::Generation {
                attempts: self.max_attempts,
                message: e.to_string(),
            },
            AttemptFailure::Parse(e) => AiError::Parse(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::repair::repair_array;

    /// Replays scripted responses in order.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(ToString::to_string).map_err(ToString::to_string))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl TextProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str, _: &GenerationConfig) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(AiError::Provider { message }),
                None => Err(AiError::Provider {
                    message: "script exhausted".to_string(),
                }),
            }
        }
    }

    fn config() -> GenerationConfig {
        GenerationConfig::new(100, 0.1)
    }

    #[tokio::test]
    async fn retries_service_errors_with_same_prompt() {
        let provider = ScriptedProvider::new(vec![Err("503"), Ok("hello")]);
        let client = GenerativeClient::new(provider.clone());

        let text = client.generate("prompt", &config()).await.unwrap();
        assert_eq!(text, "hello");
        assert_eq!(provider.calls(), 2);
        assert!(provider.prompts.lock().unwrap().iter().all(|p| p == "prompt"));
    }

    #[tokio::test]
    async fn exhausted_service_errors_surface_generation_error() {
        let provider = ScriptedProvider::new(vec![Err("a"), Err("b"), Err("c"), Ok("[]")]);
        let client = GenerativeClient::new(provider.clone());

        let err = client.generate("p", &config()).await.unwrap_err();
        assert!(matches!(err, AiError::Generation { attempts: 3, ref message } if message.contains('c')));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn parse_failures_share_the_budget() {
        let provider = ScriptedProvider::new(vec![Err("down"), Ok("no json here"), Ok(r#"[{"a": 1}]"#)]);
        let client = GenerativeClient::new(provider.clone());

        let records = client
            .generate_parsed("p", &config(), repair_array)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn last_parse_failure_surfaces_parse_error() {
        let provider = ScriptedProvider::new(vec![Err("down"), Err("down"), Ok("still no json")]);
        let client = GenerativeClient::new(provider.clone());

        let err = client
            .generate_parsed("p", &config(), repair_array)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Parse(RepairError::NotFound { .. })));
        assert_eq!(provider.calls(), 3);
    }
}
