/// LLM backends that turn document content into raw quiz text.
///
/// Every backend implements `QuizBackend`; callers pick one by its wire name
/// through `create_backend`. Backends hold no state beyond their own config and
/// HTTP client, so each request builds a fresh one.
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::content::ContentBundle;

pub mod ollama;
pub mod openrouter;
pub mod prompts;

pub use ollama::OllamaBackend;
pub use openrouter::OpenRouterBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Unknown backend '{kind}'. Available: {valid}")]
    Unsupported { kind: String, valid: String },

    #[error("{0}")]
    Configuration(String),

    #[error(
        "Ollama server is unavailable at {endpoint}. \
         Make sure Ollama is running and the model is pulled."
    )]
    Unavailable { endpoint: String },

    #[error(
        "Not enough OpenRouter credits to complete the request. \
         Try fewer questions or top up your balance at https://openrouter.ai/settings/credits"
    )]
    QuotaExceeded,

    #[error(
        "The model did not answer within {limit_secs} seconds. \
         Try requesting fewer questions or check the machine's load."
    )]
    Timeout { limit_secs: u64 },

    #[error("Model '{model}' was not found. Install it with: ollama pull {model}")]
    ModelNotFound { model: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model returned empty content")]
    EmptyContent,

    #[error("Model response contained no questions")]
    NoQuestions,
}

/// The capability every quiz backend provides.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Local backends cannot see images.
    fn accepts_images(&self) -> bool;

    /// Asks the model for `count` questions and returns its raw text output.
    async fn generate_questions(
        &self,
        content: &ContentBundle,
        count: u32,
    ) -> Result<String, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted OpenRouter API, multimodal.
    OpenRouter,
    /// Local Ollama server running Mistral, text only.
    OllamaMistral,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::OpenRouter, BackendKind::OllamaMistral];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenRouter => "openrouter",
            BackendKind::OllamaMistral => "ollama-mistral",
        }
    }

    /// Comma-separated list of accepted wire names.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| BackendError::Unsupported {
                kind: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

/// Builds the backend registered under `kind`.
pub fn create_backend(
    kind: &str,
    config: &BackendConfig,
) -> Result<Box<dyn QuizBackend>, BackendError> {
    let backend: Box<dyn QuizBackend> = match kind.parse::<BackendKind>()? {
        BackendKind::OpenRouter => Box::new(OpenRouterBackend::new(config)?),
        BackendKind::OllamaMistral => Box::new(OllamaBackend::new(config)?),
    };
    Ok(backend)
}

/// Response-size cap: 200 tokens per question, bounded by the backend ceiling.
pub fn max_tokens_for(count: u32, ceiling: u32) -> u32 {
    count.saturating_mul(200).min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parses_wire_names() {
        assert_eq!(
            "openrouter".parse::<BackendKind>().unwrap(),
            BackendKind::OpenRouter
        );
        assert_eq!(
            "ollama-mistral".parse::<BackendKind>().unwrap(),
            BackendKind::OllamaMistral
        );
    }

    #[test]
    fn test_unknown_backend_lists_valid_kinds() {
        let err = "unknown-backend".parse::<BackendKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown-backend"));
        assert!(message.contains("openrouter, ollama-mistral"));
    }

    #[test]
    fn test_factory_rejects_unknown_kind() {
        let result = create_backend("gpt-local", &BackendConfig::default());
        assert!(matches!(result, Err(BackendError::Unsupported { .. })));
    }

    #[test]
    fn test_factory_requires_openrouter_key() {
        let result = create_backend("openrouter", &BackendConfig::default());
        assert!(matches!(result, Err(BackendError::Configuration(_))));
    }

    #[test]
    fn test_factory_builds_both_backends() {
        let config = BackendConfig {
            openrouter_api_key: Some("sk-test".into()),
            ..BackendConfig::default()
        };
        let remote = create_backend("openrouter", &config).unwrap();
        assert_eq!(remote.name(), "openrouter");
        assert!(remote.accepts_images());

        let local = create_backend("ollama-mistral", &config).unwrap();
        assert_eq!(local.name(), "ollama");
        assert!(!local.accepts_images());
    }

    #[test]
    fn test_max_tokens_scales_then_caps() {
        assert_eq!(max_tokens_for(1, 1500), 200);
        assert_eq!(max_tokens_for(7, 1500), 1400);
        assert_eq!(max_tokens_for(8, 1500), 1500);
        assert_eq!(max_tokens_for(20, 2000), 2000);
    }
}
