use anyhow::{Context, Result};

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral";
pub const DEFAULT_QUIZ_LANGUAGE: &str = "Russian";

/// Application configuration loaded from environment variables.
/// Read-only after startup; handed to backends explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub backends: BackendConfig,
    pub port: u16,
    pub rust_log: String,
}

/// Everything a quiz backend needs to be constructed.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Only required when the `openrouter` backend is selected.
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub quiz_language: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            quiz_language: DEFAULT_QUIZ_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Config {
            backends: BackendConfig {
                openrouter_api_key: lookup("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty()),
                openrouter_base_url: trim_url(var(
                    "OPENROUTER_BASE_URL",
                    DEFAULT_OPENROUTER_BASE_URL,
                )),
                ollama_base_url: trim_url(var("OLLAMA_BASE_URL", DEFAULT_OLLAMA_BASE_URL)),
                ollama_model: var("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
                quiz_language: var("QUIZ_LANGUAGE", DEFAULT_QUIZ_LANGUAGE),
            },
            port: var("PORT", "5001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
