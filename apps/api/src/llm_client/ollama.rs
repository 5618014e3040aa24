//! Ollama backend: a local inference server, text only.
//!
//! Every generation is preceded by a cheap liveness probe so an unreachable
//! server fails in seconds instead of after the long generation timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompts::{build_quiz_prompt, LOCAL_BUDGET};
use super::{max_tokens_for, BackendError, QuizBackend};
use crate::config::BackendConfig;
use crate::content::ContentBundle;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(100);
const MAX_TOKENS_CEILING: u32 = 2000;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    language: String,
    probe_timeout: Duration,
    generate_timeout: Duration,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: config.ollama_base_url.clone(),
            model: config.ollama_model.clone(),
            language: config.quiz_language.clone(),
            probe_timeout: PROBE_TIMEOUT,
            generate_timeout: GENERATE_TIMEOUT,
        })
    }

    #[cfg(test)]
    pub fn with_timeouts(mut self, probe: Duration, generate: Duration) -> Self {
        self.probe_timeout = probe;
        self.generate_timeout = generate;
        self
    }

    /// `GET /api/tags` answering 200 within the probe timeout.
    pub async fn is_available(&self) -> bool {
        let probe = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.probe_timeout)
            .send()
            .await;

        match probe {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("Ollama probe at {} failed: {e}", self.base_url);
                false
            }
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                limit_secs: self.generate_timeout.as_secs(),
            }
        } else {
            BackendError::Http(e)
        }
    }

    fn classify_failure(&self, status: StatusCode, body: String) -> BackendError {
        let message = serde_json::from_str::<OllamaError>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        let lowered = message.to_lowercase();
        if lowered.contains("model") && lowered.contains("not found") {
            BackendError::ModelNotFound {
                model: self.model.clone(),
            }
        } else {
            BackendError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl QuizBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn accepts_images(&self) -> bool {
        false
    }

    async fn generate_questions(
        &self,
        content: &ContentBundle,
        count: u32,
    ) -> Result<String, BackendError> {
        if !self.is_available().await {
            return Err(BackendError::Unavailable {
                endpoint: self.base_url.clone(),
            });
        }

        let prompt = build_quiz_prompt(content, count, LOCAL_BUDGET, &self.language).combined();
        let request_body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: max_tokens_for(count, MAX_TOKENS_CEILING),
            },
        };

        info!("Requesting {count} questions from Ollama (model: {})", self.model);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.generate_timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Ollama returned {status}: {body}");
            return Err(self.classify_failure(status, body));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        debug!("Ollama call succeeded: eval_count={:?}", generated.eval_count);

        let text = generated.response.trim();
        if text.is_empty() {
            return Err(BackendError::EmptyContent);
        }
        Ok(text.to_string())
    }
}
