//! OpenRouter backend: OpenAI-compatible chat completions, multimodal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompts::{build_quiz_prompt, REMOTE_BUDGET};
use super::{max_tokens_for, BackendError, QuizBackend};
use crate::config::BackendConfig;
use crate::content::ContentBundle;

/// Used when at least one page image is attached.
pub const VISION_MODEL: &str = "openai/gpt-4o";
/// Cheaper model for text-only requests.
pub const TEXT_MODEL: &str = "openai/gpt-4o-mini";
const MAX_TOKENS_CEILING: u32 = 1500;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenRouterError {
    error: OpenRouterErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenRouterErrorBody {
    message: String,
}

pub struct OpenRouterBackend {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
}

impl OpenRouterBackend {
    /// Fails with a configuration error when no API key is configured.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let api_key = config
            .openrouter_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                BackendError::Configuration(
                    "OPENROUTER_API_KEY is not set. Add it to the environment or .env file."
                        .to_string(),
                )
            })?;

        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: config.openrouter_base_url.clone(),
            language: config.quiz_language.clone(),
        })
    }
}

#[async_trait]
impl QuizBackend for OpenRouterBackend {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn accepts_images(&self) -> bool {
        true
    }

    async fn generate_questions(
        &self,
        content: &ContentBundle,
        count: u32,
    ) -> Result<String, BackendError> {
        let prompt = build_quiz_prompt(content, count, REMOTE_BUDGET, &self.language);
        let model = if prompt.images.is_empty() {
            TEXT_MODEL
        } else {
            VISION_MODEL
        };

        let mut messages = vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(&prompt.system),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Text(&prompt.user),
            },
        ];
        for image in prompt.images {
            messages.push(ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                }]),
            });
        }

        let request_body = ChatRequest {
            model,
            messages,
            max_tokens: max_tokens_for(count, MAX_TOKENS_CEILING),
            temperature: TEMPERATURE,
        };

        info!(
            "Requesting {count} questions from OpenRouter (model: {model}, images: {})",
            prompt.images.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenRouterError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("OpenRouter returned {status}: {message}");
            return Err(classify_failure(status, message));
        }

        let completion: ChatResponse = response.json().await?;
        if let Some(usage) = &completion.usage {
            debug!(
                "OpenRouter call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BackendError::EmptyContent)
    }
}

/// Out-of-credit responses get their own error so the user sees how to fix it.
fn classify_failure(status: StatusCode, message: String) -> BackendError {
    let lowered = message.to_lowercase();
    if status == StatusCode::PAYMENT_REQUIRED
        || lowered.contains("credits")
        || lowered.contains("max_tokens")
    {
        BackendError::QuotaExceeded
    } else {
        BackendError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode as ServerStatus},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::content::ImageAsset;
    use crate::test_support::spawn_server;

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// Fake OpenRouter that records requests and answers with `status` + `body`.
    async fn fake_openrouter(status: ServerStatus, body: Value) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/chat/completions",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(request): Json<Value>| {
                        let body = body.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(String::from);
                            captured.lock().unwrap().push((auth, request));
                            (status, Json(body))
                        }
                    },
                ),
            )
            .with_state(captured.clone());
        (spawn_server(app).await, captured)
    }

    fn backend(base_url: String) -> OpenRouterBackend {
        OpenRouterBackend::new(&BackendConfig {
            openrouter_api_key: Some("sk-test".into()),
            openrouter_base_url: base_url,
            ..BackendConfig::default()
        })
        .unwrap()
    }

    fn completion(text: &str) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": text}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 80}
        })
    }

    fn image(page: usize) -> ImageAsset {
        ImageAsset {
            page,
            base64: "/9j/4AAQ".into(),
            format: "jpeg".into(),
        }
    }

    #[test]
    fn test_missing_key_is_a_configuration_error() {
        let result = OpenRouterBackend::new(&BackendConfig::default());
        assert!(matches!(result, Err(BackendError::Configuration(_))));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(StatusCode::PAYMENT_REQUIRED, "Payment required".into()),
            BackendError::QuotaExceeded
        ));
        assert!(matches!(
            classify_failure(
                StatusCode::BAD_REQUEST,
                "This request requires more Credits".into()
            ),
            BackendError::QuotaExceeded
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, "max_tokens too large".into()),
            BackendError::QuotaExceeded
        ));
        assert!(matches!(
            classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "upstream down".into()),
            BackendError::Api { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_text_only_request_uses_cheap_model() {
        let (url, captured) =
            fake_openrouter(ServerStatus::OK, completion("{\"questions\": []}")).await;
        let content = ContentBundle::from_text("The Nile is the longest river in Africa.");

        let output = backend(url).generate_questions(&content, 3).await.unwrap();
        assert_eq!(output, "{\"questions\": []}");

        let requests = captured.lock().unwrap();
        let (auth, request) = &requests[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(request["model"], TEXT_MODEL);
        assert_eq!(request["max_tokens"], 600);
        assert_eq!(request["messages"].as_array().unwrap().len(), 2);
        assert_eq!(request["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_images_switch_to_vision_model_and_are_capped() {
        let (url, captured) = fake_openrouter(ServerStatus::OK, completion("{}")).await;
        let content = ContentBundle {
            text: "Diagram of the water cycle.".into(),
            images: vec![image(1), image(2), image(3)],
            page_count: 3,
        };

        backend(url).generate_questions(&content, 10).await.unwrap();

        let requests = captured.lock().unwrap();
        let request = &requests[0].1;
        assert_eq!(request["model"], VISION_MODEL);
        assert_eq!(request["max_tokens"], 1500);

        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2]["content"][0]["type"], "image_url");
        assert_eq!(
            messages[2]["content"][0]["image_url"]["url"],
            "data:image/jpeg;base64,/9j/4AAQ"
        );
    }

    #[tokio::test]
    async fn test_payment_required_maps_to_quota_exceeded() {
        let (url, _) = fake_openrouter(
            ServerStatus::PAYMENT_REQUIRED,
            json!({"error": {"message": "Insufficient credits", "code": 402}}),
        )
        .await;
        let content = ContentBundle::from_text("Some text");

        let err = backend(url).generate_questions(&content, 5).await.unwrap_err();
        assert!(matches!(err, BackendError::QuotaExceeded));
        assert!(err.to_string().contains("openrouter.ai/settings/credits"));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let (url, _) = fake_openrouter(
            ServerStatus::BAD_GATEWAY,
            json!({"error": {"message": "provider unavailable"}}),
        )
        .await;
        let content = ContentBundle::from_text("Some text");

        let err = backend(url).generate_questions(&content, 5).await.unwrap_err();
        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "provider unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_completion_is_empty_content() {
        let (url, _) = fake_openrouter(ServerStatus::OK, completion("   ")).await;
        let content = ContentBundle::from_text("Some text");

        let err = backend(url).generate_questions(&content, 1).await.unwrap_err();
        assert!(matches!(err, BackendError::EmptyContent));
    }
}
