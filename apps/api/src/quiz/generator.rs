//! Quiz generation: the pipeline entry point used by the HTTP handlers.
//!
//! Flow: validate request -> create_backend -> generate_questions ->
//!       extract JSON -> normalize questions.
//!
//! Stateless. Each call builds its own backend and nothing is retried.

use tracing::{info, warn};

use crate::config::BackendConfig;
use crate::content::ContentBundle;
use crate::errors::AppError;
use crate::llm_client::{create_backend, BackendError, BackendKind};
use crate::models::question::Question;
use crate::quiz::extract::parse_json_object;
use crate::quiz::normalize::{normalize_questions, raw_questions};

pub const MIN_QUESTIONS: i64 = 1;
pub const MAX_QUESTIONS: i64 = 20;

/// A quiz request whose parameters have already been checked.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub content: ContentBundle,
    pub question_count: u32,
    pub backend_kind: BackendKind,
}

impl GenerationRequest {
    /// Checks count bounds, backend name and content before any network call.
    pub fn new(
        content: ContentBundle,
        question_count: i64,
        backend_kind: &str,
    ) -> Result<Self, AppError> {
        let (question_count, backend_kind) = validate_parameters(question_count, backend_kind)?;

        if content.is_empty() {
            return Err(AppError::Validation(
                "Document is empty or has no extractable content".to_string(),
            ));
        }
        if backend_kind == BackendKind::OllamaMistral && !content.has_text() {
            return Err(AppError::Validation(format!(
                "The {backend_kind} backend reads text only and this document has no extractable text"
            )));
        }

        Ok(Self {
            content,
            question_count,
            backend_kind,
        })
    }
}

/// Count bounds and backend name, checkable before any content is extracted.
pub fn validate_parameters(
    question_count: i64,
    backend_kind: &str,
) -> Result<(u32, BackendKind), AppError> {
    if question_count < MIN_QUESTIONS {
        return Err(AppError::Validation(
            "Question count must be a positive number".to_string(),
        ));
    }
    if question_count > MAX_QUESTIONS {
        return Err(AppError::Validation(format!(
            "Maximum number of questions is {MAX_QUESTIONS}"
        )));
    }

    let backend_kind = backend_kind.parse::<BackendKind>()?;
    Ok((question_count as u32, backend_kind))
}

/// Validates the request and runs the full generation pipeline.
pub async fn generate_quiz(
    content: ContentBundle,
    question_count: i64,
    backend_kind: &str,
    config: &BackendConfig,
) -> Result<Vec<Question>, AppError> {
    let request = GenerationRequest::new(content, question_count, backend_kind)?;
    run_generation(&request, config).await
}

pub async fn run_generation(
    request: &GenerationRequest,
    config: &BackendConfig,
) -> Result<Vec<Question>, AppError> {
    let backend = create_backend(request.backend_kind.as_str(), config)?;
    info!(
        "Generating {} questions with {} ({} chars, {} images)",
        request.question_count,
        backend.name(),
        request.content.text.chars().count(),
        request.content.images.len()
    );
    if !backend.accepts_images() && !request.content.images.is_empty() {
        warn!(
            "{} is text only; ignoring {} images",
            backend.name(),
            request.content.images.len()
        );
    }

    let raw_output = backend
        .generate_questions(&request.content, request.question_count)
        .await?;

    let payload = parse_json_object(&raw_output)?;
    let raw = raw_questions(&payload)?;
    // Only the local backend treats an empty quiz as a failure.
    if raw.is_empty() && request.backend_kind == BackendKind::OllamaMistral {
        return Err(BackendError::NoQuestions.into());
    }

    let questions = normalize_questions(raw);
    info!(
        "Generated {} questions (requested {})",
        questions.len(),
        request.question_count
    );
    Ok(questions)
}
