//! Axum route handlers for the Quiz API.

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::content::{extract_pdf, ContentBundle, ExtractOptions};
use crate::errors::AppError;
use crate::llm_client::BackendKind;
use crate::models::question::Question;
use crate::quiz::generator::{generate_quiz, validate_parameters};
use crate::state::AppState;

const DEFAULT_BACKEND: BackendKind = BackendKind::OpenRouter;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProcessTextRequest {
    pub text: Option<String>,
    /// Number or numeric string; anything else counts as 0.
    #[serde(default)]
    pub num_questions: Value,
    pub model_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

impl From<Vec<Question>> for QuizResponse {
    fn from(questions: Vec<Question>) -> Self {
        Self {
            success: true,
            total_questions: questions.len(),
            questions,
        }
    }
}

struct PdfUpload {
    file_name: String,
    bytes: Vec<u8>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/upload-pdf
///
/// Multipart form: `file` (PDF), `num_questions`, `model_type`, optional `page_markers`.
pub async fn handle_upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<QuizResponse>, AppError> {
    let mut upload: Option<PdfUpload> = None;
    let mut num_questions = 0;
    let mut model_type = DEFAULT_BACKEND.as_str().to_string();
    let mut options = ExtractOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
                upload = Some(PdfUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "num_questions" => num_questions = parse_count_str(&field_text(field).await?),
            "model_type" => model_type = field_text(field).await?.trim().to_string(),
            "page_markers" => options.page_markers = parse_flag(&field_text(field).await?),
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("No file found in request".to_string()))?;
    if upload.file_name.is_empty() {
        return Err(AppError::Validation("No file selected".to_string()));
    }
    if !is_pdf_name(&upload.file_name) {
        return Err(AppError::Validation("Only PDF files are allowed".to_string()));
    }

    // Reject bad parameters before spending CPU on extraction.
    validate_parameters(num_questions, &model_type)?;

    info!(
        "Extracting '{}' ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );
    let content = tokio::task::spawn_blocking(move || extract_pdf(&upload.bytes, options))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))??;

    let questions =
        generate_quiz(content, num_questions, &model_type, &state.config.backends).await?;
    Ok(Json(questions.into()))
}

/// POST /api/process-text
///
/// JSON body: `{ "text": "...", "num_questions": 5, "model_type": "openrouter" }`.
pub async fn handle_process_text(
    State(state): State<AppState>,
    payload: Result<Json<ProcessTextRequest>, JsonRejection>,
) -> Result<Json<QuizResponse>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;

    let text = request
        .text
        .ok_or_else(|| AppError::Validation("No text found in request".to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Text cannot be empty".to_string()));
    }

    let num_questions = parse_count(&request.num_questions);
    let model_type = request
        .model_type
        .unwrap_or_else(|| DEFAULT_BACKEND.as_str().to_string());

    let questions = generate_quiz(
        ContentBundle::from_text(text),
        num_questions,
        &model_type,
        &state.config.backends,
    )
    .await?;
    Ok(Json(questions.into()))
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form field: {e}")))
}

/// Question counts arrive as numbers or strings; unparseable values become 0
/// and are then rejected by validation.
fn parse_count(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => parse_count_str(s),
        _ => 0,
    }
}

fn parse_count_str(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn is_pdf_name(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}
