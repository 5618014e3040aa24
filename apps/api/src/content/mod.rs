//! Extracted document content handed to the quiz pipeline.
//!
//! A `ContentBundle` is produced once per request (from a PDF or from pasted
//! text) and never mutated afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod pdf;

pub use pdf::{extract_pdf, ExtractOptions};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not read PDF document: {0}")]
    Pdf(String),

    #[error("PDF document is empty or could not be processed")]
    Empty,
}

/// One image lifted out of a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// 1-based page number the image was found on.
    pub page: usize,
    pub base64: String,
    /// Image subtype used to build the data URL, e.g. "jpeg" or "png".
    pub format: String,
}

impl ImageAsset {
    pub fn data_url(&self) -> String {
        format!("data:image/{};base64,{}", self.format, self.base64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    pub text: String,
    pub images: Vec<ImageAsset>,
    pub page_count: usize,
}

impl ContentBundle {
    /// Text-only bundle for pasted content. Never carries images.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
            page_count: 0,
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_text() && self.images.is_empty()
    }
}
