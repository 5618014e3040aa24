//! PDF text and image extraction.
//!
//! Only embedded JPEG (DCTDecode) images are passed on. Pages are never
//! rasterized, so vector charts and Flate-compressed bitmaps are not sent,
//! and a document without JPEGs goes to the text-only model.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lopdf::Document;
use tracing::{debug, warn};

use super::{ContentBundle, ExtractError, ImageAsset};

const PAGE_BANNER_WIDTH: usize = 50;
/// Skip icons, bullets and other decorative fragments.
const MIN_IMAGE_BYTES: usize = 1_024;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Prefix each page's text with a `СТРАНИЦА n` banner.
    pub page_markers: bool,
}

/// Extracts text (per page) and embedded JPEG images from an in-memory PDF.
///
/// CPU bound; call from `spawn_blocking` inside async code.
pub fn extract_pdf(bytes: &[u8], options: ExtractOptions) -> Result<ContentBundle, ExtractError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let page_count = document.get_pages().len();

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let text = join_pages(&pages, options.page_markers);

    let images = extract_images(&document);
    debug!(
        "Extracted {} chars of text and {} images from {} pages",
        text.chars().count(),
        images.len(),
        page_count
    );

    let bundle = ContentBundle {
        text,
        images,
        page_count,
    };
    if bundle.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(bundle)
}

/// Joins non-empty page texts with a blank line, optionally behind page banners.
/// Page numbers stay absolute when blank pages are skipped.
pub fn join_pages(pages: &[String], page_markers: bool) -> String {
    pages
        .iter()
        .enumerate()
        .filter_map(|(idx, page)| {
            let page = page.trim();
            if page.is_empty() {
                return None;
            }
            if page_markers {
                Some(format!("{}\n{}", page_marker(idx + 1), page))
            } else {
                Some(page.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn page_marker(page_number: usize) -> String {
    let banner = "=".repeat(PAGE_BANNER_WIDTH);
    format!("{banner}\nСТРАНИЦА {page_number}\n{banner}")
}

fn extract_images(document: &Document) -> Vec<ImageAsset> {
    let mut assets = Vec::new();

    for (page_number, page_id) in document.get_pages() {
        let images = match document.get_page_images(page_id) {
            Ok(images) => images,
            Err(e) => {
                warn!("Skipping images on page {page_number}: {e}");
                continue;
            }
        };

        for image in images {
            let is_jpeg = image
                .filters
                .as_ref()
                .is_some_and(|filters| filters.iter().any(|f| f == "DCTDecode"));
            if !is_jpeg || image.content.len() < MIN_IMAGE_BYTES {
                continue;
            }
            assets.push(ImageAsset {
                page: page_number as usize,
                base64: STANDARD.encode(image.content),
                format: "jpeg".to_string(),
            });
        }
    }

    assets
}
