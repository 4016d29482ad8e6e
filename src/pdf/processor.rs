// src/pdf/processor.rs

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Separator used when page texts are combined into one blob for chunking.
pub const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse PDF {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub source: String,
    /// 1-based.
    pub page_number: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedPage {
    pub text: String,
    pub metadata: PageMetadata,
}

/// Loads a stored PDF and returns its pages in order.
///
/// An empty result (or pages holding only whitespace) means the PDF parsed
/// but carries no text layer, e.g. a scanned document. That is not an error.
pub fn extract_pages(path: &Path) -> Result<Vec<ExtractedPage>, ExtractionError> {
    let data = std::fs::read(path).map_err(|source| ExtractionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    extract_pages_from_mem(&data, &path.to_string_lossy())
}

pub fn extract_pages_from_mem(
    data: &[u8],
    source: &str,
) -> Result<Vec<ExtractedPage>, ExtractionError> {
    let parse_error = |reason: String| ExtractionError::Parse {
        path: PathBuf::from(source),
        reason,
    };

    // pdf-extract panics on some malformed inputs
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(data))
        .map_err(|_| {
            warn!(source, "PDF parser panicked");
            parse_error("parser panicked on malformed input".to_string())
        })?
        .map_err(|e| parse_error(e.to_string()))?;

    let total_pages = pages.len();
    debug!(source, total_pages, "PDF parsed");

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| ExtractedPage {
            text: normalize_newlines(&text),
            metadata: PageMetadata {
                source: source.to_string(),
                page_number: i + 1,
                total_pages,
            },
        })
        .collect())
}

/// Joins page texts in order into the blob that gets chunked.
pub fn combine_pages(pages: &[ExtractedPage]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

pub fn has_text(pages: &[ExtractedPage]) -> bool {
    pages.iter().any(|p| !p.text.trim().is_empty())
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
