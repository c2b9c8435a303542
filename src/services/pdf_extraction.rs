use std::panic::{self, AssertUnwindSafe};

use crate::errors::{AppError, AppResult};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Turns an uploaded document into plain source text.
#[cfg_attr(test, mockall::automock)]
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> AppResult<String>;
}

/// Best-effort extraction backed by `pdf-extract`. Blocking; callers on the
/// async runtime should run it on a worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::NoFileProvided);
        }
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(AppError::PdfExtraction("upload is not a PDF document".to_string()));
        }

        // the parser panics on some malformed inputs
        let text = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
            .map_err(|_| AppError::PdfExtraction("PDF parser aborted".to_string()))?
            .map_err(|e| AppError::PdfExtraction(e.to_string()))?;

        let text = normalize_whitespace(&text);
        log::info!("Extracted {} characters from {} byte PDF", text.chars().count(), bytes.len());
        Ok(text)
    }
}

/// Trims every line and collapses runs of blank lines into one.
fn normalize_whitespace(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(if line.trim().is_empty() { "" } else { line });
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
