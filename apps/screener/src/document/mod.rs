//! Document intake: uploaded resumes and job descriptions.
//!
//! Every upload is reduced to one shape (name + detected format + raw bytes) and
//! text extraction dispatches on the format tag.

pub mod chunker;
pub mod sanitize;

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl DocumentFormat {
    /// Detects the format from a file name's extension (case-insensitive).
    pub fn detect(name: &str) -> Result<Self, AppError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("txt") => Ok(DocumentFormat::PlainText),
            _ => Err(AppError::UnsupportedFormat(format!(
                "'{name}' (upload a PDF or TXT file)"
            ))),
        }
    }
}

/// An uploaded document: full content as bytes plus its detected format.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub format: DocumentFormat,
    pub content: Bytes,
}

impl UploadedDocument {
    pub fn from_bytes(
        name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Result<Self, AppError> {
        let name = name.into();
        let format = DocumentFormat::detect(&name)?;
        Ok(Self {
            name,
            format,
            content: content.into(),
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let content = tokio::fs::read(path).await.map_err(|e| {
            AppError::Extraction(format!("Failed to read '{}': {e}", path.display()))
        })?;

        let document = Self::from_bytes(name, content)?;
        debug!(
            "Loaded {} ({} bytes, {:?})",
            document.name,
            document.content.len(),
            document.format
        );
        Ok(document)
    }
}

/// Extracts sanitized text from a document. PDF decoding runs on the blocking pool.
pub async fn extract_text(document: &UploadedDocument) -> Result<String, AppError> {
    let text = match document.format {
        DocumentFormat::PlainText => sanitize::sanitize_bytes(&document.content),
        DocumentFormat::Pdf => {
            let content = document.content.clone();
            let name = document.name.clone();
            let decoded =
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&content))
                    .await
                    .map_err(|e| {
                        AppError::Extraction(format!(
                            "PDF decoder aborted on '{}': {e}",
                            document.name
                        ))
                    })?
                    .map_err(|e| {
                        AppError::Extraction(format!(
                            "Failed to extract text from PDF '{name}': {e}"
                        ))
                    })?;
            sanitize::sanitize(&decoded)
        }
    };

    info!(
        "Extracted {} characters from {}",
        text.chars().count(),
        document.name
    );
    Ok(text)
}

/// The resume text for one analysis run. Immutable once extracted.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    sanitized: String,
}

impl ResumeDocument {
    /// Sanitizes `text` (a no-op for `extract_text` output). Fails if no usable text remains.
    pub fn new(text: &str) -> Result<Self, AppError> {
        let sanitized = sanitize::sanitize(text);
        if sanitized.trim().is_empty() {
            return Err(AppError::Extraction(
                "Failed to extract text from resume: document is empty".to_string(),
            ));
        }
        Ok(Self { sanitized })
    }

    pub fn sanitized(&self) -> &str {
        &self.sanitized
    }

    /// Chunks of the first `source_limit` characters, ready for indexing.
    pub fn chunks(&self, profile: chunker::ChunkProfile, source_limit: usize) -> Vec<String> {
        chunker::prepare_chunks(prefix_chars(&self.sanitized, source_limit), profile)
    }
}

/// Returns the first `limit` characters of `text` without splitting a code point.
pub fn prefix_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
