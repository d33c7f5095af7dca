// ABOUTME: Turns uploaded PDF and Word documents into stored procedures
// ABOUTME: Validates type and size, keeps the file on disk and extracts its text when possible
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Document Ingestion
//!
//! An upload becomes a procedure whose content is the document's text. The
//! file is always written to the upload directory first; when no text can
//! be extracted (legacy `.doc`, scanned or broken files) the stored path is
//! used as the content instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::upload;
use crate::database::ProcedureRepository;
use crate::errors::{AppError, AppResult};
use crate::models::{Procedure, ProcedureInput};

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Client-supplied file name
    pub file_name: String,
    /// Declared content type of the file part
    pub content_type: String,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

/// Stores uploaded documents and creates procedures from them
#[derive(Clone)]
pub struct DocumentIngestor {
    procedures: Arc<dyn ProcedureRepository>,
    upload_dir: PathBuf,
}

impl DocumentIngestor {
    /// Ingestor writing files under `upload_dir`
    #[must_use]
    pub fn new(procedures: Arc<dyn ProcedureRepository>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            procedures,
            upload_dir: upload_dir.into(),
        }
    }

    /// Directory uploaded files are written to
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate, store and extract `document`, then create a procedure from it
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for an unsupported type or an oversized file,
    /// `INTERNAL_ERROR` when the file cannot be written, or a store error
    pub async fn ingest(
        &self,
        title: &str,
        category: &str,
        document: UploadedDocument,
        created_by: Option<&str>,
    ) -> AppResult<Procedure> {
        validate_document(&document)?;

        let stored_path = self.store(&document).await?;
        let extracted = extract_text(&document.content_type, document.bytes).await;
        let content = extracted.unwrap_or_else(|| {
            warn!(
                file_name = %document.file_name,
                "No text extracted from upload, storing file path as content"
            );
            stored_path.display().to_string()
        });

        let input = ProcedureInput {
            title: title.to_owned(),
            content,
            category: category.to_owned(),
            description: format!("{}{}", upload::DESCRIPTION_PREFIX, document.file_name),
        };
        let procedure = self.procedures.create_procedure(&input, created_by).await?;
        info!(
            procedure_id = %procedure.id,
            file_name = %document.file_name,
            "Procedure created from uploaded document"
        );
        Ok(procedure)
    }

    async fn store(&self, document: &UploadedDocument) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::internal(format!("Could not create upload directory: {e}")))?;

        let path = self.upload_dir.join(format!(
            "{}-{}",
            Uuid::new_v4(),
            safe_file_name(&document.file_name)
        ));
        tokio::fs::write(&path, &document.bytes)
            .await
            .map_err(|e| AppError::internal(format!("Failed to save file: {e}")))?;
        debug!(path = %path.display(), bytes = document.bytes.len(), "Stored uploaded document");
        Ok(path)
    }
}

/// Reject unsupported content types and files over the size limit
///
/// # Errors
///
/// Returns `INVALID_INPUT` describing the first failed check
pub fn validate_document(document: &UploadedDocument) -> AppResult<()> {
    if !upload::ALLOWED_MIME_TYPES.contains(&document.content_type.as_str()) {
        return Err(AppError::invalid_input("Only PDF and Word documents are allowed"));
    }
    if document.bytes.len() > upload::MAX_FILE_BYTES {
        return Err(AppError::invalid_input("File size cannot exceed 10MB"));
    }
    Ok(())
}

/// Final path component with anything outside `[A-Za-z0-9._-]` replaced
#[must_use]
pub fn safe_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "document".to_owned()
    } else {
        cleaned
    }
}

/// Extract plain text on a blocking task; `None` when nothing usable comes out
pub async fn extract_text(content_type: &str, bytes: Vec<u8>) -> Option<String> {
    let content_type = content_type.to_owned();
    let result = tokio::task::spawn_blocking(move || match content_type.as_str() {
        upload::PDF_MIME => pdf_extract::extract_text_from_mem(&bytes)
            .map(|text| clean_pdf_text(&text))
            .map_err(|e| e.to_string()),
        upload::DOCX_MIME => docx_text(&bytes),
        other => Err(format!("no text extractor for {other}")),
    })
    .await;

    match result {
        Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
        Ok(Ok(_)) => None,
        Ok(Err(reason)) => {
            debug!(reason = %reason, "Document text extraction failed");
            None
        }
        Err(e) => {
            warn!(error = %e, "Document text extraction task failed");
            None
        }
    }
}

/// Paragraph text of a `.docx`, one line per paragraph
fn docx_text(bytes: &[u8]) -> Result<String, String> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let docx = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;
    let mut text = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in &paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in &run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// Normalize bullets and invisible characters left by PDF text extraction
fn clean_pdf_text(text: &str) -> String {
    text.replace('\u{f0b7}', "\n- ")
        .replace("-[]", "- [ ] ")
        .replace('\u{a0}', " ")
        .replace('\u{200b}', "")
}
