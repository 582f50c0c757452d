//! Reference backend reading documents from the filesystem.
//!
//! Handles PDFs (text layer only), pre-extracted JSON documents and plain
//! text files. Table extraction is only available from JSON documents.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;
use crate::models::document::{ExtractedDocument, Table};

use super::ExtractionBackend;

/// Document formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Pdf,
    Json,
    Text,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Format::Pdf),
            "json" => Ok(Format::Json),
            "txt" | "text" => Ok(Format::Text),
            _ => Err(ExtractError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Filesystem extraction backend.
#[derive(Debug, Clone, Default)]
pub struct FileBackend {
    /// Pages read from PDFs (0 = all).
    max_pages: usize,
}

impl FileBackend {
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }
        fs::read(path).map_err(|source| ExtractError::Unreadable {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_json(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        let data = self.read(path)?;
        serde_json::from_slice(&data).map_err(|e| ExtractError::InvalidDocument {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    #[cfg(feature = "pdf")]
    fn pdf_text(&self, path: &Path) -> Result<String, ExtractError> {
        let data = self.read(path)?;
        let pdf = super::PdfText::load(path, data)?;
        Ok(pdf.text(self.max_pages))
    }

    #[cfg(not(feature = "pdf"))]
    fn pdf_text(&self, path: &Path) -> Result<String, ExtractError> {
        self.read(path)?;
        Err(ExtractError::UnsupportedFormat(format!(
            "{} (built without PDF support)",
            path.display()
        )))
    }
}

impl ExtractionBackend for FileBackend {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        match Format::of(path)? {
            Format::Pdf => self.pdf_text(path),
            Format::Json => Ok(self.read_json(path)?.text),
            Format::Text => {
                let data = self.read(path)?;
                Ok(String::from_utf8_lossy(&data).into_owned())
            }
        }
    }

    fn extract_tables(&self, path: &Path) -> Result<Vec<Table>, ExtractError> {
        match Format::of(path)? {
            Format::Json => Ok(self.read_json(path)?.tables),
            Format::Pdf | Format::Text => {
                debug!("No table extraction for {}", path.display());
                Ok(Vec::new())
            }
        }
    }

    fn extract_via_ocr(&self, path: &Path, language: &str, dpi: u32) -> Result<String, ExtractError> {
        self.read(path)?;
        debug!(
            "OCR ({}, {} dpi) not available for {}",
            language,
            dpi,
            path.display()
        );
        Ok(String::new())
    }
}
