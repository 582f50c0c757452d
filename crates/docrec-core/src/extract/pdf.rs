//! PDF text extraction using lopdf and pdf-extract.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::ExtractError;

/// A loaded PDF, decrypted when protected by an empty password.
pub struct PdfText {
    path: PathBuf,
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfText {
    /// Load a PDF from bytes read from `path`.
    pub fn load(path: &Path, data: Vec<u8>) -> Result<Self, ExtractError> {
        let invalid = |reason: String| ExtractError::InvalidDocument {
            path: path.to_path_buf(),
            reason,
        };

        let mut document = Document::load_mem(&data).map_err(|e| invalid(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            document
                .decrypt("")
                .map_err(|_| invalid("encrypted PDF".to_string()))?;
            debug!("Decrypted {} with empty password", path.display());

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| invalid(format!("failed to save decrypted PDF: {e}")))?;
            decrypted
        } else {
            data
        };

        debug!("Loaded {} with {} pages", path.display(), document.get_pages().len());

        Ok(Self {
            path: path.to_path_buf(),
            document,
            raw_data,
        })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Text of the first `max_pages` pages (0 reads every page).
    ///
    /// Falls back to pdf-extract when lopdf finds no text; the fallback sees
    /// the same page range. Unusable content yields an empty string.
    pub fn text(&self, max_pages: usize) -> String {
        let limit = self.page_limit(max_pages);
        let pages: Vec<u32> = (1..=limit as u32).collect();

        match self.document.extract_text(&pages) {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => debug!("lopdf found no text in {}", self.path.display()),
            Err(e) => debug!("lopdf text extraction failed for {}: {}", self.path.display(), e),
        }

        let data = match self.leading_pages(limit) {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not truncate {} to {} pages: {}", self.path.display(), limit, e);
                return String::new();
            }
        };

        match pdf_extract::extract_text_from_mem(&data) {
            Ok(text) => text,
            Err(e) => {
                warn!("No text extracted from {}: {}", self.path.display(), e);
                String::new()
            }
        }
    }

    fn page_limit(&self, max_pages: usize) -> usize {
        let count = self.page_count();
        if max_pages == 0 { count } else { count.min(max_pages) }
    }

    /// The file reduced to its first `limit` pages.
    fn leading_pages(&self, limit: usize) -> Result<Cow<'_, [u8]>, lopdf::Error> {
        let count = self.page_count();
        if limit >= count {
            return Ok(Cow::Borrowed(self.raw_data.as_slice()));
        }

        let mut truncated = self.document.clone();
        let dropped: Vec<u32> = ((limit as u32 + 1)..=count as u32).collect();
        truncated.delete_pages(&dropped);
        truncated.prune_objects();

        let mut data = Vec::new();
        truncated.save_to(&mut data)?;
        debug!("Truncated {} from {} to {} pages", self.path.display(), count, limit);
        Ok(Cow::Owned(data))
    }
}
