//! Extraction backends: the seam between raw files and the parsers.

mod file;
#[cfg(feature = "pdf")]
mod pdf;

pub use file::FileBackend;
#[cfg(feature = "pdf")]
pub use pdf::PdfText;

use std::path::Path;

use tracing::{debug, info};

use crate::error::ExtractError;
use crate::models::config::ExtractionConfig;
use crate::models::document::{ExtractedDocument, ExtractionMethod, Table};

/// Page-level text and table extraction.
///
/// Implementations return empty results for unusable content; a missing or
/// unreadable file is the only hard failure.
pub trait ExtractionBackend {
    /// Full text of the document.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;

    /// Tables of the document, in page order.
    fn extract_tables(&self, path: &Path) -> Result<Vec<Table>, ExtractError>;

    /// Text recovered through OCR.
    fn extract_via_ocr(&self, path: &Path, language: &str, dpi: u32) -> Result<String, ExtractError>;
}

/// Run the configured extraction strategy against a backend.
///
/// Text is always requested, tables when the strategy wants them, and OCR
/// only when both came back empty and the fallback is enabled.
pub fn extract_document(
    backend: &dyn ExtractionBackend,
    path: &Path,
    config: &ExtractionConfig,
) -> Result<ExtractedDocument, ExtractError> {
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let text = backend.extract_text(path)?;
    let tables = if config.wants_tables() {
        backend.extract_tables(path)?
    } else {
        Vec::new()
    };

    let mut method = if tables.is_empty() {
        ExtractionMethod::Text
    } else {
        ExtractionMethod::Tables
    };

    let text = if text.trim().is_empty() && tables.is_empty() && config.ocr_fallback {
        info!("No text layer in {}, trying OCR", source_name);
        method = ExtractionMethod::Ocr;
        backend.extract_via_ocr(path, &config.ocr_language, config.ocr_dpi)?
    } else {
        text
    };

    debug!(
        "Extracted {}: {} chars, {} tables via {:?}",
        source_name,
        text.len(),
        tables.len(),
        method
    );

    let mut doc = ExtractedDocument::from_text(text)
        .with_tables(tables)
        .with_source(source_name);
    doc.metadata.extraction_method = method;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct StubBackend {
        text: String,
        tables: Vec<Table>,
        ocr_text: String,
        table_calls: Cell<usize>,
        ocr_calls: Cell<usize>,
    }

    impl ExtractionBackend for StubBackend {
        fn extract_text(&self, _path: &Path) -> Result<String, ExtractError> {
            Ok(self.text.clone())
        }

        fn extract_tables(&self, _path: &Path) -> Result<Vec<Table>, ExtractError> {
            self.table_calls.set(self.table_calls.get() + 1);
            Ok(self.tables.clone())
        }

        fn extract_via_ocr(&self, _path: &Path, language: &str, dpi: u32) -> Result<String, ExtractError> {
            assert_eq!((language, dpi), ("spa+eng", 300));
            self.ocr_calls.set(self.ocr_calls.get() + 1);
            Ok(self.ocr_text.clone())
        }
    }

    #[test]
    fn test_text_and_tables() {
        let backend = StubBackend {
            text: "hola".into(),
            tables: vec![Table::from_strings([["a", "b"]])],
            ..Default::default()
        };

        let doc = extract_document(&backend, Path::new("/tmp/in/doc.pdf"), &ExtractionConfig::default()).unwrap();
        assert_eq!(doc.text, "hola");
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.metadata.source_name, "doc.pdf");
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Tables);
        assert_eq!(backend.ocr_calls.get(), 0);
    }

    #[test]
    fn test_tables_not_requested_when_disabled() {
        let backend = StubBackend {
            text: "hola".into(),
            ..Default::default()
        };
        let config = ExtractionConfig {
            prefer_tables: false,
            ..Default::default()
        };

        let doc = extract_document(&backend, Path::new("doc.txt"), &config).unwrap();
        assert_eq!(backend.table_calls.get(), 0);
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Text);
    }

    #[test]
    fn test_ocr_fallback() {
        let backend = StubBackend {
            text: "  \n".into(),
            ocr_text: "escaneado".into(),
            ..Default::default()
        };

        let doc = extract_document(&backend, Path::new("scan.pdf"), &ExtractionConfig::default()).unwrap();
        assert_eq!(doc.text, "escaneado");
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Ocr);

        let config = ExtractionConfig {
            ocr_fallback: false,
            ..Default::default()
        };
        let doc = extract_document(&backend, Path::new("scan.pdf"), &config).unwrap();
        assert!(doc.is_empty());
        assert_eq!(backend.ocr_calls.get(), 1);
    }
}
