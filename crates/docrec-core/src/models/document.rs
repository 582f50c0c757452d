//! Extracted document model handed from an extraction backend to a parser.

use serde::{Deserialize, Serialize};

/// A single table cell. `None` is an absent cell, distinct from `Some("")`.
pub type Cell = Option<String>;

/// An ordered sequence of cells.
pub type Row = Vec<Cell>;

/// A page-extracted table.
///
/// Rows are always padded to the widest row, both on construction and on
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Row>", into = "Vec<Row>")]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, padding short rows with absent cells.
    pub fn new(mut rows: Vec<Row>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, None);
        }
        Self { rows }
    }

    /// Build a table from string literals; empty strings stay empty strings.
    pub fn from_strings<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|c| Some(c.into())).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns (all rows share it).
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

impl From<Vec<Row>> for Table {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl From<Table> for Vec<Row> {
    fn from(table: Table) -> Self {
        table.rows
    }
}

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Embedded text layer.
    #[default]
    Text,
    /// Table extraction produced at least one table.
    Tables,
    /// Text recovered through OCR.
    Ocr,
}

/// Metadata attached to an extracted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    /// Source file name.
    pub source_name: String,
    /// Extraction method.
    pub extraction_method: ExtractionMethod,
}

/// Raw output of the extraction backend for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedDocument {
    /// Full document text.
    pub text: String,
    /// Extracted tables, in page order.
    pub tables: Vec<Table>,
    /// Document metadata.
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    /// Create a document from text only.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attach tables.
    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    /// Set the source name.
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.metadata.source_name = name.into();
        self
    }

    /// True when neither text nor tables were obtained.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.tables.is_empty()
    }
}

/// True when a cell is absent or blank.
pub fn cell_is_blank(cell: &Cell) -> bool {
    cell.as_deref().is_none_or(|c| c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_pads_rows() {
        let table = Table::new(vec![
            vec![Some("a".into()), Some("b".into()), Some("c".into())],
            vec![Some("1".into())],
        ]);

        assert_eq!(table.width(), 3);
        assert_eq!(table.rows()[1], vec![Some("1".to_string()), None, None]);
    }

    #[test]
    fn test_table_deserialize_pads() {
        let table: Table = serde_json::from_str(r#"[["a", null, "c"], ["1"]]"#).unwrap();
        assert_eq!(table.rows()[0][1], None);
        assert_eq!(table.rows()[1].len(), 3);
    }

    #[test]
    fn test_document_json_roundtrip_defaults() {
        let doc: ExtractedDocument = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(doc.text, "hello");
        assert!(doc.tables.is_empty());
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Text);
    }

    #[test]
    fn test_empty_document() {
        assert!(ExtractedDocument::from_text("  \n").is_empty());
        let doc = ExtractedDocument::default().with_tables(vec![Table::from_strings([["x"]])]);
        assert!(!doc.is_empty());
    }
}
