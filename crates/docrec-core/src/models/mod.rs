//! Data models shared across pipeline stages.

pub mod config;
pub mod document;
pub mod record;
pub mod stats;

pub use config::DocrecConfig;
pub use document::{Cell, DocumentMetadata, ExtractedDocument, ExtractionMethod, Row, Table};
pub use record::Record;
pub use stats::RunStatistics;
