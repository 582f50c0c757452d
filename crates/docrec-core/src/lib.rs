//! Core library for turning semi-structured documents into records.
//!
//! This crate provides:
//! - Extraction backends (PDF text layer, pre-extracted JSON, plain text)
//! - Document type detection and invoice/report/financial statement parsers
//! - Locale-aware normalization of dates, numbers and text
//! - Rule-based validation and record deduplication
//! - A pipeline orchestrating all of the above

pub mod dedup;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod parsers;
pub mod pipeline;
pub mod validate;

pub use dedup::{dedup, KeepPolicy};
pub use error::{DocrecError, ExtractError, Result, ValidationError};
pub use extract::{ExtractionBackend, FileBackend};
pub use models::{DocrecConfig, ExtractedDocument, Record, RunStatistics, Table};
pub use normalize::Normalizer;
pub use parsers::{detect, DocumentParser, ParserCatalog, ParserEntry, ParserKind};
pub use pipeline::{Pipeline, RunReport};
pub use validate::{ErrorPolicy, FieldRule, RuleSet, Validator};
