//! Document parsers turning extracted documents into candidate records.

pub mod catalog;
pub mod detect;
pub mod financial;
pub mod invoice;
pub mod patterns;
pub mod report;
pub mod toolkit;

use crate::models::document::ExtractedDocument;
use crate::models::record::Record;
use crate::validate::RuleSet;

pub use catalog::{ParserCatalog, ParserEntry, ParserKind, ParserOptions};
pub use detect::detect;
pub use financial::FinancialReportParser;
pub use invoice::InvoiceParser;
pub use report::ReportParser;

/// Trait implemented by every parser variant.
///
/// `parse` is a pure function of the document: it never fails, and returns
/// an empty list when nothing usable was found.
pub trait DocumentParser {
    /// The variant this parser implements.
    fn kind(&self) -> ParserKind;

    /// Parse a document into raw records.
    fn parse(&self, doc: &ExtractedDocument) -> Vec<Record>;

    /// Rules applied to this parser's normalized records.
    fn validation_rules(&self) -> &RuleSet;
}

impl ParserKind {
    /// Instantiate the parser for this kind using `entry`'s options and rules.
    pub fn build(self, entry: &ParserEntry) -> Box<dyn DocumentParser> {
        match self {
            ParserKind::Invoice => Box::new(InvoiceParser::new(entry)),
            ParserKind::Report => Box::new(ReportParser::new(entry)),
            ParserKind::FinancialReport => Box::new(FinancialReportParser::new(entry)),
        }
    }
}
