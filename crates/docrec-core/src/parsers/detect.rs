//! Document type detection by keyword scoring.

use tracing::{debug, info};

use crate::models::document::ExtractedDocument;

use super::toolkit::count_keywords;
use super::{ParserCatalog, ParserKind};

/// Vocabulary of financial statements; checked before any catalog entry.
const FINANCIAL_KEYWORDS: &[&str] = &[
    "estados financieros",
    "financial statements",
    "balance general",
    "balance sheet",
    "estado de resultados",
    "income statement",
    "patrimonio",
    "stockholders equity",
    "activo",
    "pasivo",
    "assets",
    "liabilities",
];

const FINANCIAL_THRESHOLD: usize = 3;

/// Distinct keyword hits an entry needs to be picked.
const KEYWORD_THRESHOLD: usize = 2;

/// Pick the parser for a document.
///
/// Financial vocabulary wins outright. Otherwise the first detectable
/// catalog entry, in registration order, reaching the keyword threshold is
/// chosen, even when a later entry scores higher. Documents matching
/// nothing are treated as reports when they carry tables, else invoices.
pub fn detect(doc: &ExtractedDocument, catalog: &ParserCatalog) -> ParserKind {
    let text = doc.text.to_lowercase();

    let financial = count_keywords(&text, FINANCIAL_KEYWORDS);
    if financial >= FINANCIAL_THRESHOLD {
        info!(
            "Detected {} ({} financial keywords)",
            ParserKind::FinancialReport,
            financial
        );
        return ParserKind::FinancialReport;
    }

    for entry in catalog.entries().iter().filter(|e| e.detectable()) {
        let score = count_keywords(&text, &entry.keywords());
        debug!("Parser {} scored {}", entry.kind, score);

        if score >= KEYWORD_THRESHOLD {
            info!("Detected {} ({} keywords)", entry.kind, score);
            return entry.kind;
        }
    }

    let fallback = if doc.tables.is_empty() {
        ParserKind::Invoice
    } else {
        ParserKind::Report
    };
    debug!("No parser matched, using {}", fallback);
    fallback
}
