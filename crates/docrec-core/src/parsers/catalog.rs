//! Parser registry carried by the configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validate::FieldRule;

/// The parser variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Invoice,
    Report,
    FinancialReport,
}

impl ParserKind {
    pub const ALL: [ParserKind; 3] = [
        ParserKind::Invoice,
        ParserKind::Report,
        ParserKind::FinancialReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Invoice => "invoice",
            ParserKind::Report => "report",
            ParserKind::FinancialReport => "financial_report",
        }
    }

    /// Detection keywords used when an entry does not configure its own.
    pub fn default_keywords(&self) -> &'static [&'static str] {
        match self {
            ParserKind::Invoice => &[
                "factura",
                "invoice",
                "rfc",
                "subtotal",
                "iva",
                "total a pagar",
                "folio",
            ],
            ParserKind::Report => &["reporte", "informe", "report", "listado", "periodo"],
            ParserKind::FinancialReport => &[
                "estados financieros",
                "financial statements",
                "balance general",
                "estado de resultados",
                "flujo de efectivo",
            ],
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParserKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown parser '{s}'"))
    }
}

/// Tuning knobs for the parsers. Each parser reads the ones it understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Drop table rows without any data.
    pub skip_empty_rows: bool,

    /// Minimum number of columns for a table or delimited text to count.
    pub min_columns: usize,

    /// Rows searched for a report header.
    pub max_header_rows: usize,

    /// Attach document metadata as internal fields.
    pub include_metadata: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            skip_empty_rows: true,
            min_columns: 2,
            max_header_rows: 3,
            include_metadata: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One registered parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserEntry {
    pub kind: ParserKind,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether the detector may pick this parser on its own.
    #[serde(default = "default_true")]
    pub auto_detect: bool,

    /// Detection keywords; empty means the kind's defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Per-field validation overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validation: BTreeMap<String, FieldRule>,

    #[serde(default)]
    pub options: ParserOptions,
}

impl ParserEntry {
    pub fn new(kind: ParserKind) -> Self {
        Self {
            kind,
            enabled: true,
            auto_detect: true,
            keywords: Vec::new(),
            validation: BTreeMap::new(),
            options: ParserOptions::default(),
        }
    }

    /// Configured keywords, or the kind's defaults.
    pub fn keywords(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            self.kind
                .default_keywords()
                .iter()
                .map(|k| k.to_string())
                .collect()
        } else {
            self.keywords.clone()
        }
    }

    /// Eligible for automatic detection.
    pub fn detectable(&self) -> bool {
        self.enabled && self.auto_detect
    }
}

/// Ordered list of parsers. Registration order decides detection ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParserCatalog(Vec<ParserEntry>);

impl ParserCatalog {
    pub fn new(entries: Vec<ParserEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[ParserEntry] {
        &self.0
    }

    pub fn get(&self, kind: ParserKind) -> Option<&ParserEntry> {
        self.0.iter().find(|e| e.kind == kind)
    }

    pub fn get_mut(&mut self, kind: ParserKind) -> Option<&mut ParserEntry> {
        self.0.iter_mut().find(|e| e.kind == kind)
    }

    /// Entry for `kind`, or a default entry when it is not registered.
    pub fn entry_or_default(&self, kind: ParserKind) -> ParserEntry {
        self.get(kind).cloned().unwrap_or_else(|| ParserEntry::new(kind))
    }
}

impl Default for ParserCatalog {
    fn default() -> Self {
        Self(ParserKind::ALL.into_iter().map(ParserEntry::new).collect())
    }
}
