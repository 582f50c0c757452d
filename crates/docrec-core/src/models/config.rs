//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dedup::KeepPolicy;
use crate::error::{DocrecError, Result};
use crate::parsers::ParserCatalog;
use crate::validate::ErrorPolicy;

/// Main configuration for the docrec pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocrecConfig {
    /// Extraction backend configuration.
    pub extraction: ExtractionConfig,

    /// Registered parsers, in detection order.
    pub parsers: ParserCatalog,

    /// Normalization configuration.
    pub normalization: NormalizationConfig,

    /// Validation configuration.
    pub validation: ValidationConfig,

    /// Deduplication configuration.
    pub deduplication: DeduplicationConfig,
}

/// Which extraction route to try first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    Auto,
    TextFirst,
    TableFirst,
}

/// Extraction backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extraction strategy.
    pub strategy: ExtractionStrategy,

    /// Run table extraction in addition to text extraction.
    pub prefer_tables: bool,

    /// Fall back to OCR when neither text nor tables were obtained.
    pub ocr_fallback: bool,

    /// OCR language hint passed to the backend.
    pub ocr_language: String,

    /// Rendering DPI for OCR.
    pub ocr_dpi: u32,

    /// Maximum pages read per document (0 = unlimited).
    pub max_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::Auto,
            prefer_tables: true,
            ocr_fallback: true,
            ocr_language: "spa+eng".to_string(),
            ocr_dpi: 300,
            max_pages: 100,
        }
    }
}

impl ExtractionConfig {
    /// Whether tables should be requested from the backend.
    pub fn wants_tables(&self) -> bool {
        self.prefer_tables || self.strategy == ExtractionStrategy::TableFirst
    }
}

/// Normalization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub dates: DateConfig,
    pub numbers: NumberConfig,
    pub text: TextConfig,
}

/// Date normalization settings (chrono format strings).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Canonical output format.
    pub output_format: String,

    /// Input formats, tried in order before the permissive fallback.
    pub input_formats: Vec<String>,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            output_format: "%Y-%m-%d".to_string(),
            input_formats: [
                "%d/%m/%Y",
                "%d-%m-%Y",
                "%Y/%m/%d",
                "%Y-%m-%d",
                "%d de %B de %Y",
                "%B %d, %Y",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Number normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberConfig {
    /// Currency tokens stripped before parsing.
    pub currency_symbols: Vec<String>,
}

impl Default for NumberConfig {
    fn default() -> Self {
        Self {
            currency_symbols: ["$", "USD", "MXN", "EUR", "COP", "ARS", "CLP"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Plain text normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Trim values and collapse internal whitespace.
    pub strip_whitespace: bool,

    /// Apply NFC and typographic substitutions.
    pub normalize_unicode: bool,

    /// Lower-case normalized headers.
    pub lowercase_headers: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            strip_whitespace: true,
            normalize_unicode: true,
            lowercase_headers: true,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run validation at all.
    pub enabled: bool,

    /// What to do with records that fail validation.
    pub on_error: ErrorPolicy,

    /// Error budget for the `fail` policy.
    pub max_errors: usize,

    /// Global rules applied to every record.
    pub rules: GlobalRules,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            on_error: ErrorPolicy::Warn,
            max_errors: 10,
            rules: GlobalRules::default(),
        }
    }
}

/// Toggles for the rules that apply regardless of parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalRules {
    /// Flag negative values in totals fields.
    pub non_negative_totals: bool,

    /// Flag invalid or out-of-range dates in date fields.
    pub valid_dates: bool,
}

impl Default for GlobalRules {
    fn default() -> Self {
        Self {
            non_negative_totals: true,
            valid_dates: true,
        }
    }
}

/// Deduplication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicationConfig {
    /// Run deduplication at all.
    pub enabled: bool,

    /// Key fields; empty means all non-internal fields.
    pub key_columns: Vec<String>,

    /// Which duplicate survives.
    pub keep: KeepPolicy,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_columns: Vec::new(),
            keep: KeepPolicy::First,
        }
    }
}

impl DocrecConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn check(&self) -> Result<()> {
        if self.normalization.dates.output_format.trim().is_empty() {
            return Err(DocrecError::Config(
                "normalization.dates.output_format must not be empty".to_string(),
            ));
        }

        let mut seen = Vec::new();
        for entry in self.parsers.entries() {
            if seen.contains(&entry.kind) {
                return Err(DocrecError::Config(format!(
                    "parser '{}' registered more than once",
                    entry.kind
                )));
            }
            seen.push(entry.kind);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ParserKind;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DocrecConfig =
            serde_json::from_str(r#"{"validation": {"on_error": "skip"}}"#).unwrap();

        assert_eq!(config.validation.on_error, ErrorPolicy::Skip);
        assert_eq!(config.validation.max_errors, 10);
        assert!(config.deduplication.enabled);
        assert_eq!(config.normalization.dates.output_format, "%Y-%m-%d");
        assert_eq!(config.parsers.entries().len(), 3);
    }

    #[test]
    fn test_duplicate_parser_rejected() {
        let config: DocrecConfig = serde_json::from_str(
            r#"{"parsers": [{"kind": "invoice"}, {"kind": "invoice"}]}"#,
        )
        .unwrap();

        assert!(matches!(config.check(), Err(DocrecError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocrecConfig::default();
        config.deduplication.key_columns = vec!["invoice_id".to_string()];
        config.save(&path).unwrap();

        let loaded = DocrecConfig::from_file(&path).unwrap();
        assert_eq!(loaded.deduplication.key_columns, vec!["invoice_id"]);
        assert_eq!(loaded.parsers.entries()[0].kind, ParserKind::Invoice);
    }

    #[test]
    fn test_tables_wanted() {
        let mut extraction = ExtractionConfig::default();
        assert!(extraction.wants_tables());

        extraction.prefer_tables = false;
        assert!(!extraction.wants_tables());

        extraction.strategy = ExtractionStrategy::TableFirst;
        assert!(extraction.wants_tables());
    }
}
