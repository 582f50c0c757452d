//! Locale normalization of parsed records.
//!
//! Keys become snake_case field names; string values are classified as
//! dates, numbers or text and converted accordingly. Conversion failures
//! never abort: an unparsable date keeps its original text and an
//! unparsable number becomes null.

pub mod dates;
pub mod numbers;
pub mod text;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::models::config::NormalizationConfig;
use crate::models::record::{float_value, is_internal, Record};

pub use dates::DateNormalizer;
pub use numbers::{parse_financial_number, parse_number};
pub use text::{collapse_whitespace, normalize_unicode, UNNAMED_COLUMN};

const DATE_FIELD_KEYWORDS: &[&str] = &["fecha", "date", "dia", "day", "vencimiento", "emision"];

const NUMBER_FIELD_KEYWORDS: &[&str] = &[
    "total",
    "subtotal",
    "monto",
    "cantidad",
    "precio",
    "importe",
    "amount",
    "price",
    "qty",
    "quantity",
    "tax",
    "iva",
    "descuento",
];

lazy_static! {
    static ref DATE_SHAPES: Vec<Regex> = vec![
        Regex::new(r"\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}").unwrap(),
        Regex::new(r"\d{4}[/\-]\d{1,2}[/\-]\d{1,2}").unwrap(),
        Regex::new(r"(?i)\d{1,2}\s+de\s+\w+\s+de\s+\d{4}").unwrap(),
    ];
    static ref NUMBER_SHAPE: Regex = Regex::new(r"^[\d\s,.\-+]+$").unwrap();
}

/// Inferred kind of a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Date,
    Number,
    Text,
}

/// Record normalizer.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizationConfig,
    dates: DateNormalizer,
}

impl Normalizer {
    pub fn new(config: NormalizationConfig) -> Self {
        let dates = DateNormalizer::new(&config.dates);
        Self { config, dates }
    }

    /// Normalize every record.
    pub fn normalize(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .map(|record| self.normalize_record(record))
            .collect()
    }

    /// Normalize one record's keys and values. Internal fields are copied as-is.
    pub fn normalize_record(&self, record: Record) -> Record {
        let mut out = Record::new();
        for (key, value) in record {
            if is_internal(&key) {
                out.insert(key, value);
                continue;
            }
            let field = self.normalize_header(&key);
            let value = self.normalize_value(value, &field);
            out.insert(field, value);
        }
        out
    }

    pub fn normalize_header(&self, header: &str) -> String {
        text::normalize_header(
            header,
            self.config.text.normalize_unicode,
            self.config.text.lowercase_headers,
        )
    }

    /// Normalize a single value; `field` is the already-normalized field name.
    pub fn normalize_value(&self, value: Value, field: &str) -> Value {
        let Value::String(raw) = value else {
            return value;
        };

        let raw = if self.config.text.strip_whitespace {
            raw.trim().to_string()
        } else {
            raw
        };

        if raw.trim().is_empty() {
            return Value::Null;
        }

        match self.classify(&raw, field) {
            ValueKind::Date => Value::String(self.normalize_date(&raw)),
            ValueKind::Number => match self.normalize_number(&raw) {
                Some(n) => float_value(n),
                None => {
                    debug!("Could not parse number in field '{}': {}", field, raw);
                    Value::Null
                }
            },
            ValueKind::Text => Value::String(self.normalize_text(&raw)),
        }
    }

    /// Classify a string value. Field-name keywords are checked before value shapes.
    pub fn classify(&self, value: &str, field: &str) -> ValueKind {
        if self.looks_like_date(value, field) {
            ValueKind::Date
        } else if self.looks_like_number(value, field) {
            ValueKind::Number
        } else {
            ValueKind::Text
        }
    }

    fn looks_like_date(&self, value: &str, field: &str) -> bool {
        let field = field.to_lowercase();
        DATE_FIELD_KEYWORDS.iter().any(|kw| field.contains(kw))
            || DATE_SHAPES.iter().any(|re| re.is_match(value))
    }

    fn looks_like_number(&self, value: &str, field: &str) -> bool {
        let field = field.to_lowercase();
        if NUMBER_FIELD_KEYWORDS.iter().any(|kw| field.contains(kw)) {
            return true;
        }

        let mut cleaned = value.to_string();
        for symbol in &self.config.numbers.currency_symbols {
            if !symbol.is_empty() {
                cleaned = cleaned.replace(symbol.as_str(), "");
            }
        }
        let cleaned = cleaned.trim();

        NUMBER_SHAPE.is_match(cleaned) && cleaned.chars().any(|c| c.is_ascii_digit())
    }

    pub fn normalize_date(&self, value: &str) -> String {
        self.dates.normalize(value)
    }

    pub fn normalize_number(&self, value: &str) -> Option<f64> {
        parse_number(value, &self.config.numbers.currency_symbols)
    }

    pub fn normalize_text(&self, value: &str) -> String {
        let value = if self.config.text.normalize_unicode {
            normalize_unicode(value)
        } else {
            value.to_string()
        };

        if self.config.text.strip_whitespace {
            collapse_whitespace(&value)
        } else {
            value
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_normalize_record() {
        let normalizer = Normalizer::default();
        let out = normalizer.normalize_record(record(json!({
            "Fecha Emision": "15/03/2024",
            "Total": "$1,234.56",
            "Cliente": "  Juan   P\u{e9}rez ",
            "Notas": "   ",
            "Pagado": true,
        })));

        assert_eq!(
            Value::Object(out),
            json!({
                "fecha_emision": "2024-03-15",
                "total": 1234.56,
                "cliente": "Juan Pérez",
                "notas": null,
                "pagado": true,
            })
        );
    }

    #[test]
    fn test_key_order_preserved() {
        let normalizer = Normalizer::default();
        let out = normalizer.normalize_record(record(json!({"Zeta": "a", "Alfa": "b"})));
        let keys: Vec<_> = out.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alfa"]);
    }

    #[test]
    fn test_internal_fields_untouched() {
        let normalizer = Normalizer::default();
        let out = normalizer.normalize_record(record(json!({
            "_table_type": "  balance_sheet ",
            "_row_index": 3,
        })));
        assert_eq!(out["_table_type"], json!("  balance_sheet "));
        assert_eq!(out["_row_index"], json!(3));
    }

    #[test]
    fn test_classification_field_name_precedence() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.classify("pendiente", "fecha_pago"), ValueKind::Date);
        assert_eq!(normalizer.classify("abc", "precio_unitario"), ValueKind::Number);
        assert_eq!(normalizer.classify("12/05/2023", "referencia"), ValueKind::Date);
        assert_eq!(normalizer.classify("USD 1,000", "referencia"), ValueKind::Number);
        assert_eq!(normalizer.classify("ACME S.A.", "empresa"), ValueKind::Text);
    }

    #[test]
    fn test_unparsable_values() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.normalize_value(json!("pendiente"), "fecha"),
            json!("pendiente")
        );
        assert_eq!(normalizer.normalize_value(json!("N/A"), "total"), Value::Null);
    }

    #[test]
    fn test_nested_values_pass_through() {
        let normalizer = Normalizer::default();
        let items = json!([{"quantity": "2"}]);
        assert_eq!(normalizer.normalize_value(items.clone(), "items"), items);
    }

    #[test]
    fn test_text_normalization_disabled() {
        let mut config = NormalizationConfig::default();
        config.text.normalize_unicode = false;
        config.text.strip_whitespace = false;
        let normalizer = Normalizer::new(config);
        assert_eq!(normalizer.normalize_text("a\u{2014}  b"), "a\u{2014}  b");
    }
}
