//! Invoice parser: one header record with nested line items.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::config::NumberConfig;
use crate::models::document::{ExtractedDocument, Table};
use crate::models::record::{float_value, opt_value, Record};
use crate::normalize::numbers::parse_number;
use crate::validate::RuleSet;

use super::patterns::*;
use super::toolkit::{clean_lines, count_keywords, extract_pattern, row_is_empty, rows_text};
use super::{DocumentParser, ParserEntry, ParserKind};

const REQUIRED_FIELDS: &[&str] = &["invoice_id", "date", "total"];

/// Keywords identifying an item table header row.
const ITEM_HEADER_KEYWORDS: &[&str] = &[
    "descripcion",
    "description",
    "concepto",
    "producto",
    "cantidad",
    "qty",
    "quantity",
    "precio",
    "price",
    "unitario",
    "importe",
    "total",
    "amount",
];

/// Header keywords per item field; the first field with a hit wins.
const ITEM_FIELDS: &[(&str, &[&str])] = &[
    ("quantity", &["cantidad", "qty", "quantity", "cant", "unidades"]),
    (
        "description",
        &["descripcion", "description", "concepto", "producto", "servicio", "detalle"],
    ),
    ("unit_price", &["precio", "price", "unitario", "p.u.", "pu", "costo"]),
    ("line_total", &["importe", "total", "amount", "monto", "subtotal"]),
    ("unit", &["unidad", "unit", "um", "u.m."]),
];

/// Rows inspected when looking for the item header.
const HEADER_SEARCH_ROWS: usize = 5;

/// Parser for invoices and receipts.
pub struct InvoiceParser {
    rules: RuleSet,
    currency_symbols: Vec<String>,
}

impl InvoiceParser {
    pub fn new(entry: &ParserEntry) -> Self {
        Self {
            rules: RuleSet::new(REQUIRED_FIELDS, &entry.validation),
            currency_symbols: NumberConfig::default().currency_symbols,
        }
    }

    fn extract_header_fields(&self, text: &str) -> Record {
        let field = |re: &regex::Regex| opt_value(extract_pattern(text, re, 0, None));

        let date = extract_pattern(text, &INVOICE_DATE, 0, None)
            .or_else(|| extract_pattern(text, &INVOICE_DATE_LONG, 0, None));

        let mut record = Record::new();
        record.insert("invoice_id".into(), field(&INVOICE_ID));
        record.insert("date".into(), opt_value(date));
        record.insert("vendor".into(), field(&VENDOR));
        record.insert("client".into(), field(&CLIENT));
        record.insert("tax_id".into(), field(&TAX_ID));
        record.insert("subtotal".into(), field(&SUBTOTAL));
        record.insert("tax".into(), field(&TAX));
        record.insert("total".into(), field(&TOTAL));
        record
    }

    fn extract_items_from_tables(&self, tables: &[Table]) -> Vec<Value> {
        let mut items = Vec::new();

        for (table_idx, table) in tables.iter().enumerate() {
            if table.len() < 2 {
                continue;
            }

            let Some(header_idx) = find_item_header(table) else {
                debug!("Table {} has no item header", table_idx);
                continue;
            };

            let mapping = map_item_headers(&table.rows()[header_idx]);

            for row in &table.rows()[header_idx + 1..] {
                if row_is_empty(row) {
                    continue;
                }

                let mut item = Record::new();
                for (i, cell) in row.iter().enumerate() {
                    if let Some(Some(field)) = mapping.get(i) {
                        let value = cell
                            .as_deref()
                            .map(|c| Value::String(c.trim().to_string()))
                            .unwrap_or(Value::Null);
                        item.insert(field.to_string(), value);
                    }
                }

                if !item.is_empty() {
                    items.push(Value::Object(item));
                }
            }
        }

        items
    }

    fn extract_items_from_text(&self, text: &str) -> Vec<Value> {
        ITEM_LINE
            .captures_iter(text)
            .map(|caps| {
                let group = |i: usize| caps.get(i).map_or("", |m| m.as_str().trim());
                json!({
                    "quantity": group(1),
                    "description": group(2),
                    "unit_price": group(3),
                    "line_total": group(4),
                })
            })
            .collect()
    }

    /// Sum of the items' line totals; unparsable totals count as zero.
    fn sum_line_totals(&self, items: &[Value]) -> Decimal {
        items
            .iter()
            .filter_map(|item| item.get("line_total"))
            .map(|total| match total {
                Value::String(s) => parse_number(s, &self.currency_symbols)
                    .and_then(Decimal::from_f64_retain)
                    .unwrap_or_default(),
                Value::Number(n) => n
                    .as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .unwrap_or_default(),
                _ => Decimal::ZERO,
            })
            .sum()
    }
}

impl DocumentParser for InvoiceParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Invoice
    }

    fn parse(&self, doc: &ExtractedDocument) -> Vec<Record> {
        if doc.text.is_empty() && doc.tables.is_empty() {
            warn!("No data to parse in {}", doc.metadata.source_name);
            return Vec::new();
        }

        let text = clean_lines(&doc.text);
        let mut record = self.extract_header_fields(&text);

        let items = if doc.tables.is_empty() {
            self.extract_items_from_text(&text)
        } else {
            self.extract_items_from_tables(&doc.tables)
        };

        let subtotal_missing = record.get("subtotal").is_none_or(Value::is_null);
        if subtotal_missing && !items.is_empty() {
            let subtotal = self.sum_line_totals(&items).round_dp(6);
            record.insert(
                "subtotal".into(),
                subtotal.to_f64().map(float_value).unwrap_or(Value::Null),
            );
        }

        let count = items.len();
        record.insert("items".into(), Value::Array(items));
        record.insert("items_count".into(), json!(count));

        debug!(
            "Invoice parsed: {}",
            record
                .get("invoice_id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("N/A")
        );

        vec![record]
    }

    fn validation_rules(&self) -> &RuleSet {
        &self.rules
    }
}

/// First of the leading rows with at least two item header keywords.
fn find_item_header(table: &Table) -> Option<usize> {
    table
        .rows()
        .iter()
        .take(HEADER_SEARCH_ROWS)
        .position(|row| count_keywords(&rows_text([row]), ITEM_HEADER_KEYWORDS) >= 2)
}

/// Map header cells positionally onto item fields.
fn map_item_headers(header: &[Option<String>]) -> Vec<Option<&'static str>> {
    header
        .iter()
        .map(|cell| {
            let label = cell.as_deref()?.trim().to_lowercase();
            if label.is_empty() {
                return None;
            }
            ITEM_FIELDS
                .iter()
                .find(|(_, keywords)| keywords.iter().any(|kw| label.contains(kw)))
                .map(|(field, _)| *field)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser() -> InvoiceParser {
        InvoiceParser::new(&ParserEntry::new(ParserKind::Invoice))
    }

    const SAMPLE: &str = "
        FACTURA

        Numero de Factura: INV-2024-001
        Fecha: 15/03/2024

        Proveedor: ACME Corporation S.A. de C.V.
        RFC: ACM123456789

        Cliente: Empresa Cliente SA

        DETALLE:
        Cantidad  Descripcion              Precio Unit.  Total
        5         Producto A               $100.00       $500.00
        3         Servicio B               $250.00       $750.00
        2         Producto C               $75.00        $150.00

        Subtotal: $1,400.00
        IVA (16%): $224.00
        Total: $1,624.00
    ";

    #[test]
    fn test_header_fields() {
        let records = parser().parse(&ExtractedDocument::from_text(SAMPLE));
        assert_eq!(records.len(), 1);

        let invoice = &records[0];
        assert_eq!(invoice["invoice_id"], json!("INV-2024-001"));
        assert_eq!(invoice["date"], json!("15/03/2024"));
        assert_eq!(invoice["vendor"], json!("ACME Corporation S.A. de C.V."));
        assert_eq!(invoice["client"], json!("Empresa Cliente SA"));
        assert_eq!(invoice["tax_id"], json!("ACM123456789"));
        assert_eq!(invoice["subtotal"], json!("1,400.00"));
        assert_eq!(invoice["tax"], json!("224.00"));
        assert_eq!(invoice["total"], json!("1,624.00"));
    }

    #[test]
    fn test_items_from_text() {
        let records = parser().parse(&ExtractedDocument::from_text(SAMPLE));
        let invoice = &records[0];

        assert_eq!(invoice["items_count"], json!(3));
        assert_eq!(
            invoice["items"][1],
            json!({
                "quantity": "3",
                "description": "Servicio B",
                "unit_price": "250.00",
                "line_total": "750.00",
            })
        );
    }

    #[test]
    fn test_items_from_table_and_computed_subtotal() {
        let table = Table::from_strings([
            vec!["Cantidad", "Unidad", "Descripcion", "Precio Unitario", "Importe"],
            vec!["2", "pza", "Tornillo", "$10.00", "$20.00"],
            vec!["1", "kg", "Clavos", "$5.50", "$5.50"],
            vec!["", "", "", "", ""],
        ]);
        let doc = ExtractedDocument::from_text("Factura: F-9\nFecha: 01/02/2024\nTotal: 25.50")
            .with_tables(vec![table]);

        let invoice = &parser().parse(&doc)[0];

        assert_eq!(invoice["items_count"], json!(2));
        assert_eq!(
            invoice["items"][0],
            json!({
                "quantity": "2",
                "unit": "pza",
                "description": "Tornillo",
                "unit_price": "$10.00",
                "line_total": "$20.00",
            })
        );
        assert_eq!(invoice["subtotal"], json!(25.5));
    }

    #[test]
    fn test_table_without_item_header_is_ignored() {
        let table = Table::from_strings([vec!["a", "b"], vec!["1", "2"]]);
        let doc = ExtractedDocument::from_text("Factura: X1").with_tables(vec![table]);

        let invoice = &parser().parse(&doc)[0];
        assert_eq!(invoice["items_count"], json!(0));
        assert_eq!(invoice["subtotal"], Value::Null);
    }

    #[test]
    fn test_spanish_long_date_and_id_forms() {
        let text = "Factura No. 12345\nEmitida el 15 de marzo de 2024\nTotal a pagar: $500.00";
        let invoice = &parser().parse(&ExtractedDocument::from_text(text))[0];

        assert_eq!(invoice["invoice_id"], json!("12345"));
        assert_eq!(invoice["date"], json!("15 de marzo de 2024"));
        assert_eq!(invoice["total"], json!("500.00"));
    }

    #[test]
    fn test_iso_date() {
        let text = "Factura: A-1\nFecha de emision: 2024-03-15";
        let invoice = &parser().parse(&ExtractedDocument::from_text(text))[0];
        assert_eq!(invoice["date"], json!("2024-03-15"));
    }

    #[test]
    fn test_empty_document() {
        assert!(parser().parse(&ExtractedDocument::default()).is_empty());
    }

    #[test]
    fn test_missing_fields_are_null() {
        let invoice = &parser().parse(&ExtractedDocument::from_text("hola"))[0];
        assert_eq!(invoice["invoice_id"], Value::Null);
        assert_eq!(invoice["total"], Value::Null);
        assert_eq!(invoice["items"], json!([]));
    }

    #[test]
    fn test_note_label_is_not_an_invoice_id() {
        let text = "Nota: Tarea pendiente\nFecha: 01/02/2024\nTotal: 10.00";
        let invoice = &parser().parse(&ExtractedDocument::from_text(text))[0];
        assert_eq!(invoice["invoice_id"], Value::Null);
        assert_eq!(invoice["total"], json!("10.00"));
    }
}
