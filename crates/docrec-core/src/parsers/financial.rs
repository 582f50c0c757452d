//! Financial statement parser.
//!
//! Works on tables only: every table row becomes a record with a
//! `line_item` label, one numeric value per period column, and the
//! statement metadata found in the text.

use std::fmt;

use serde_json::{json, Value};
use tracing::debug;

use crate::models::document::{ExtractedDocument, Row, Table};
use crate::models::record::{float_value, opt_value, Record};
use crate::normalize::parse_financial_number;
use crate::validate::RuleSet;

use super::patterns::{COMPANY, CURRENCY_UNIT, FINANCIAL_NUMERIC_CELL, STATEMENT_DATE, YEAR_CELL};
use super::toolkit::{clean_headers, count_keywords, extract_pattern, row_is_empty, rows_text};
use super::{DocumentParser, ParserEntry, ParserKind, ParserOptions};

/// Rows inspected for classification and header detection.
const LEADING_ROWS: usize = 5;

/// Header labels are cut to this many characters.
const MAX_HEADER_LEN: usize = 50;

/// Statement a table belongs to, judged by keyword density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    Segment,
    General,
}

impl TableType {
    const CLASSIFIED: [TableType; 4] = [
        TableType::BalanceSheet,
        TableType::IncomeStatement,
        TableType::CashFlow,
        TableType::Segment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::BalanceSheet => "balance_sheet",
            TableType::IncomeStatement => "income_statement",
            TableType::CashFlow => "cash_flow",
            TableType::Segment => "segment",
            TableType::General => "general",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            TableType::BalanceSheet => &[
                "activo",
                "pasivo",
                "patrimonio",
                "capital",
                "assets",
                "liabilities",
                "equity",
                "stockholders",
            ],
            TableType::IncomeStatement => &[
                "ingresos",
                "gastos",
                "utilidad",
                "perdida",
                "rendimiento",
                "revenue",
                "expenses",
                "profit",
                "loss",
                "income",
                "earnings",
            ],
            TableType::CashFlow => &[
                "flujo de efectivo",
                "flujos de efectivo",
                "operacion",
                "inversion",
                "financiamiento",
                "cash flow",
                "operating",
                "investing",
                "financing",
            ],
            TableType::Segment => &[
                "segmento",
                "exploracion",
                "produccion",
                "refinacion",
                "logistica",
                "segment",
                "exploration",
                "production",
                "refining",
            ],
            TableType::General => &[],
        }
    }

    /// First statement type with at least two keyword hits in the leading rows.
    pub fn classify(table: &Table) -> Self {
        let sample = rows_text(table.rows().iter().take(LEADING_ROWS));

        Self::CLASSIFIED
            .into_iter()
            .find(|kind| count_keywords(&sample, kind.keywords()) >= 2)
            .unwrap_or(TableType::General)
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement-level metadata scraped from the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementMetadata {
    pub company: Option<String>,
    pub report_date: Option<String>,
    pub currency_unit: Option<String>,
}

impl StatementMetadata {
    pub fn from_text(text: &str) -> Self {
        Self {
            company: extract_pattern(text, &COMPANY, 1, None),
            report_date: extract_pattern(text, &STATEMENT_DATE, 1, None),
            currency_unit: extract_pattern(text, &CURRENCY_UNIT, 1, None),
        }
    }
}

/// Parser for balance sheets, income statements and similar filings.
pub struct FinancialReportParser {
    options: ParserOptions,
    rules: RuleSet,
}

impl FinancialReportParser {
    pub fn new(entry: &ParserEntry) -> Self {
        Self {
            options: entry.options.clone(),
            rules: RuleSet::new(&[], &entry.validation),
        }
    }

    fn process_table(&self, table: &Table, table_idx: usize, metadata: &StatementMetadata) -> Vec<Record> {
        if table.len() < 2 {
            return Vec::new();
        }

        let table_type = TableType::classify(table);
        let header_idx = find_header_row(table);
        let headers = clean_headers(&table.rows()[header_idx], Some(MAX_HEADER_LEN));

        debug!(
            "Table {} classified as {} (header row {})",
            table_idx + 1,
            table_type,
            header_idx
        );

        let mut records = Vec::new();
        for (offset, row) in table.rows()[header_idx + 1..].iter().enumerate() {
            if row_is_empty(row) {
                continue;
            }

            let Some(mut record) = row_to_record(row, &headers) else {
                continue;
            };

            record.insert("company".into(), json!(metadata.company.clone().unwrap_or_default()));
            record.insert(
                "currency_unit".into(),
                json!(metadata.currency_unit.clone().unwrap_or_default()),
            );
            record.insert("_table_index".into(), json!(table_idx + 1));
            record.insert("_row_index".into(), json!(header_idx + 2 + offset));
            record.insert("_table_type".into(), json!(table_type.as_str()));

            if self.options.include_metadata {
                record.insert("_report_date".into(), opt_value(metadata.report_date.clone()));
            }

            records.push(record);
        }

        records
    }
}

impl DocumentParser for FinancialReportParser {
    fn kind(&self) -> ParserKind {
        ParserKind::FinancialReport
    }

    fn parse(&self, doc: &ExtractedDocument) -> Vec<Record> {
        let metadata = StatementMetadata::from_text(&doc.text);

        let records: Vec<Record> = doc
            .tables
            .iter()
            .enumerate()
            .flat_map(|(idx, table)| self.process_table(table, idx, &metadata))
            .collect();

        debug!(
            "Financial report parsed: {} records from {} tables",
            records.len(),
            doc.tables.len()
        );

        records
    }

    fn validation_rules(&self) -> &RuleSet {
        &self.rules
    }
}

fn is_numeric_cell(cell: &str) -> bool {
    FINANCIAL_NUMERIC_CELL.is_match(cell.trim())
}

/// First leading row with two year cells, or at least half text cells.
fn find_header_row(table: &Table) -> usize {
    table
        .rows()
        .iter()
        .take(LEADING_ROWS)
        .position(|row| {
            let filled: Vec<&str> = row
                .iter()
                .flatten()
                .map(String::as_str)
                .filter(|c| !c.trim().is_empty())
                .collect();

            let years = filled.iter().filter(|c| YEAR_CELL.is_match(c)).count();
            if years >= 2 {
                return true;
            }

            let text_cells = filled.iter().filter(|c| !is_numeric_cell(c)).count();
            !filled.is_empty() && text_cells * 2 >= row.len()
        })
        .unwrap_or(0)
}

fn row_to_record(row: &Row, headers: &[String]) -> Option<Record> {
    let mut record = Record::new();

    if let Some(label) = row.first().cloned().flatten() {
        let label = label.trim();
        if !label.is_empty() && !is_numeric_cell(label) {
            record.insert("line_item".into(), json!(label));
        }
    }

    for (i, cell) in row.iter().enumerate().skip(1) {
        let Some(cell) = cell.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };

        let header = headers
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("col_{i}"));

        let value = match parse_financial_number(cell) {
            Some(n) => float_value(n),
            None => Value::String(cell.to_string()),
        };
        record.insert(header, value);
    }

    (!record.is_empty()).then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser() -> FinancialReportParser {
        FinancialReportParser::new(&ParserEntry::new(ParserKind::FinancialReport))
    }

    const HEADER_TEXT: &str = "Petroleos Mexicanos\nEstados financieros consolidados al 31 de diciembre de 2023\nCifras expresadas en miles de pesos";

    fn balance_sheet() -> Table {
        Table::from_strings([
            vec!["Concepto", "2023", "2022"],
            vec!["Activo circulante", "1,234,567", "1,100,000"],
            vec!["Pasivo total", "(45.5)", "30,5"],
            vec!["", "", ""],
            vec!["Capital contable", "n/d", ""],
        ])
    }

    #[test]
    fn test_balance_sheet_rows() {
        let doc = ExtractedDocument::from_text(HEADER_TEXT).with_tables(vec![balance_sheet()]);
        let records = parser().parse(&doc);

        assert_eq!(records.len(), 3);
        assert_eq!(
            Value::Object(records[0].clone()),
            json!({
                "line_item": "Activo circulante",
                "2023": 1234567.0,
                "2022": 1100000.0,
                "company": "Petroleos Mexicanos",
                "currency_unit": "miles de pesos",
                "_table_index": 1,
                "_row_index": 2,
                "_table_type": "balance_sheet",
            })
        );
        assert_eq!(records[1]["2023"], json!(-45.5));
        assert_eq!(records[1]["2022"], json!(30.5));
        assert_eq!(records[2]["2023"], json!("n/d"));
        assert_eq!(records[2]["_row_index"], json!(5));
    }

    #[test]
    fn test_metadata() {
        let metadata = StatementMetadata::from_text(HEADER_TEXT);
        assert_eq!(metadata.company.as_deref(), Some("Petroleos Mexicanos"));
        assert_eq!(metadata.report_date.as_deref(), Some("31 de diciembre de 2023"));
        assert_eq!(metadata.currency_unit.as_deref(), Some("miles de pesos"));
    }

    #[test]
    fn test_missing_metadata_is_empty_string() {
        let doc = ExtractedDocument::default().with_tables(vec![balance_sheet()]);
        let records = parser().parse(&doc);
        assert_eq!(records[0]["company"], json!(""));
        assert_eq!(records[0]["currency_unit"], json!(""));
    }

    #[test]
    fn test_numeric_first_column_is_not_a_line_item() {
        let table = Table::from_strings([vec!["Nota", "Monto"], vec!["12", "1,000"]]);
        let records = parser().parse(&ExtractedDocument::default().with_tables(vec![table]));

        assert!(!records[0].contains_key("line_item"));
        assert_eq!(records[0]["Monto"], json!(1000.0));
    }

    #[test]
    fn test_table_classification() {
        let income = Table::from_strings([
            vec!["Estado de resultados", "2023"],
            vec!["Ingresos por ventas", "500"],
            vec!["Utilidad neta", "50"],
        ]);
        let cash = Table::from_strings([
            vec!["Flujo de efectivo de operacion", "10"],
            vec!["Actividades de inversion", "5"],
        ]);
        let other = Table::from_strings([vec!["a", "b"], vec!["c", "d"]]);

        assert_eq!(TableType::classify(&income), TableType::IncomeStatement);
        assert_eq!(TableType::classify(&cash), TableType::CashFlow);
        assert_eq!(TableType::classify(&other), TableType::General);
        assert_eq!(TableType::classify(&balance_sheet()), TableType::BalanceSheet);
    }

    #[test]
    fn test_header_row_with_years() {
        let table = Table::from_strings([
            vec!["", "", ""],
            vec!["1", "2", "3"],
            vec!["", "Dic 2023", "Dic 2022"],
            vec!["Ventas", "10", "9"],
        ]);
        assert_eq!(find_header_row(&table), 2);
    }

    #[test]
    fn test_headers_truncated() {
        let long = "x".repeat(80);
        let table = Table::from_strings([vec!["Concepto", long.as_str()], vec!["Caja", "5"]]);
        let records = parser().parse(&ExtractedDocument::default().with_tables(vec![table]));

        assert_eq!(records[0]["x".repeat(50).as_str()], json!(5.0));
    }

    #[test]
    fn test_include_metadata_adds_report_date() {
        let mut entry = ParserEntry::new(ParserKind::FinancialReport);
        entry.options.include_metadata = true;
        let parser = FinancialReportParser::new(&entry);

        let doc = ExtractedDocument::from_text(HEADER_TEXT).with_tables(vec![balance_sheet()]);
        let records = parser.parse(&doc);
        assert_eq!(records[0]["_report_date"], json!("31 de diciembre de 2023"));
    }

    #[test]
    fn test_text_only_document_yields_nothing() {
        assert!(parser().parse(&ExtractedDocument::from_text(HEADER_TEXT)).is_empty());
    }
}
