//! Tabular report parser.
//!
//! Tables are preferred. Without tables the text is probed for a consistent
//! delimiter and parsed as delimited rows.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::models::document::{ExtractedDocument, Row, Table};
use crate::models::record::{opt_value, Record};
use crate::validate::RuleSet;

use super::patterns::{NUMERIC_CELL, PAGE, REPORT_DATE, REPORT_PERIOD, REPORT_TITLE};
use super::toolkit::{clean_headers, extract_pattern, row_is_empty};
use super::{DocumentParser, ParserEntry, ParserKind, ParserOptions};

/// First-cell keywords marking totals rows.
const SUMMARY_KEYWORDS: &[&str] = &[
    "total",
    "subtotal",
    "suma",
    "promedio",
    "average",
    "gran total",
    "grand total",
];

/// Non-empty lines sampled when probing for a delimiter.
const SAMPLE_LINES: usize = 10;

/// Share of sampled lines that must agree on the delimiter count.
const DELIMITER_AGREEMENT: f64 = 0.6;

lazy_static! {
    static ref WIDE_GAP: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// Report metadata scraped from the document text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportMetadata {
    pub title: Option<String>,
    pub report_date: Option<String>,
    pub period: Option<String>,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl ReportMetadata {
    pub fn from_text(text: &str) -> Self {
        let (current_page, total_pages) = PAGE
            .captures(text)
            .map(|caps| (caps[1].parse().ok(), caps[2].parse().ok()))
            .unwrap_or((None, None));

        Self {
            title: extract_pattern(text, &REPORT_TITLE, 0, None),
            report_date: extract_pattern(text, &REPORT_DATE, 0, None),
            period: extract_pattern(text, &REPORT_PERIOD, 0, None),
            current_page,
            total_pages,
        }
    }
}

/// Column delimiters tried by the text fallback, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Tab,
    Pipe,
    Semicolon,
    DoubleSpace,
}

impl Delimiter {
    const ALL: [Delimiter; 4] = [
        Delimiter::Tab,
        Delimiter::Pipe,
        Delimiter::Semicolon,
        Delimiter::DoubleSpace,
    ];

    fn count(self, line: &str) -> usize {
        match self {
            Delimiter::Tab => line.matches('\t').count(),
            Delimiter::Pipe => line.matches('|').count(),
            Delimiter::Semicolon => line.matches(';').count(),
            Delimiter::DoubleSpace => WIDE_GAP.find_iter(line).count(),
        }
    }

    fn split(self, line: &str) -> Row {
        let parts: Vec<&str> = match self {
            Delimiter::Tab => line.split('\t').collect(),
            Delimiter::Pipe => line.split('|').collect(),
            Delimiter::Semicolon => line.split(';').collect(),
            Delimiter::DoubleSpace => WIDE_GAP.split(line).collect(),
        };
        parts.into_iter().map(|p| Some(p.to_string())).collect()
    }
}

/// Parser for operational reports and listings.
pub struct ReportParser {
    options: ParserOptions,
    rules: RuleSet,
}

impl ReportParser {
    pub fn new(entry: &ParserEntry) -> Self {
        Self {
            options: entry.options.clone(),
            rules: RuleSet::new(&[], &entry.validation),
        }
    }

    fn parse_tables(&self, tables: &[Table]) -> Vec<Record> {
        let mut records = Vec::new();

        for (table_idx, table) in tables.iter().enumerate() {
            if table.len() < 2 {
                debug!("Table {} skipped: too small", table_idx);
                continue;
            }

            let header_idx = self.find_header_row(table);
            let headers = clean_headers(&table.rows()[header_idx], None);

            if headers.len() < self.options.min_columns {
                debug!("Table {} skipped: too few columns", table_idx);
                continue;
            }

            for (offset, row) in table.rows()[header_idx + 1..].iter().enumerate() {
                if row_is_empty(row) {
                    if !self.options.skip_empty_rows {
                        records.push(headers.iter().map(|h| (h.clone(), Value::Null)).collect());
                    }
                    continue;
                }

                if is_summary_row(row) {
                    debug!(
                        "Table {} row {} skipped: summary row",
                        table_idx,
                        header_idx + offset + 2
                    );
                    continue;
                }

                if let Some(record) = row_to_record(row, &headers) {
                    records.push(record);
                }
            }
        }

        records
    }

    /// First leading row with enough non-empty cells, mostly non-numeric.
    fn find_header_row(&self, table: &Table) -> usize {
        table
            .rows()
            .iter()
            .take(self.options.max_header_rows)
            .position(|row| {
                let filled: Vec<&str> = row
                    .iter()
                    .flatten()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .collect();

                if filled.len() < self.options.min_columns {
                    return false;
                }

                let numeric = filled.iter().filter(|c| NUMERIC_CELL.is_match(c)).count();
                numeric * 2 < filled.len()
            })
            .unwrap_or(0)
    }

    fn parse_text_as_table(&self, text: &str) -> Vec<Record> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() < 2 {
            return Vec::new();
        }

        let sample = &lines[..lines.len().min(SAMPLE_LINES)];

        for delimiter in Delimiter::ALL {
            let counts: Vec<usize> = sample.iter().map(|line| delimiter.count(line)).collect();
            let Some((common, share)) = most_common(&counts) else {
                continue;
            };

            if common + 1 < self.options.min_columns {
                continue;
            }
            if (share as f64) < counts.len() as f64 * DELIMITER_AGREEMENT {
                continue;
            }

            let records = self.parse_delimited(&lines, delimiter);
            if !records.is_empty() {
                debug!("Text parsed as table with {:?} delimiter", delimiter);
                return records;
            }
        }

        Vec::new()
    }

    fn parse_delimited(&self, lines: &[&str], delimiter: Delimiter) -> Vec<Record> {
        let header = lines.iter().enumerate().find_map(|(i, line)| {
            if delimiter.count(line) == 0 {
                return None;
            }
            let parts = delimiter.split(line);
            (parts.len() >= self.options.min_columns).then_some((i, parts))
        });

        let Some((header_idx, header)) = header else {
            return Vec::new();
        };
        let headers = clean_headers(&header, None);

        lines[header_idx + 1..]
            .iter()
            .filter(|line| delimiter.count(line) > 0)
            .filter_map(|line| row_to_record(&delimiter.split(line), &headers))
            .collect()
    }
}

impl DocumentParser for ReportParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Report
    }

    fn parse(&self, doc: &ExtractedDocument) -> Vec<Record> {
        let metadata = ReportMetadata::from_text(&doc.text);
        debug!("Report metadata: {:?}", metadata);

        let mut records = if doc.tables.is_empty() {
            self.parse_text_as_table(&doc.text)
        } else {
            self.parse_tables(&doc.tables)
        };

        if self.options.include_metadata {
            for record in &mut records {
                record.insert("_report_title".into(), opt_value(metadata.title.clone()));
                record.insert("_report_date".into(), opt_value(metadata.report_date.clone()));
            }
        }

        debug!("Report parsed: {} records", records.len());
        records
    }

    fn validation_rules(&self) -> &RuleSet {
        &self.rules
    }
}

/// Most frequent value and its frequency; ties go to the smaller value.
fn most_common(counts: &[usize]) -> Option<(usize, usize)> {
    let mut freq: BTreeMap<usize, usize> = BTreeMap::new();
    for &count in counts {
        *freq.entry(count).or_default() += 1;
    }

    freq.into_iter()
        .fold(None, |best, (value, share)| match best {
            Some((_, best_share)) if best_share >= share => best,
            _ => Some((value, share)),
        })
}

/// A totals row, judged by its first non-empty cell.
fn is_summary_row(row: &Row) -> bool {
    let first = row
        .iter()
        .flatten()
        .map(|c| c.trim())
        .find(|c| !c.is_empty());

    first.is_some_and(|cell| {
        let cell = cell.to_lowercase();
        SUMMARY_KEYWORDS.iter().any(|kw| cell.contains(kw))
    })
}

/// Map a row onto the headers. Rows without any data yield `None`.
fn row_to_record(row: &Row, headers: &[String]) -> Option<Record> {
    let mut record = Record::new();
    let mut has_data = false;

    for (cell, header) in row.iter().zip(headers) {
        let value = cell
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        has_data |= value.is_some();
        record.insert(header.clone(), opt_value(value));
    }

    has_data.then_some(record)
}
