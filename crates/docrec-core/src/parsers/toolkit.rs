//! Pattern extraction primitives shared by every parser.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tracing::debug;

use crate::models::document::{Row, Table, cell_is_blank};
use crate::models::record::Record;

lazy_static! {
    static ref CONTROL_CHARS: Regex =
        Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Compile a user-supplied pattern case-insensitively and multi-line.
///
/// Malformed patterns are logged and yield `None`.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Invalid pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// First match of `re` in `text`.
///
/// With `group == 0` the first non-empty capture group is returned (or the
/// whole match when the pattern has no groups); otherwise that group.
/// Results are trimmed.
pub fn extract_pattern(text: &str, re: &Regex, group: usize, default: Option<&str>) -> Option<String> {
    let fallback = || default.map(str::to_string);

    let Some(caps) = re.captures(text) else {
        return fallback();
    };

    if group > 0 {
        return match caps.get(group) {
            Some(m) => Some(m.as_str().trim().to_string()),
            None => fallback(),
        };
    }

    if caps.len() == 1 {
        let whole = caps.get(0).map(|m| m.as_str().trim()).unwrap_or("");
        return if whole.is_empty() {
            fallback()
        } else {
            Some(whole.to_string())
        };
    }

    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(fallback)
}

/// Every match of `re`, in order.
///
/// Patterns without groups yield the whole match, single-group patterns
/// that group, and multi-group patterns the 1-based `group`.
pub fn extract_all_patterns(text: &str, re: &Regex, group: usize) -> Vec<String> {
    let index = match re.captures_len() {
        1 => 0,
        2 => 1,
        _ => group.max(1),
    };

    re.captures_iter(text)
        .filter_map(|caps| caps.get(index).map(|m| m.as_str().trim().to_string()))
        .collect()
}

/// Header label for a cell, `col_{i}` when absent or blank.
pub fn header_label(cell: &Option<String>, index: usize) -> String {
    match cell.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => format!("col_{index}"),
    }
}

/// True when every cell of the row is absent or blank.
pub fn row_is_empty(row: &Row) -> bool {
    row.iter().all(cell_is_blank)
}

/// Map table rows onto the labels of `header_row`.
///
/// Missing trailing cells become null; entirely empty rows are skipped, as
/// are tables too short to contain the header row.
pub fn extract_table_data(tables: &[Table], header_row: usize) -> Vec<Record> {
    let mut records = Vec::new();

    for table in tables {
        let Some(header) = table.rows().get(header_row) else {
            continue;
        };
        let headers: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, cell)| header_label(cell, i))
            .collect();

        for row in &table.rows()[header_row + 1..] {
            if row_is_empty(row) {
                continue;
            }

            let mut record = Record::new();
            for (i, label) in headers.iter().enumerate() {
                let value = row
                    .get(i)
                    .cloned()
                    .flatten()
                    .map(Value::String)
                    .unwrap_or(Value::Null);
                record.insert(label.clone(), value);
            }
            records.push(record);
        }
    }

    records
}

/// Split text into sections keyed by their lower-cased header match.
///
/// Each section runs from the end of its header to the next header. Invalid
/// patterns are skipped.
pub fn split_into_sections(text: &str, header_patterns: &[&str]) -> Vec<(String, String)> {
    let valid: Vec<String> = header_patterns
        .iter()
        .filter(|p| compile_pattern(p).is_some())
        .map(|p| format!("(?:{p})"))
        .collect();

    if valid.is_empty() {
        return Vec::new();
    }

    let Some(combined) = compile_pattern(&valid.join("|")) else {
        return Vec::new();
    };

    let matches: Vec<_> = combined.find_iter(text).collect();
    let mut sections: Vec<(String, String)> = Vec::with_capacity(matches.len());

    for (i, m) in matches.iter().enumerate() {
        let name = m.as_str().trim().to_lowercase();
        let end = matches.get(i + 1).map_or(text.len(), |next| next.start());
        let body = text[m.end()..end].trim().to_string();

        match sections.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = body,
            None => sections.push((name, body)),
        }
    }

    sections
}

/// Strip control characters and collapse whitespace runs into single spaces.
pub fn clean_text(text: &str) -> String {
    let text = CONTROL_CHARS.replace_all(text, "");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

/// `clean_text` applied per line; blank lines are dropped.
pub fn clean_lines(text: &str) -> String {
    text.lines()
        .map(clean_text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim and collapse header cells; absent cells become `col_{i}` and
/// case-insensitive duplicates get `_1`, `_2`... suffixes.
///
/// Leading underscores are stripped so document labels never look like
/// internal fields. `max_len` truncates labels (in characters).
pub fn clean_headers(row: &Row, max_len: Option<usize>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(row.len());

    for (i, cell) in row.iter().enumerate() {
        let mut label = cell
            .as_deref()
            .map(|c| WHITESPACE_RUN.replace_all(c.trim(), " ").into_owned())
            .map(|c| c.trim_start_matches('_').to_string())
            .unwrap_or_default();

        if let Some(max) = max_len {
            label = label.chars().take(max).collect::<String>().trim_end().to_string();
        }
        if label.is_empty() {
            label = format!("col_{i}");
        }

        let base = label.clone();
        let mut counter = 1;
        while seen.contains(&label.to_lowercase()) {
            label = format!("{base}_{counter}");
            counter += 1;
        }

        seen.insert(label.to_lowercase());
        headers.push(label);
    }

    headers
}

/// Count how many distinct keywords occur in `haystack` (already lower-cased).
pub fn count_keywords<S: AsRef<str>>(haystack: &str, keywords: &[S]) -> usize {
    keywords
        .iter()
        .filter(|kw| haystack.contains(&kw.as_ref().to_lowercase()))
        .count()
}

/// Lower-cased, space-joined text of the non-blank cells of `rows`.
pub fn rows_text<'a>(rows: impl IntoIterator<Item = &'a Row>) -> String {
    rows.into_iter()
        .flat_map(|row| row.iter().flatten())
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn re(pattern: &str) -> Regex {
        compile_pattern(pattern).unwrap()
    }

    #[test]
    fn test_extract_pattern_first_non_empty_group() {
        let pattern = re(r"ref\s*:\s*(\d+)|code\s*:\s*([A-Z]+)");
        assert_eq!(
            extract_pattern("Code: ABC", &pattern, 0, None),
            Some("ABC".to_string())
        );
        assert_eq!(extract_pattern("Code: ABC", &pattern, 1, Some("-")), Some("-".to_string()));
    }

    #[test]
    fn test_extract_pattern_without_groups() {
        let pattern = re(r"\d{3}-\d{4}");
        assert_eq!(
            extract_pattern("tel 555-1234", &pattern, 0, None),
            Some("555-1234".to_string())
        );
        assert_eq!(extract_pattern("none", &pattern, 0, Some("n/a")), Some("n/a".to_string()));
    }

    #[test]
    fn test_extract_all_patterns() {
        let pattern = re(r"(\w+)=(\d+)");
        assert_eq!(extract_all_patterns("a=1 b=2", &pattern, 2), vec!["1", "2"]);
        assert_eq!(extract_all_patterns("a=1 b=2", &pattern, 1), vec!["a", "b"]);

        let single = re(r"#(\d+)");
        assert_eq!(extract_all_patterns("#1 #22", &single, 5), vec!["1", "22"]);
    }

    #[test]
    fn test_compile_pattern_fails_soft() {
        assert!(compile_pattern("(unclosed").is_none());
        assert!(compile_pattern("TOTAL").unwrap().is_match("total"));
    }

    #[test]
    fn test_extract_table_data() {
        let table = Table::new(vec![
            vec![Some("Name".into()), None, Some("Qty".into())],
            vec![Some("A".into()), Some("x".into())],
            vec![None, Some("  ".into()), None],
            vec![Some("B".into()), None, Some("2".into())],
        ]);

        let records = extract_table_data(&[table], 0);
        assert_eq!(records.len(), 2);
        assert_eq!(
            Value::Object(records[0].clone()),
            json!({"Name": "A", "col_1": "x", "Qty": null})
        );
        assert_eq!(records[1]["Qty"], json!("2"));
    }

    #[test]
    fn test_extract_table_data_short_table() {
        let table = Table::from_strings([["only"]]);
        assert!(extract_table_data(&[table], 3).is_empty());
    }

    #[test]
    fn test_split_into_sections() {
        let text = "INTRO\nCONCEPTOS:\nlinea 1\nlinea 2\nTOTALES:\n100";
        let sections = split_into_sections(text, &["conceptos:", "totales:", "(bad"]);

        assert_eq!(
            sections,
            vec![
                ("conceptos:".to_string(), "linea 1\nlinea 2".to_string()),
                ("totales:".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\x07b \t\n c  "), "ab c");
        assert_eq!(clean_lines("  uno  dos \n\n\t tres "), "uno dos\ntres");
    }

    #[test]
    fn test_clean_headers() {
        let row = vec![
            Some(" Total ".into()),
            None,
            Some("TOTAL".into()),
            Some("total".into()),
            Some("_id".into()),
            Some("Nombre\ncompleto".into()),
        ];
        assert_eq!(
            clean_headers(&row, None),
            vec!["Total", "col_1", "TOTAL_1", "total_2", "id", "Nombre completo"]
        );
        assert_eq!(clean_headers(&vec![Some("abcdef".into())], Some(3)), vec!["abc"]);
    }

    #[test]
    fn test_count_keywords() {
        assert_eq!(count_keywords("balance sheet: assets", &["assets", "balance sheet", "pasivo"]), 2);
    }
}
