//! Date normalization for Spanish and English documents.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::models::config::DateConfig;

/// Spanish month names and their English equivalents.
const SPANISH_MONTHS: &[(&str, &str)] = &[
    ("enero", "january"),
    ("febrero", "february"),
    ("marzo", "march"),
    ("abril", "april"),
    ("mayo", "may"),
    ("junio", "june"),
    ("julio", "july"),
    ("agosto", "august"),
    ("septiembre", "september"),
    ("octubre", "october"),
    ("noviembre", "november"),
    ("diciembre", "december"),
];

const ENGLISH_MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Words the permissive parser skips.
const FILLER_WORDS: &[&str] = &[
    "de", "del", "of", "the", "on", "at", "and", "am", "pm", "monday", "tuesday", "wednesday",
    "thursday", "friday", "saturday", "sunday", "mon", "tue", "wed", "thu", "fri", "sat", "sun",
];

const FALLBACK_OUTPUT_FORMAT: &str = "%Y-%m-%d";

lazy_static! {
    static ref DATE_TIME_SEPARATOR: Regex = Regex::new(r"(\d)[tT](\d)").unwrap();
    static ref TOKEN_SPLIT: Regex = Regex::new(r"[\s,/\-.]+").unwrap();
    static ref ORDINAL: Regex = Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)$").unwrap();
}

/// Parses dates with the configured formats and renders the canonical form.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    input_formats: Vec<String>,
    output_format: String,
}

impl DateNormalizer {
    pub fn new(config: &DateConfig) -> Self {
        let output_format = if renders(&config.output_format) {
            config.output_format.clone()
        } else {
            warn!(
                "Invalid date output format '{}', using {}",
                config.output_format, FALLBACK_OUTPUT_FORMAT
            );
            FALLBACK_OUTPUT_FORMAT.to_string()
        };

        Self {
            input_formats: config.input_formats.clone(),
            output_format,
        }
    }

    /// Canonicalize a date, returning the input unchanged when it cannot be parsed.
    pub fn normalize(&self, value: &str) -> String {
        match self.parse(value) {
            Some(date) => self.format(date),
            None => {
                debug!("Could not parse date: {}", value);
                value.to_string()
            }
        }
    }

    /// Parse a date: configured formats first, then the permissive day-first parse.
    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        let prepared = replace_spanish_months(&value.trim().to_lowercase());
        if prepared.is_empty() {
            return None;
        }

        for format in &self.input_formats {
            if let Ok(date) = NaiveDate::parse_from_str(&prepared, format) {
                if format.contains("%Y") && !(1000..=9999).contains(&date.year()) {
                    continue;
                }
                return Some(date);
            }
        }

        parse_permissive(&prepared)
    }

    pub fn format(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.output_format)).is_err() {
            return date.format(FALLBACK_OUTPUT_FORMAT).to_string();
        }
        out
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(&DateConfig::default())
    }
}

/// True when `format` renders without error.
fn renders(format: &str) -> bool {
    let probe = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    let mut out = String::new();
    !format.trim().is_empty() && write!(out, "{}", probe.format(format)).is_ok()
}

/// Replace Spanish month names in already lower-cased text.
pub fn replace_spanish_months(lowered: &str) -> String {
    let mut out = lowered.to_string();
    for (spanish, english) in SPANISH_MONTHS {
        out = out.replace(spanish, english);
    }
    out
}

fn month_number(word: &str) -> Option<u32> {
    if word == "sept" {
        return Some(9);
    }
    ENGLISH_MONTHS
        .iter()
        .position(|m| *m == word || (word.len() == 3 && m.starts_with(word)))
        .map(|i| i as u32 + 1)
}

/// Expand a two-digit year: 00-50 is 20xx, 51-99 is 19xx.
fn expand_year(value: u32, digits: usize) -> i32 {
    let year = value as i32;
    if digits <= 2 {
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

fn is_time(token: &str) -> bool {
    token.contains(':')
        && token
            .split(':')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Day-first parse of loosely formatted dates ("15 march 2024", "3/4/24",
/// "2024.03.15 10:30"). Unknown words reject the value outright.
fn parse_permissive(value: &str) -> Option<NaiveDate> {
    let value = DATE_TIME_SEPARATOR.replace_all(value, "$1 $2");

    let mut numbers: Vec<(u32, usize)> = Vec::new();
    let mut month: Option<u32> = None;

    for token in TOKEN_SPLIT.split(&value).filter(|t| !t.is_empty()) {
        if is_time(token) {
            continue;
        }

        let token = ORDINAL
            .captures(token)
            .and_then(|c| c.get(1))
            .map_or(token, |m| m.as_str());

        if token.chars().all(|c| c.is_ascii_digit()) {
            numbers.push((token.parse().ok()?, token.len()));
        } else if let Some(m) = month_number(token) {
            if month.replace(m).is_some() {
                return None;
            }
        } else if !FILLER_WORDS.contains(&token) {
            return None;
        }
    }

    let (year, month, day) = match (month, numbers.as_slice()) {
        (None, [(n, 8)]) => (
            (*n / 10_000) as i32,
            (*n / 100) % 100,
            *n % 100,
        ),
        (Some(m), [a, b]) => {
            if a.1 == 4 || a.0 > 31 {
                (expand_year(a.0, a.1), m, b.0)
            } else {
                (expand_year(b.0, b.1), m, a.0)
            }
        }
        (None, [a, b, c]) => {
            if a.1 == 4 || a.0 > 31 {
                (expand_year(a.0, a.1), b.0, c.0)
            } else if b.0 > 12 && a.0 <= 12 {
                (expand_year(c.0, c.1), a.0, b.0)
            } else {
                (expand_year(c.0, c.1), b.0, a.0)
            }
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}
