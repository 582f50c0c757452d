//! Locale-aware number parsing.
//!
//! Documents mix European (`1.234,56`) and American (`1,234.56`) notation,
//! sometimes within the same file, so the decimal separator is resolved per
//! value from the separators it contains.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

lazy_static! {
    static ref PARENTHESISED: Regex = Regex::new(r"^\(([\d,.]+)\)$").unwrap();
    static ref COMMA_THOUSANDS: Regex = Regex::new(r",\d{3}(?:,|$)").unwrap();
}

/// Parse an amount, stripping currency tokens and whitespace.
///
/// Returns `None` when the remaining text is not a number.
pub fn parse_number(value: &str, currency_symbols: &[String]) -> Option<f64> {
    let mut cleaned = value.to_string();
    for symbol in currency_symbols {
        if !symbol.is_empty() {
            cleaned = cleaned.replace(symbol.as_str(), "");
        }
    }
    let cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = resolve_separators(&cleaned);
    parse_decimal(&normalized).and_then(|d| d.to_f64())
}

/// Rewrite `cleaned` so that `.` is the only (decimal) separator.
fn resolve_separators(cleaned: &str) -> String {
    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    match (commas, dots) {
        (0, _) if dots <= 1 => cleaned.to_string(),
        (0, _) => cleaned.replace('.', ""),
        (1, 0) => {
            let tail = cleaned.rsplit(',').next().unwrap_or("");
            let shorthand = (1..=2).contains(&tail.len()) && tail.chars().all(|c| c.is_ascii_digit());
            // Any other lone comma is ambiguous and stays, so parsing fails.
            if shorthand {
                cleaned.replace(',', ".")
            } else {
                cleaned.to_string()
            }
        }
        (_, 0) => cleaned.replace(',', ""),
        _ => decimal_is_last(cleaned),
    }
}

/// Both separators present: whichever occurs last is the decimal point.
fn decimal_is_last(value: &str) -> String {
    let last_comma = value.rfind(',');
    let last_dot = value.rfind('.');
    if last_comma > last_dot {
        value.replace('.', "").replace(',', ".")
    } else {
        value.replace(',', "")
    }
}

/// Parse a plain decimal string, tolerating a leading `+` and bare `.5`/`5.`.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let digits = digits.strip_suffix('.').unwrap_or(digits);
    if digits.is_empty() {
        return None;
    }

    let padded;
    let digits = if digits.starts_with('.') {
        padded = format!("0{digits}");
        padded.as_str()
    } else {
        digits
    };

    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let parsed = Decimal::from_str(digits).ok()?;
    Some(if negative { -parsed } else { parsed })
}

/// Parse a financial statement cell.
///
/// Accounting negatives are written in parentheses: `(1,234.56)`. A comma
/// without a dot is a thousands separator when it is followed by exactly
/// three digits, otherwise a decimal comma.
pub fn parse_financial_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, body) = match PARENTHESISED.captures(trimmed) {
        Some(caps) => (true, caps.get(1).map_or("", |m| m.as_str()).to_string()),
        None => (false, trimmed.to_string()),
    };

    let body: String = body
        .chars()
        .filter(|c| *c != '$' && !c.is_whitespace())
        .collect();

    let normalized = if body.contains(',') && body.contains('.') {
        decimal_is_last(&body)
    } else if body.contains(',') {
        if COMMA_THOUSANDS.is_match(&body) {
            body.replace(',', "")
        } else {
            body.replace(',', ".")
        }
    } else {
        body
    };

    let parsed = parse_decimal(&normalized)?.to_f64()?;
    Some(if negative { -parsed } else { parsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::NumberConfig;

    fn symbols() -> Vec<String> {
        NumberConfig::default().currency_symbols
    }

    fn parse(value: &str) -> Option<f64> {
        parse_number(value, &symbols())
    }

    #[test]
    fn test_european_and_american_notation() {
        assert_eq!(parse("1.234,56"), Some(1234.56));
        assert_eq!(parse("1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_single_comma() {
        assert_eq!(parse("12,5"), Some(12.5));
        assert_eq!(parse("12,50"), Some(12.5));
    }

    #[test]
    fn test_ambiguous_single_comma_is_unparsable() {
        assert_eq!(parse("1,234"), None);
        assert_eq!(parse("$ 12,345"), None);
        assert_eq!(parse("1,2345"), None);
    }

    #[test]
    fn test_repeated_separators_are_thousands() {
        assert_eq!(parse("1,234,567"), Some(1234567.0));
        assert_eq!(parse("1.234.567"), Some(1234567.0));
    }

    #[test]
    fn test_currency_and_whitespace() {
        assert_eq!(parse("$ 1,500.00"), Some(1500.0));
        assert_eq!(parse("MXN 2 500,75"), Some(2500.75));
        assert_eq!(parse("100.00 USD"), Some(100.0));
        assert_eq!(parse("1\u{a0}000"), Some(1000.0));
    }

    #[test]
    fn test_signs() {
        assert_eq!(parse("-45.5"), Some(-45.5));
        assert_eq!(parse("+3"), Some(3.0));
        assert_eq!(parse(".5"), Some(0.5));
    }

    #[test]
    fn test_unparsable() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("$"), None);
        assert_eq!(parse("abc"), None);
        assert_eq!(parse("1-2"), None);
    }

    #[test]
    fn test_financial_numbers() {
        assert_eq!(parse_financial_number("(1,234.56)"), Some(-1234.56));
        assert_eq!(parse_financial_number("$ 2,500"), Some(2500.0));
        assert_eq!(parse_financial_number("1.234,5"), Some(1234.5));
        assert_eq!(parse_financial_number("12,5"), Some(12.5));
        assert_eq!(parse_financial_number("1,234,567"), Some(1234567.0));
        assert_eq!(parse_financial_number("-"), None);
        assert_eq!(parse_financial_number("n/a"), None);
    }
}
