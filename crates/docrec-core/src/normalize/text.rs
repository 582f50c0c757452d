//! Unicode and header normalization.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Fallback name for headers that normalize to nothing.
pub const UNNAMED_COLUMN: &str = "unnamed_column";

/// Typographic characters replaced after NFC.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{00a0}', " "),
    ('\u{2026}', "..."),
];

lazy_static! {
    static ref HEADER_SEPARATORS: Regex = Regex::new(r"[\s\-.]+").unwrap();
    static ref NON_WORD: Regex = Regex::new(r"[^\w]").unwrap();
}

/// NFC-normalize and replace typographic punctuation.
pub fn normalize_unicode(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let mut out = String::with_capacity(composed.len());
    for c in composed.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

/// Collapse every whitespace run into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn an arbitrary column label into a snake_case field name.
pub fn normalize_header(header: &str, unicode: bool, lowercase: bool) -> String {
    let mut h = header.trim().to_string();

    if unicode {
        h = normalize_unicode(&h);
    }

    let h = HEADER_SEPARATORS.replace_all(&h, "_");
    let h = NON_WORD.replace_all(&h, "");
    let h = h.trim_matches('_');

    let h = if lowercase {
        h.to_lowercase()
    } else {
        h.to_string()
    };

    if h.is_empty() {
        UNNAMED_COLUMN.to_string()
    } else {
        h
    }
}
