//! Rule-based validation of normalized records.

pub mod rules;

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::models::config::ValidationConfig;
use crate::models::record::{is_internal, Record};

pub use rules::{FieldRule, FieldType, RuleSet};

/// Fields that must not hold negative numbers.
const TOTAL_FIELDS: &[&str] = &["total", "subtotal", "monto", "importe", "amount", "price"];

/// Fields that must hold ISO dates within a plausible year range.
const DATE_FIELDS: &[&str] = &["fecha", "date", "fecha_emision", "fecha_vencimiento"];

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// What happens to records that fail validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Drop offending records.
    Skip,
    /// Keep every record and report the errors.
    #[default]
    Warn,
    /// Abort once the error budget is exceeded.
    Fail,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorPolicy::Skip => "skip",
            ErrorPolicy::Warn => "warn",
            ErrorPolicy::Fail => "fail",
        };
        f.write_str(name)
    }
}

/// Records that passed, plus every message produced.
pub type Validated = (Vec<Record>, Vec<String>);

/// Validation engine.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.config.on_error
    }

    /// Validate records against `rules` and the global rules.
    pub fn validate(
        &self,
        records: Vec<Record>,
        rules: &RuleSet,
    ) -> Result<Validated, ValidationError> {
        if !self.config.enabled {
            return Ok((records, Vec::new()));
        }

        let mut kept = Vec::with_capacity(records.len());
        let mut errors = Vec::new();

        for (idx, record) in records.into_iter().enumerate() {
            let row = idx + 1;
            let row_errors = self.validate_record(&record, rules, row);

            if !row_errors.is_empty() {
                errors.extend(row_errors);

                match self.config.on_error {
                    ErrorPolicy::Skip => {
                        debug!("Skipping row {} after validation errors", row);
                        continue;
                    }
                    ErrorPolicy::Fail if errors.len() > self.config.max_errors => {
                        warn!(
                            "Validation error budget exceeded: {} > {}",
                            errors.len(),
                            self.config.max_errors
                        );
                        return Err(ValidationError::TooManyErrors {
                            count: errors.len(),
                            max: self.config.max_errors,
                        });
                    }
                    _ => {}
                }
            }

            kept.push(record);
        }

        Ok((kept, errors))
    }

    /// All messages for one record; `row` is 1-based.
    pub fn validate_record(&self, record: &Record, rules: &RuleSet, row: usize) -> Vec<String> {
        let mut errors = Vec::new();

        for compiled in rules.iter() {
            if is_internal(&compiled.field) {
                continue;
            }
            let value = record.get(&compiled.field).unwrap_or(&Value::Null);
            check_field(&compiled.field, value, compiled, row, &mut errors);
        }

        self.apply_global_rules(record, row, &mut errors);
        errors
    }

    fn apply_global_rules(&self, record: &Record, row: usize, errors: &mut Vec<String>) {
        let global = &self.config.rules;

        if global.non_negative_totals {
            for field in TOTAL_FIELDS {
                let negative = record.get(*field).and_then(Value::as_f64).filter(|n| *n < 0.0);
                if let Some(n) = negative {
                    errors.push(format!("Row {row}: '{field}' cannot be negative ({n})"));
                }
            }
        }

        if global.valid_dates {
            for field in DATE_FIELDS {
                let Some(Value::String(s)) = record.get(*field) else {
                    continue;
                };
                if s.is_empty() {
                    continue;
                }
                match parse_iso_date(s) {
                    Some(date) if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) => {
                        errors.push(format!("Row {row}: '{field}' has a year out of range"));
                    }
                    Some(_) => {}
                    None => errors.push(format!("Row {row}: '{field}' is not a valid date")),
                }
            }
        }
    }
}

fn check_field(
    field: &str,
    value: &Value,
    compiled: &rules::CompiledRule,
    row: usize,
    errors: &mut Vec<String>,
) {
    let rule = &compiled.rule;

    if rule.required && is_blank(value) {
        errors.push(format!("Row {row}: field '{field}' is required"));
        return;
    }

    if value.is_null() {
        return;
    }

    let mismatch = rule.field_type.filter(|expected| !matches_type(value, *expected));
    if let Some(expected) = mismatch {
        let message = match (expected, value) {
            (FieldType::Date, Value::String(_)) => {
                format!("Row {row}: '{field}' is not a valid date")
            }
            _ => format!("Row {row}: '{field}' should be {expected}"),
        };
        errors.push(message);
    }

    let number = value.as_f64().filter(|_| rule.checks_numbers());
    if let Some(n) = number {
        if let Some(min) = rule.min.filter(|min| n < *min) {
            errors.push(format!(
                "Row {row}: '{field}' ({n}) is below the minimum ({min})"
            ));
        }
        if let Some(max) = rule.max.filter(|max| n > *max) {
            errors.push(format!(
                "Row {row}: '{field}' ({n}) is above the maximum ({max})"
            ));
        }
    }

    if let Value::String(s) = value {
        let length = s.chars().count();
        if rule.checks_strings() {
            if let Some(min) = rule.min_length.filter(|min| length < *min) {
                errors.push(format!("Row {row}: '{field}' is too short (min: {min})"));
            }
            if let Some(max) = rule.max_length.filter(|max| length > *max) {
                errors.push(format!("Row {row}: '{field}' is too long (max: {max})"));
            }
        }

        if compiled.pattern.as_ref().is_some_and(|re| !re.is_match(s)) {
            errors.push(format!(
                "Row {row}: '{field}' does not match the expected pattern"
            ));
        }
    }

    let disallowed = rule
        .allowed_values
        .as_ref()
        .is_some_and(|allowed| !allowed.iter().any(|a| values_equal(a, value)));
    if disallowed {
        errors.push(format!(
            "Row {row}: '{field}' has a value that is not allowed: {value}"
        ));
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn matches_type(value: &Value, expected: FieldType) -> bool {
    match expected {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Date => value.as_str().is_some_and(|s| parse_iso_date(s).is_some()),
    }
}

/// Numbers compare by value so that `1` matches `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Parse an ISO date or date-time, accepting `/` as the date separator.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim().replace('/', "-");

    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        return Some(date);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&value, fmt).ok())
        .map(|dt| dt.date())
}
