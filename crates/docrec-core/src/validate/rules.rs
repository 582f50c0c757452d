//! Per-field validation rules.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "text",
            FieldType::Number => "numeric",
            FieldType::Date => "a date",
            FieldType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Rule descriptor for one field, as written in the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRule {
    /// Null or blank values are errors.
    pub required: bool,

    /// Declared type; the type check runs only when set.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regex that string values must match at their start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

impl FieldRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_allowed_values(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    /// Whether the string-only checks apply to this rule.
    pub(crate) fn checks_strings(&self) -> bool {
        matches!(self.field_type, None | Some(FieldType::String))
    }

    /// Whether the numeric range checks apply to this rule.
    pub(crate) fn checks_numbers(&self) -> bool {
        matches!(self.field_type, None | Some(FieldType::Number))
    }
}

/// A field rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub field: String,
    pub rule: FieldRule,
    pub pattern: Option<Regex>,
}

/// Ordered set of field rules for one parser.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Build a rule set from configured overrides plus a parser's required fields.
    ///
    /// Overrides come first; each required field is added (or updated) with
    /// `required = true`.
    pub fn new(required: &[&str], overrides: &BTreeMap<String, FieldRule>) -> Self {
        let mut entries: Vec<(String, FieldRule)> = overrides
            .iter()
            .map(|(field, rule)| (field.clone(), rule.clone()))
            .collect();

        for field in required {
            match entries.iter_mut().find(|(name, _)| name == field) {
                Some((_, rule)) => rule.required = true,
                None => entries.push((field.to_string(), FieldRule::required())),
            }
        }

        let rules = entries
            .into_iter()
            .map(|(field, rule)| {
                let pattern = rule
                    .pattern
                    .as_deref()
                    .and_then(|p| compile_anchored(&field, p));
                CompiledRule {
                    field,
                    rule,
                    pattern,
                }
            })
            .collect();

        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field == field).map(|r| &r.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_anchored(field: &str, pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{pattern})")) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Ignoring invalid pattern for field '{}': {}", field, e);
            None
        }
    }
}
