//! Record type produced by parsers and rewritten by later pipeline stages.

use serde_json::{Map, Value};

/// One structured output row. Insertion order is export column order.
pub type Record = Map<String, Value>;

/// Prefix reserved for bookkeeping fields.
pub const INTERNAL_PREFIX: char = '_';

/// Field name tagging each record with the document it came from.
pub const SOURCE_FILE_FIELD: &str = "_source_file";

/// True for bookkeeping fields such as `_table_index`.
pub fn is_internal(field: &str) -> bool {
    field.starts_with(INTERNAL_PREFIX)
}

/// Convert an optional extracted string into a record value.
pub fn opt_value(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

/// Build a JSON number from a float; non-finite values become null.
pub fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Copy of a record without internal fields.
pub fn without_internal(record: &Record) -> Record {
    record
        .iter()
        .filter(|(k, _)| !is_internal(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_internal_fields() {
        assert!(is_internal("_table_index"));
        assert!(!is_internal("table_index"));
    }

    #[test]
    fn test_without_internal_keeps_order() {
        let mut record = Record::new();
        record.insert("b".into(), json!(1));
        record.insert("_row_index".into(), json!(2));
        record.insert("a".into(), json!(3));

        let keys: Vec<_> = without_internal(&record).keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_float_value_non_finite() {
        assert_eq!(float_value(f64::NAN), Value::Null);
        assert_eq!(float_value(1.5), json!(1.5));
    }
}
