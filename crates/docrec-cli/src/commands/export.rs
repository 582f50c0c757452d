//! Record exporters: JSON array and CSV.

use serde_json::Value;

use docrec_core::models::record::{without_internal, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON array of objects
    Json,
    /// CSV with one column per field
    Csv,
}

/// Render records, dropping internal fields unless `keep_internal`.
pub fn render(records: &[Record], format: OutputFormat, keep_internal: bool) -> anyhow::Result<String> {
    let records: Vec<Record> = if keep_internal {
        records.to_vec()
    } else {
        records.iter().map(without_internal).collect()
    };

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&records)?),
        OutputFormat::Csv => to_csv(&records),
    }
}

/// Union of all field names, in first-seen order.
fn columns(records: &[Record]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for key in records.iter().flat_map(|r| r.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns
}

fn cell_text(value: Option<&Value>) -> anyhow::Result<String> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => serde_json::to_string(nested)?,
    })
}

fn to_csv(records: &[Record]) -> anyhow::Result<String> {
    let columns = columns(records);
    let mut wtr = csv::Writer::from_writer(vec![]);

    if !columns.is_empty() {
        wtr.write_record(&columns)?;
    }

    for record in records {
        let row = columns
            .iter()
            .map(|c| cell_text(record.get(*c)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record(json!({"a": 1.5, "_row_index": 2, "b": "x"})),
            record(json!({"b": "y", "c": null, "items": [{"q": 1}]})),
        ]
    }

    #[test]
    fn test_csv_union_of_columns() {
        let csv = render(&sample(), OutputFormat::Csv, false).unwrap();
        assert_eq!(csv, "a,b,c,items\n1.5,x,,\n,y,,\"[{\"\"q\"\":1}]\"\n");
    }

    #[test]
    fn test_csv_keeps_internal_on_request() {
        let csv = render(&sample(), OutputFormat::Csv, true).unwrap();
        assert!(csv.starts_with("a,_row_index,b,c,items\n"));
    }

    #[test]
    fn test_json_array() {
        let out = render(&sample(), OutputFormat::Json, false).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0], json!({"a": 1.5, "b": "x"}));
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_record_set() {
        assert_eq!(render(&[], OutputFormat::Json, false).unwrap(), "[]");
        assert_eq!(render(&[], OutputFormat::Csv, false).unwrap(), "");
    }
}
