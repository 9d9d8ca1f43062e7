use std::collections::BTreeMap;
use serde_json::Value;

pub type Row = BTreeMap<String, Value>;
pub type Rows = Vec<Row>;

/// Raw text of a JSON value, before any column-type formatting.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Null, absent-equivalent, or whitespace-only text.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Parses user or server supplied numeric text, tolerating thousands
/// separators, a leading currency sign and a trailing percent sign.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed
        .trim_start_matches('$')
        .trim_end_matches('%')
        .chars()
        .filter(|ch| *ch != ',' && *ch != '_')
        .collect();
    let cleaned = cleaned.replacen("-$", "-", 1);
    cleaned.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if ["true", "1", "yes", "y", "on"]
        .iter()
        .any(|t| trimmed.eq_ignore_ascii_case(t))
    {
        Some(true)
    } else if ["false", "0", "no", "n", "off"]
        .iter()
        .any(|t| trimmed.eq_ignore_ascii_case(t))
    {
        Some(false)
    } else {
        None
    }
}

pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => parse_bool(s),
        _ => None,
    }
}

/// Converts a JSON object into a row, dropping non-object input.
pub fn row_from_value(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

pub fn row_to_value(row: &Row) -> Value {
    Value::Object(row.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}
