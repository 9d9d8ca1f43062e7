use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::state::column::{Column, ColumnType};
use crate::state::data_model::{self, Row};

static NULL: Value = Value::Null;

pub fn cell_value<'a>(row: &'a Row, column: &Column) -> &'a Value {
    row.get(&column.key).unwrap_or(&NULL)
}

/// Display text for a cell, honouring the column's own formatter if it has one.
pub fn display_cell(row: &Row, column: &Column) -> String {
    let value = cell_value(row, column);
    match column.format.as_ref() {
        Some(format) => format.format(value),
        None => format_value(value, column.column_type),
    }
}

pub fn format_value(value: &Value, column_type: ColumnType) -> String {
    if value.is_null() {
        return String::new();
    }

    match column_type {
        ColumnType::String => data_model::display_value(value),
        ColumnType::Number => numeric_or_raw(value, |n| group_thousands(n, 2, true)),
        ColumnType::Integer => numeric_or_raw(value, |n| group_thousands(n.round(), 0, false)),
        ColumnType::Currency => numeric_or_raw(value, |n| {
            let body = group_thousands(n.abs(), 2, false);
            if n < 0.0 {
                format!("-${body}")
            } else {
                format!("${body}")
            }
        }),
        ColumnType::Percentage => {
            numeric_or_raw(value, |n| format!("{}%", group_thousands(n, 2, true)))
        }
        ColumnType::Date => match parse_datetime(&data_model::display_value(value)) {
            Some(dt) => dt.format("%Y-%m-%d").to_string(),
            None => data_model::display_value(value),
        },
        ColumnType::Datetime => match parse_datetime(&data_model::display_value(value)) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            None => data_model::display_value(value),
        },
        ColumnType::Boolean => match data_model::value_as_bool(value) {
            Some(true) => "Yes".to_string(),
            Some(false) => "No".to_string(),
            None => data_model::display_value(value),
        },
    }
}

fn numeric_or_raw(value: &Value, f: impl Fn(f64) -> String) -> String {
    match data_model::value_as_f64(value) {
        Some(n) if !matches!(value, Value::Bool(_)) => f(n),
        _ => data_model::display_value(value),
    }
}

/// Formats with `,` thousands separators and `decimals` fraction digits.
/// With `trim`, trailing fractional zeros are dropped.
fn group_thousands(value: f64, decimals: usize, trim: bool) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (fixed.clone(), String::new()),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = if trim {
        frac_part.trim_end_matches('0').to_string()
    } else {
        frac_part
    };

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

/// Parses the date and datetime shapes the backend emits.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    parse_date_only(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a value that carries a calendar day and nothing else.
pub fn parse_date_only(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_datetime(s).map(|dt| dt.and_utc().timestamp_millis()),
        _ => None,
    }
}
