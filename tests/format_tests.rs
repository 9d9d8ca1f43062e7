use serde_json::{json, Value};

use admingrid::state::column::{CellFormatter, Column, ColumnType};
use admingrid::state::data_model;
use admingrid::state::format;

#[test]
fn test_format_numbers() {
    assert_eq!(format::format_value(&json!(1234567.891), ColumnType::Number), "1,234,567.89");
    assert_eq!(format::format_value(&json!(3.0), ColumnType::Number), "3");
    assert_eq!(format::format_value(&json!(1234.6), ColumnType::Integer), "1,235");
    assert_eq!(format::format_value(&json!("987"), ColumnType::Integer), "987");
}

#[test]
fn test_format_currency_and_percentage() {
    assert_eq!(format::format_value(&json!(-1234.5), ColumnType::Currency), "-$1,234.50");
    assert_eq!(format::format_value(&json!(19.9), ColumnType::Currency), "$19.90");
    assert_eq!(format::format_value(&json!(12.5), ColumnType::Percentage), "12.5%");
}

#[test]
fn test_format_dates() {
    let value = json!("2024-03-05 14:30:00");
    assert_eq!(format::format_value(&value, ColumnType::Date), "2024-03-05");
    assert_eq!(format::format_value(&value, ColumnType::Datetime), "2024-03-05 14:30");
    assert_eq!(format::format_value(&json!("05.03.2024"), ColumnType::Date), "2024-03-05");
    assert_eq!(format::format_value(&json!("someday"), ColumnType::Date), "someday");
}

#[test]
fn test_format_booleans() {
    assert_eq!(format::format_value(&json!("1"), ColumnType::Boolean), "Yes");
    assert_eq!(format::format_value(&json!(false), ColumnType::Boolean), "No");
    assert_eq!(format::format_value(&json!("maybe"), ColumnType::Boolean), "maybe");
}

#[test]
fn test_format_null_and_unparseable() {
    assert_eq!(format::format_value(&Value::Null, ColumnType::Currency), "");
    assert_eq!(format::format_value(&json!("n/a"), ColumnType::Number), "n/a");
    assert_eq!(format::format_value(&json!(true), ColumnType::Number), "true");
}

#[test]
fn test_display_cell_uses_custom_formatter() {
    let column = Column::new("code", ColumnType::String)
        .with_format(CellFormatter::new(|v| format!("#{}", data_model::display_value(v))));
    let row = data_model::row_from_value(json!({"code": 42})).unwrap();
    assert_eq!(format::display_cell(&row, &column), "#42");

    let missing = data_model::row_from_value(json!({})).unwrap();
    let plain = Column::new("code", ColumnType::String);
    assert_eq!(format::display_cell(&missing, &plain), "");
}

#[test]
fn test_parse_number_variants() {
    assert_eq!(data_model::parse_number("$1,234.50"), Some(1234.5));
    assert_eq!(data_model::parse_number(" 15% "), Some(15.0));
    assert_eq!(data_model::parse_number("-$3"), Some(-3.0));
    assert_eq!(data_model::parse_number(""), None);
    assert_eq!(data_model::parse_number("NaN"), None);
}

#[test]
fn test_epoch_millis() {
    assert_eq!(format::epoch_millis(&json!("1970-01-02")), Some(86_400_000));
    assert_eq!(format::epoch_millis(&json!(5)), Some(5));
    assert_eq!(format::epoch_millis(&json!("later")), None);
}
