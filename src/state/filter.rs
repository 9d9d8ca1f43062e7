use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::column::{Column, ColumnType};
use crate::state::data_model::{self, Row};
use crate::state::format;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperation {
    Contains,
    DoesNotContain,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Before,
    OnOrBefore,
    After,
    OnOrAfter,
    Empty,
    NotEmpty,
}

const STRING_OPERATIONS: &[FilterOperation] = &[
    FilterOperation::Contains,
    FilterOperation::DoesNotContain,
    FilterOperation::Equals,
    FilterOperation::NotEquals,
    FilterOperation::StartsWith,
    FilterOperation::EndsWith,
    FilterOperation::In,
    FilterOperation::NotIn,
    FilterOperation::Empty,
    FilterOperation::NotEmpty,
];

const NUMERIC_OPERATIONS: &[FilterOperation] = &[
    FilterOperation::Equal,
    FilterOperation::NotEqual,
    FilterOperation::LessThan,
    FilterOperation::LessThanOrEqual,
    FilterOperation::GreaterThan,
    FilterOperation::GreaterThanOrEqual,
    FilterOperation::Empty,
    FilterOperation::NotEmpty,
];

const DATE_OPERATIONS: &[FilterOperation] = &[
    FilterOperation::Equal,
    FilterOperation::NotEqual,
    FilterOperation::Before,
    FilterOperation::OnOrBefore,
    FilterOperation::After,
    FilterOperation::OnOrAfter,
    FilterOperation::Empty,
    FilterOperation::NotEmpty,
];

const BOOLEAN_OPERATIONS: &[FilterOperation] = &[
    FilterOperation::Equal,
    FilterOperation::NotEqual,
    FilterOperation::Empty,
    FilterOperation::NotEmpty,
];

impl FilterOperation {
    pub fn all() -> &'static [Self] {
        &[
            Self::Contains,
            Self::DoesNotContain,
            Self::Equals,
            Self::NotEquals,
            Self::StartsWith,
            Self::EndsWith,
            Self::In,
            Self::NotIn,
            Self::Equal,
            Self::NotEqual,
            Self::LessThan,
            Self::LessThanOrEqual,
            Self::GreaterThan,
            Self::GreaterThanOrEqual,
            Self::Before,
            Self::OnOrBefore,
            Self::After,
            Self::OnOrAfter,
            Self::Empty,
            Self::NotEmpty,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::DoesNotContain => "does_not_contain",
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Equal => "equal",
            Self::NotEqual => "not_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::Before => "before",
            Self::OnOrBefore => "on_or_before",
            Self::After => "after",
            Self::OnOrAfter => "on_or_after",
            Self::Empty => "empty",
            Self::NotEmpty => "not_empty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|op| op.name() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Contains => "Contains",
            Self::DoesNotContain => "Does not contain",
            Self::Equals => "Equals",
            Self::NotEquals => "Does not equal",
            Self::StartsWith => "Starts with",
            Self::EndsWith => "Ends with",
            Self::In => "In list",
            Self::NotIn => "Not in list",
            Self::Equal => "=",
            Self::NotEqual => "≠",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "≤",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => "≥",
            Self::Before => "Before",
            Self::OnOrBefore => "On or before",
            Self::After => "After",
            Self::OnOrAfter => "On or after",
            Self::Empty => "Is empty",
            Self::NotEmpty => "Is not empty",
        }
    }

    pub fn ignores_search_value(self) -> bool {
        matches!(self, Self::Empty | Self::NotEmpty)
    }
}

pub fn operations_for_type(column_type: ColumnType) -> &'static [FilterOperation] {
    match column_type {
        ColumnType::String => STRING_OPERATIONS,
        ColumnType::Boolean => BOOLEAN_OPERATIONS,
        t if t.is_temporal() => DATE_OPERATIONS,
        _ => NUMERIC_OPERATIONS,
    }
}

pub fn default_operation_for_type(column_type: ColumnType) -> FilterOperation {
    match column_type {
        ColumnType::String => FilterOperation::Contains,
        _ => FilterOperation::Equal,
    }
}

/// Evaluates one column predicate. Never panics: operands that fail to parse
/// for a typed comparison fall back to a case-insensitive substring match.
pub fn apply_filter_operation(
    cell: &Value,
    search: &str,
    operation: FilterOperation,
    column_type: ColumnType,
) -> bool {
    use FilterOperation::*;

    match operation {
        Empty => return data_model::is_blank(cell),
        NotEmpty => return !data_model::is_blank(cell),
        Contains | DoesNotContain | Equals | NotEquals | StartsWith | EndsWith | In | NotIn => {
            return apply_text_operation(cell, search, operation, column_type);
        }
        _ => {}
    }

    let ordering = match column_type {
        ColumnType::Boolean => compare_booleans(cell, search),
        t if t.is_temporal() => compare_dates(cell, search),
        ColumnType::String => None,
        _ => compare_numbers(cell, search),
    };

    let Some(ordering) = ordering else {
        return substring_match(cell, search, column_type);
    };

    match operation {
        Equal => ordering == Ordering::Equal,
        NotEqual => ordering != Ordering::Equal,
        LessThan | Before => ordering == Ordering::Less,
        LessThanOrEqual | OnOrBefore => ordering != Ordering::Greater,
        GreaterThan | After => ordering == Ordering::Greater,
        GreaterThanOrEqual | OnOrAfter => ordering != Ordering::Less,
        _ => true,
    }
}

fn apply_text_operation(
    cell: &Value,
    search: &str,
    operation: FilterOperation,
    column_type: ColumnType,
) -> bool {
    let haystack = searchable_text(cell, column_type);
    let needle = search.trim().to_lowercase();

    match operation {
        FilterOperation::Contains => haystack.contains(&needle),
        FilterOperation::DoesNotContain => !haystack.contains(&needle),
        FilterOperation::Equals => haystack == needle,
        FilterOperation::NotEquals => haystack != needle,
        FilterOperation::StartsWith => haystack.starts_with(&needle),
        FilterOperation::EndsWith => haystack.ends_with(&needle),
        FilterOperation::In => in_list(&haystack, search),
        FilterOperation::NotIn => !in_list(&haystack, search),
        _ => true,
    }
}

fn in_list(haystack: &str, search: &str) -> bool {
    search
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .any(|item| item == haystack)
}

fn searchable_text(cell: &Value, column_type: ColumnType) -> String {
    let text = match column_type {
        ColumnType::String => data_model::display_value(cell),
        _ => format::format_value(cell, column_type),
    };
    text.trim().to_lowercase()
}

fn substring_match(cell: &Value, search: &str, column_type: ColumnType) -> bool {
    let needle = search.trim().to_lowercase();
    let raw = data_model::display_value(cell).to_lowercase();
    raw.contains(&needle) || searchable_text(cell, column_type).contains(&needle)
}

fn compare_numbers(cell: &Value, search: &str) -> Option<Ordering> {
    let left = data_model::value_as_f64(cell)?;
    let right = data_model::parse_number(search)?;
    left.partial_cmp(&right)
}

fn compare_dates(cell: &Value, search: &str) -> Option<Ordering> {
    let cell_dt = format::parse_datetime(&data_model::display_value(cell))?;
    if let Some(day) = format::parse_date_only(search) {
        return Some(cell_dt.date().cmp(&day));
    }
    let search_dt = format::parse_datetime(search)?;
    Some(cell_dt.cmp(&search_dt))
}

fn compare_booleans(cell: &Value, search: &str) -> Option<Ordering> {
    let left = data_model::value_as_bool(cell)?;
    let right = data_model::parse_bool(search)?;
    Some(left.cmp(&right))
}

/// Column-conjunctive row predicate: a row passes only when every visible
/// column's predicate passes. Columns with an empty search value constrain
/// nothing unless their operation ignores the search value.
pub fn row_passes(
    row: &Row,
    visible_columns: &[Column],
    search_values: &BTreeMap<String, String>,
    operations: &BTreeMap<String, FilterOperation>,
) -> bool {
    visible_columns.iter().all(|column| {
        let search = search_values
            .get(&column.key)
            .map(String::as_str)
            .unwrap_or("");
        let operation = operations
            .get(&column.key)
            .copied()
            .unwrap_or_else(|| default_operation_for_type(column.column_type));

        if search.trim().is_empty() && !operation.ignores_search_value() {
            return true;
        }

        apply_filter_operation(
            format::cell_value(row, column),
            search,
            operation,
            column.column_type,
        )
    })
}
