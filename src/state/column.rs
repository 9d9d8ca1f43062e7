use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Integer,
    Currency,
    Date,
    Datetime,
    Boolean,
    Percentage,
}

impl ColumnType {
    pub fn from_name(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        let base = lower.split('(').next().unwrap_or("").trim();
        match base {
            "number" | "numeric" | "decimal" | "float" | "double" | "real" => Self::Number,
            "integer" | "int" | "bigint" | "smallint" | "mediumint" => Self::Integer,
            "tinyint" if lower.contains("(1)") => Self::Boolean,
            "tinyint" => Self::Integer,
            "currency" | "money" => Self::Currency,
            "date" => Self::Date,
            "datetime" | "timestamp" => Self::Datetime,
            "boolean" | "bool" => Self::Boolean,
            "percentage" | "percent" => Self::Percentage,
            _ => Self::String,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Number | Self::Integer | Self::Currency | Self::Percentage
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Datetime)
    }
}

#[derive(Clone)]
pub struct CellFormatter(pub Arc<dyn Fn(&Value) -> String + Send + Sync>);

impl CellFormatter {
    pub fn new(f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn format(&self, value: &Value) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for CellFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CellFormatter(..)")
    }
}

impl PartialEq for CellFormatter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub key: String,
    pub header: String,
    pub column_type: ColumnType,
    pub sortable: bool,
    pub visible: bool,
    pub original_index: usize,
    pub format: Option<CellFormatter>,
}

impl Column {
    pub fn new(key: impl Into<String>, column_type: ColumnType) -> Self {
        let key = key.into();
        Self {
            header: key.clone(),
            key,
            column_type,
            sortable: true,
            visible: true,
            original_index: 0,
            format: None,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_format(mut self, format: CellFormatter) -> Self {
        self.format = Some(format);
        self
    }
}

/// A column descriptor as it arrives from the outside, in either the server
/// shape (`column_name`/`column_label`/`column_type`) or the code shape
/// (`key`/`header`/`type`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawColumn {
    Server {
        column_name: String,
        #[serde(default)]
        column_label: Option<String>,
        #[serde(default)]
        column_type: Option<String>,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        sortable: Option<bool>,
    },
    Code {
        key: String,
        #[serde(default)]
        header: Option<String>,
        #[serde(default, rename = "type")]
        column_type: Option<String>,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        sortable: Option<bool>,
    },
}

impl RawColumn {
    pub fn code(key: &str, column_type: &str) -> Self {
        Self::Code {
            key: key.to_string(),
            header: None,
            column_type: Some(column_type.to_string()),
            visible: None,
            sortable: None,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Server { column_name, .. } => column_name,
            Self::Code { key, .. } => key,
        }
    }

    fn into_column(self, original_index: usize, persisted: &BTreeMap<String, bool>) -> Column {
        let (key, header, column_type, visible, sortable) = match self {
            Self::Server {
                column_name,
                column_label,
                column_type,
                visible,
                sortable,
            } => (column_name, column_label, column_type, visible, sortable),
            Self::Code {
                key,
                header,
                column_type,
                visible,
                sortable,
            } => (key, header, column_type, visible, sortable),
        };

        let visible = persisted
            .get(&key)
            .copied()
            .or(visible)
            .unwrap_or(true);

        Column {
            header: header.filter(|h| !h.trim().is_empty()).unwrap_or_else(|| key.clone()),
            column_type: column_type
                .as_deref()
                .map(ColumnType::from_name)
                .unwrap_or_default(),
            sortable: sortable.unwrap_or(true),
            visible,
            original_index,
            format: None,
            key,
        }
    }
}

/// Normalizes raw descriptors into columns, assigning `original_index` by
/// position. Visibility precedence: persisted map, then the descriptor's own
/// flag, then visible.
pub fn normalize(raw: Vec<RawColumn>, persisted_visibility: &BTreeMap<String, bool>) -> Vec<Column> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, column)| column.into_column(idx, persisted_visibility))
        .collect()
}

pub fn is_valid_order(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &idx in order {
        if idx >= n || seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}

pub fn ordered_columns(columns: &[Column], order: &[usize]) -> Vec<Column> {
    if !is_valid_order(order, columns.len()) {
        return columns.to_vec();
    }

    let mut out: Vec<Column> = order
        .iter()
        .filter_map(|idx| columns.iter().find(|c| c.original_index == *idx))
        .cloned()
        .collect();
    for column in columns {
        if !order.contains(&column.original_index) {
            out.push(column.clone());
        }
    }
    out
}

pub fn visible_columns(columns: &[Column], order: &[usize]) -> Vec<Column> {
    ordered_columns(columns, order)
        .into_iter()
        .filter(|c| c.visible)
        .collect()
}

/// Repairs a persisted order against the current column count: out-of-range
/// and duplicate entries are dropped and missing indices appended.
pub fn repair_order(order: &[usize], n: usize) -> Vec<usize> {
    if order.is_empty() {
        return Vec::new();
    }
    let mut seen = vec![false; n];
    let mut out = Vec::with_capacity(n);
    for &idx in order {
        if idx < n && !seen[idx] {
            seen[idx] = true;
            out.push(idx);
        }
    }
    for (idx, present) in seen.iter().enumerate() {
        if !present {
            out.push(idx);
        }
    }
    out
}
