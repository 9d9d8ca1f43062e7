use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::filter::FilterOperation;
use crate::state::resize;
use crate::state::sorter::SortDirection;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutState {
    #[serde(default)]
    pub widths: BTreeMap<String, u32>,
    #[serde(default)]
    pub order: Vec<usize>,
    #[serde(default)]
    pub visibility: BTreeMap<String, bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPatternState {
    #[serde(default)]
    pub sort_column: Option<usize>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub search_values: BTreeMap<String, String>,
    #[serde(default)]
    pub filter_operations: BTreeMap<String, FilterOperation>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub layout: LayoutState,
    #[serde(default)]
    pub searchpattern: SearchPatternState,
}

impl ViewState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Total hydration: any malformed piece is replaced by its default rather
    /// than failing the whole document. A JSON string holding the document is
    /// unwrapped first, since some backends store the blob as text.
    pub fn from_value(value: &Value) -> Self {
        if let Value::String(text) = value {
            return serde_json::from_str::<Value>(text)
                .map(|inner| Self::from_value(&inner))
                .unwrap_or_default();
        }
        let Some(root) = value.as_object() else {
            return Self::default();
        };

        Self {
            layout: root
                .get("layout")
                .map(LayoutState::from_value)
                .unwrap_or_default(),
            searchpattern: root
                .get("searchpattern")
                .map(SearchPatternState::from_value)
                .unwrap_or_default(),
        }
    }
}

impl LayoutState {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let widths = object_of(obj.get("widths"))
            .iter()
            .filter_map(|(k, v)| {
                let width = v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64))?;
                resize::is_valid_width(width).then(|| (k.clone(), width as u32))
            })
            .collect();

        let order = match obj.get("order") {
            Some(Value::Array(items)) => {
                let parsed: Option<Vec<usize>> = items
                    .iter()
                    .map(|v| v.as_u64().map(|n| n as usize))
                    .collect();
                parsed.unwrap_or_default()
            }
            _ => Vec::new(),
        };

        let visibility = object_of(obj.get("visibility"))
            .iter()
            .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
            .collect();

        Self {
            widths,
            order,
            visibility,
        }
    }
}

impl SearchPatternState {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let sort_column = obj
            .get("sortColumn")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .map(|n| n as usize);

        let sort_direction = obj
            .get("sortDirection")
            .and_then(Value::as_str)
            .map(SortDirection::from_name)
            .unwrap_or_default();

        let search_values = object_of(obj.get("searchValues"))
            .iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k.clone(), s.clone())),
                Value::Number(n) => Some((k.clone(), n.to_string())),
                _ => None,
            })
            .collect();

        let filter_operations = object_of(obj.get("filterOperations"))
            .iter()
            .filter_map(|(k, v)| {
                v.as_str()
                    .and_then(FilterOperation::from_name)
                    .map(|op| (k.clone(), op))
            })
            .collect();

        Self {
            sort_column,
            sort_direction,
            search_values,
            filter_operations,
        }
    }
}

fn object_of(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
