use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::table_state::TableState;
use crate::state::view_state::{LayoutState, SearchPatternState, ViewState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Searchpattern,
    Layout,
    Session,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Searchpattern => "searchpattern",
            Self::Layout => "layout",
            Self::Session => "session",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Searchpattern => "Search patterns",
            Self::Layout => "Layouts",
            Self::Session => "Sessions",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedPattern {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PatternKind,
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatternData {
    Searchpattern(SearchPatternState),
    Layout(LayoutState),
    Session(SessionSnapshot),
}

impl PatternData {
    pub fn kind(&self) -> PatternKind {
        match self {
            Self::Searchpattern(_) => PatternKind::Searchpattern,
            Self::Layout(_) => PatternKind::Layout,
            Self::Session(_) => PatternKind::Session,
        }
    }

    /// Snapshot of one grid for the per-table kinds. Sessions span several
    /// grids and are assembled by the host.
    pub fn capture(kind: PatternKind, table: &TableState) -> Option<Self> {
        match kind {
            PatternKind::Searchpattern => Some(Self::Searchpattern(table.search_pattern_state())),
            PatternKind::Layout => Some(Self::Layout(table.layout_state())),
            PatternKind::Session => None,
        }
    }

    /// Restores a per-table snapshot. Returns false for sessions.
    pub fn apply_to(&self, table: &mut TableState) -> bool {
        match self {
            Self::Searchpattern(state) => table.apply_search_pattern(state),
            Self::Layout(state) => table.apply_layout(state),
            Self::Session(_) => return false,
        }
        true
    }

    pub fn to_value(&self) -> Value {
        let out = match self {
            Self::Searchpattern(state) => serde_json::to_value(state),
            Self::Layout(state) => serde_json::to_value(state),
            Self::Session(state) => serde_json::to_value(state),
        };
        out.unwrap_or(Value::Null)
    }

    pub fn from_value(kind: PatternKind, value: &Value) -> Self {
        let value = match value {
            Value::String(text) => serde_json::from_str(text).unwrap_or(Value::Null),
            other => other.clone(),
        };
        match kind {
            PatternKind::Searchpattern => Self::Searchpattern(SearchPatternState::from_value(&value)),
            PatternKind::Layout => Self::Layout(LayoutState::from_value(&value)),
            PatternKind::Session => Self::Session(SessionSnapshot::from_value(&value)),
        }
    }
}

/// Which forms were open as tabs, the active one, and each open grid's view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub open_tabs: Vec<String>,
    #[serde(default)]
    pub active_tab: Option<String>,
    #[serde(default)]
    pub grids: BTreeMap<String, ViewState>,
}

impl SessionSnapshot {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let open_tabs = match obj.get("open_tabs") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        let active_tab = obj
            .get("active_tab")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|tab| open_tabs.contains(tab));
        let grids = match obj.get("grids") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), ViewState::from_value(v)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self {
            open_tabs,
            active_tab,
            grids,
        }
    }
}

pub fn filter_patterns<'a>(patterns: &'a [PatternSummary], query: &str) -> Vec<&'a PatternSummary> {
    let needle = query.trim().to_lowercase();
    patterns
        .iter()
        .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
        .collect()
}

pub fn find_by_name<'a>(patterns: &'a [PatternSummary], name: &str) -> Option<&'a PatternSummary> {
    let name = name.trim();
    patterns.iter().find(|p| p.name.trim() == name)
}
