use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::state::column::{Column, ColumnType};
use crate::state::data_model::{self, Row};
use crate::state::format;
use crate::state::sorter;

pub const SELECT_ALL_LABEL: &str = "(Select All)";
pub const BLANKS_LABEL: &str = "(Blanks)";

pub fn sort_labels(column_type: ColumnType) -> (&'static str, &'static str) {
    match column_type {
        ColumnType::String => ("Sort A → Z", "Sort Z → A"),
        ColumnType::Boolean => ("Sort False → True", "Sort True → False"),
        t if t.is_temporal() => ("Sort Oldest → Newest", "Sort Newest → Oldest"),
        _ => ("Sort Smallest → Largest", "Sort Largest → Smallest"),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DistinctValues {
    pub has_blanks: bool,
    pub values: Vec<String>,
}

/// Scans every row (not only the displayed ones) for the distinct formatted
/// values of `column`.
pub fn distinct_values(rows: &[Row], column: &Column) -> DistinctValues {
    let mut has_blanks = false;
    let mut seen = BTreeSet::new();
    let mut entries: Vec<(String, Value)> = Vec::new();

    for row in rows {
        let value = format::cell_value(row, column);
        if data_model::is_blank(value) {
            has_blanks = true;
            continue;
        }
        let display = format::display_cell(row, column);
        if display.trim().is_empty() {
            has_blanks = true;
            continue;
        }
        if seen.insert(display.clone()) {
            entries.push((display, value.clone()));
        }
    }

    entries.sort_by(|(a_text, a), (b_text, b)| {
        let ordering = match column.column_type {
            ColumnType::String => Ordering::Equal,
            t => sorter::compare_cells(a, b, t),
        };
        ordering.then_with(|| a_text.to_lowercase().cmp(&b_text.to_lowercase()))
    });

    DistinctValues {
        has_blanks,
        values: entries.into_iter().map(|(text, _)| text).collect(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueFilter {
    pub selected: BTreeSet<String>,
    pub include_blanks: bool,
}

impl ValueFilter {
    pub fn matches(&self, row: &Row, column: &Column) -> bool {
        if data_model::is_blank(format::cell_value(row, column)) {
            return self.include_blanks;
        }
        let display = format::display_cell(row, column);
        if display.trim().is_empty() {
            return self.include_blanks;
        }
        self.selected.contains(&display)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecklistEntry {
    pub value: String,
    pub checked: bool,
}

/// One line of the checklist, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecklistItem {
    SelectAll,
    Blanks,
    Value(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Checklist {
    pub entries: Vec<ChecklistEntry>,
    pub has_blanks: bool,
    pub blanks_checked: bool,
    pub search: String,
}

impl Checklist {
    /// Builds the checklist, pre-checking values admitted by `current`.
    pub fn new(distinct: DistinctValues, current: Option<&ValueFilter>) -> Self {
        let entries = distinct
            .values
            .into_iter()
            .map(|value| ChecklistEntry {
                checked: current.map(|f| f.selected.contains(&value)).unwrap_or(true),
                value,
            })
            .collect();
        Self {
            entries,
            has_blanks: distinct.has_blanks,
            blanks_checked: current.map(|f| f.include_blanks).unwrap_or(true),
            search: String::new(),
        }
    }

    pub fn set_search(&mut self, search: String) {
        self.search = search;
    }

    pub fn matching(&self) -> Vec<usize> {
        let needle = self.search.trim().to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| needle.is_empty() || e.value.to_lowercase().contains(&needle))
            .map(|(idx, _)| idx)
            .collect()
    }

    fn blanks_listed(&self) -> bool {
        self.has_blanks && self.search.trim().is_empty()
    }

    pub fn all_checked(&self) -> bool {
        let values = self.matching().iter().all(|idx| self.entries[*idx].checked);
        values && (!self.blanks_listed() || self.blanks_checked)
    }

    /// "(Select All)" acts on the entries currently listed.
    pub fn set_all(&mut self, checked: bool) {
        for idx in self.matching() {
            self.entries[idx].checked = checked;
        }
        if self.blanks_listed() {
            self.blanks_checked = checked;
        }
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.checked = !entry.checked;
        }
    }

    pub fn toggle_blanks(&mut self) {
        self.blanks_checked = !self.blanks_checked;
    }

    /// "(Select All)", then "(Blanks)" when listed, then the matching values.
    pub fn items(&self) -> Vec<ChecklistItem> {
        let mut items = vec![ChecklistItem::SelectAll];
        if self.blanks_listed() {
            items.push(ChecklistItem::Blanks);
        }
        items.extend(self.matching().into_iter().map(ChecklistItem::Value));
        items
    }

    pub fn label(&self, item: ChecklistItem) -> &str {
        match item {
            ChecklistItem::SelectAll => SELECT_ALL_LABEL,
            ChecklistItem::Blanks => BLANKS_LABEL,
            ChecklistItem::Value(idx) => self.entries.get(idx).map_or("", |e| e.value.as_str()),
        }
    }

    pub fn is_checked(&self, item: ChecklistItem) -> bool {
        match item {
            ChecklistItem::SelectAll => self.all_checked(),
            ChecklistItem::Blanks => self.blanks_checked,
            ChecklistItem::Value(idx) => self.entries.get(idx).is_some_and(|e| e.checked),
        }
    }

    pub fn toggle_item(&mut self, item: ChecklistItem) {
        match item {
            ChecklistItem::SelectAll => self.set_all(!self.all_checked()),
            ChecklistItem::Blanks => self.toggle_blanks(),
            ChecklistItem::Value(idx) => self.toggle(idx),
        }
    }

    /// The filter to apply, or `None` when every value is admitted.
    pub fn to_filter(&self) -> Option<ValueFilter> {
        let everything = self.entries.iter().all(|e| e.checked)
            && (!self.has_blanks || self.blanks_checked);
        if everything {
            return None;
        }
        Some(ValueFilter {
            selected: self
                .entries
                .iter()
                .filter(|e| e.checked)
                .map(|e| e.value.clone())
                .collect(),
            include_blanks: self.blanks_checked,
        })
    }
}
