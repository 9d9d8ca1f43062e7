use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::state::add_form::{FormErrors, FormMode, RowForm, RowSubmission};
use crate::state::column::{self, Column, RawColumn};
use crate::state::column_menu::{self, Checklist, ValueFilter};
use crate::state::data_model::{Row, Rows};
use crate::state::filter::{self, FilterOperation};
use crate::state::reorder::{self, DropZone, Reorderer};
use crate::state::resize::{self, Resizer};
use crate::state::sorter::{self, SortDirection, SortSpec};
use crate::state::view_state::{LayoutState, SearchPatternState, ViewState};

#[derive(Clone, Debug, PartialEq)]
pub enum TableEvent {
    Add,
    AddSubmit(RowSubmission),
    Edit(Row),
    EditSubmit { original: Row, submission: RowSubmission },
    Delete(Vec<Row>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableState {
    table_name: String,
    form_name: String,
    columns: Vec<Column>,
    data: Rows,
    // indices into `data`, filtered then sorted
    displayed: Vec<usize>,
    // positions into `displayed`
    selection: BTreeSet<usize>,
    widths: BTreeMap<String, u32>,
    order: Vec<usize>,
    visibility: BTreeMap<String, bool>,
    sort: Option<SortSpec>,
    sort_direction: SortDirection,
    search_values: BTreeMap<String, String>,
    filter_operations: BTreeMap<String, FilterOperation>,
    value_filters: BTreeMap<String, ValueFilter>,
    resizer: Resizer,
    reorderer: Reorderer,
}

impl TableState {
    pub fn new(table_name: impl Into<String>, form_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            form_name: form_name.into(),
            ..Self::default()
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    pub fn set_table_name(&mut self, table_name: impl Into<String>) {
        self.table_name = table_name.into();
    }

    pub fn set_data(&mut self, raw_columns: Vec<RawColumn>, rows: Rows) {
        let columns = column::normalize(raw_columns, &self.visibility);
        self.set_columns(columns, rows);
    }

    // Layout goes in before normalizing so stored visibility wins.
    pub fn hydrate(&mut self, view: &ViewState, raw_columns: Vec<RawColumn>, rows: Rows) {
        self.set_layout(&view.layout);
        self.set_data(raw_columns, rows);
        self.apply_search_pattern(&view.searchpattern);
    }

    pub fn set_columns(&mut self, columns: Vec<Column>, rows: Rows) {
        self.columns = columns
            .into_iter()
            .enumerate()
            .map(|(idx, mut c)| {
                c.original_index = idx;
                if let Some(visible) = self.visibility.get(&c.key) {
                    c.visible = *visible;
                }
                c
            })
            .collect();
        self.data = rows;
        self.order = column::repair_order(&self.order, self.columns.len());
        if self.sort.is_some_and(|s| s.column >= self.columns.len()) {
            self.sort = None;
        }
        self.value_filters
            .retain(|key, _| self.columns.iter().any(|c| &c.key == key));
        self.selection.clear();
        self.resizer.cancel();
        self.reorderer.cancel();
        self.apply_filters();
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn data(&self) -> &Rows {
        &self.data
    }

    pub fn ordered_columns(&self) -> Vec<Column> {
        column::ordered_columns(&self.columns, &self.order)
    }

    pub fn visible_columns(&self) -> Vec<Column> {
        column::visible_columns(&self.columns, &self.order)
    }

    pub fn effective_order(&self) -> Vec<usize> {
        self.ordered_columns()
            .iter()
            .map(|c| c.original_index)
            .collect()
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn displayed_indices(&self) -> &[usize] {
        &self.displayed
    }

    pub fn displayed_rows(&self) -> Vec<&Row> {
        self.displayed.iter().filter_map(|i| self.data.get(*i)).collect()
    }

    pub fn displayed_row(&self, position: usize) -> Option<&Row> {
        self.displayed.get(position).and_then(|i| self.data.get(*i))
    }

    pub fn row_count(&self) -> usize {
        self.displayed.len()
    }

    pub fn set_search_value(&mut self, key: &str, value: String) {
        if value.is_empty() {
            self.search_values.remove(key);
        } else {
            self.search_values.insert(key.to_string(), value);
        }
    }

    pub fn search_value(&self, key: &str) -> &str {
        self.search_values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set_filter_operation(&mut self, key: &str, operation: FilterOperation) {
        self.filter_operations.insert(key.to_string(), operation);
    }

    pub fn filter_operation(&self, key: &str) -> FilterOperation {
        self.filter_operations.get(key).copied().unwrap_or_else(|| {
            self.column(key)
                .map(|c| filter::default_operation_for_type(c.column_type))
                .unwrap_or(FilterOperation::Contains)
        })
    }

    pub fn has_active_filters(&self) -> bool {
        !self.value_filters.is_empty()
            || !self.search_values.is_empty()
            || self
                .filter_operations
                .values()
                .any(|op| op.ignores_search_value())
    }

    pub fn apply_filters(&mut self) {
        let selected = self.selected_data_indices();
        let visible = self.visible_columns();

        let mut indices: Vec<usize> = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                filter::row_passes(row, &visible, &self.search_values, &self.filter_operations)
                    && visible.iter().all(|c| {
                        self.value_filters
                            .get(&c.key)
                            .map(|f| f.matches(row, c))
                            .unwrap_or(true)
                    })
            })
            .map(|(idx, _)| idx)
            .collect();

        if let Some(spec) = self.sort {
            if let Some(column) = self.columns.get(spec.column) {
                sorter::sort_indices(&mut indices, &self.data, column, spec.direction);
            }
        }

        self.displayed = indices;
        self.restore_selection(&selected);
    }

    pub fn clear_filters(&mut self) {
        self.search_values.clear();
        self.filter_operations.clear();
        self.value_filters.clear();
        self.apply_filters();
    }

    pub fn checklist(&self, key: &str) -> Option<Checklist> {
        let column = self.column(key)?;
        let distinct = column_menu::distinct_values(&self.data, column);
        Some(Checklist::new(distinct, self.value_filters.get(key)))
    }

    pub fn value_filter(&self, key: &str) -> Option<&ValueFilter> {
        self.value_filters.get(key)
    }

    pub fn set_value_filter(&mut self, key: &str, value_filter: Option<ValueFilter>) {
        match value_filter {
            Some(f) => {
                self.value_filters.insert(key.to_string(), f);
            }
            None => {
                self.value_filters.remove(key);
            }
        }
        self.apply_filters();
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
    }

    // Sorts the displayed rows only; filtered-out rows never come back.
    pub fn sort(&mut self, original_index: usize, preserve_direction: bool) -> bool {
        if !self
            .columns
            .get(original_index)
            .is_some_and(|c| c.sortable)
        {
            return false;
        }
        let spec = sorter::next_sort(
            self.sort,
            self.sort_direction,
            original_index,
            preserve_direction,
        );
        self.set_sort(original_index, spec.direction)
    }

    pub fn set_sort(&mut self, original_index: usize, direction: SortDirection) -> bool {
        let Some(column) = self.columns.get(original_index) else {
            return false;
        };
        if !column.sortable {
            return false;
        }
        let selected = self.selected_data_indices();
        sorter::sort_indices(&mut self.displayed, &self.data, column, direction);
        self.sort = Some(SortSpec {
            column: original_index,
            direction,
        });
        self.sort_direction = direction;
        self.restore_selection(&selected);
        true
    }

    pub fn sort_by_key(&mut self, key: &str) -> bool {
        match self.column(key).map(|c| c.original_index) {
            Some(idx) => self.sort(idx, false),
            None => false,
        }
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.apply_filters();
    }

    pub fn column_width(&self, key: &str) -> u32 {
        self.resizer
            .live_width(key)
            .or_else(|| self.widths.get(key).copied())
            .unwrap_or(resize::DEFAULT_COLUMN_WIDTH)
    }

    pub fn set_column_width(&mut self, key: &str, width: f64) -> u32 {
        let width = resize::clamp_width(width);
        self.widths.insert(key.to_string(), width);
        width
    }

    pub fn begin_resize(&mut self, key: &str, pointer_x: f64) {
        let width = self.column_width(key);
        self.resizer.begin(key, pointer_x, width);
    }

    pub fn update_resize(&mut self, pointer_x: f64) -> Option<u32> {
        self.resizer.update(pointer_x)
    }

    pub fn finish_resize(&mut self) -> bool {
        match self.resizer.finish() {
            Some((key, width)) => {
                self.widths.insert(key, width);
                true
            }
            None => false,
        }
    }

    pub fn cancel_resize(&mut self) {
        self.resizer.cancel();
    }

    pub fn is_resizing(&self) -> bool {
        self.resizer.is_dragging()
    }

    pub fn begin_reorder(&mut self, position: usize) {
        self.reorderer.begin(position);
    }

    pub fn hover_reorder(&mut self, position: usize, offset_x: f64, width: f64) {
        self.reorderer.hover(position, offset_x, width);
    }

    pub fn drop_zone(&self, position: usize) -> Option<DropZone> {
        self.reorderer.highlight(position)
    }

    pub fn reorder_source(&self) -> Option<usize> {
        self.reorderer.source()
    }

    pub fn is_reordering(&self) -> bool {
        self.reorderer.is_dragging()
    }

    pub fn finish_reorder(&mut self) -> bool {
        match self.reorderer.finish() {
            Some((from, to)) => self.move_column(from, to),
            None => false,
        }
    }

    pub fn cancel_reorder(&mut self) {
        self.reorderer.cancel();
    }

    // Release, pointer cancel and leaving the grid all commit.
    pub fn finish_drag(&mut self) -> bool {
        let resized = self.finish_resize();
        let moved = self.finish_reorder();
        resized || moved
    }

    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        let full = self.effective_order();
        let visible: Vec<usize> = self
            .visible_columns()
            .iter()
            .map(|c| c.original_index)
            .collect();
        let next = reorder::move_in_order(&full, &visible, from, to);
        if next == full {
            return false;
        }
        self.order = next;
        true
    }

    pub fn set_column_visibility(&mut self, key: &str, visible: bool) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| c.key == key) else {
            return false;
        };
        column.visible = visible;
        self.visibility.insert(key.to_string(), visible);
        self.apply_filters();
        true
    }

    pub fn toggle_column_visibility(&mut self, key: &str) -> bool {
        match self.column(key).map(|c| c.visible) {
            Some(visible) => self.set_column_visibility(key, !visible),
            None => false,
        }
    }

    pub fn reset_visibility(&mut self) {
        for column in &mut self.columns {
            column.visible = true;
            self.visibility.insert(column.key.clone(), true);
        }
        self.apply_filters();
    }

    pub fn layout_state(&self) -> LayoutState {
        let mut visibility = self.visibility.clone();
        for column in &self.columns {
            visibility.insert(column.key.clone(), column.visible);
        }
        LayoutState {
            widths: self.widths.clone(),
            order: self.order.clone(),
            visibility,
        }
    }

    pub fn search_pattern_state(&self) -> SearchPatternState {
        SearchPatternState {
            sort_column: self.sort.map(|s| s.column),
            sort_direction: self.sort.map(|s| s.direction).unwrap_or(self.sort_direction),
            search_values: self.search_values.clone(),
            filter_operations: self.filter_operations.clone(),
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            layout: self.layout_state(),
            searchpattern: self.search_pattern_state(),
        }
    }

    pub fn apply_view_state(&mut self, state: &ViewState) {
        self.set_layout(&state.layout);
        self.apply_search_pattern(&state.searchpattern);
    }

    pub fn apply_layout(&mut self, layout: &LayoutState) {
        self.set_layout(layout);
        self.apply_filters();
    }

    fn set_layout(&mut self, layout: &LayoutState) {
        self.widths = layout
            .widths
            .iter()
            .filter(|(_, w)| resize::is_valid_width(**w as i64))
            .map(|(k, w)| (k.clone(), *w))
            .collect();
        self.order = if self.columns.is_empty() {
            layout.order.clone()
        } else {
            column::repair_order(&layout.order, self.columns.len())
        };
        self.visibility = layout.visibility.clone();
        for column in &mut self.columns {
            column.visible = self.visibility.get(&column.key).copied().unwrap_or(true);
        }
    }

    pub fn apply_search_pattern(&mut self, pattern: &SearchPatternState) {
        self.search_values = pattern
            .search_values
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.filter_operations = pattern.filter_operations.clone();
        self.sort_direction = pattern.sort_direction;
        self.sort = pattern
            .sort_column
            .filter(|idx| self.columns.is_empty() || *idx < self.columns.len())
            .map(|column| SortSpec {
                column,
                direction: pattern.sort_direction,
            });
        self.apply_filters();
    }

    pub fn selected_positions(&self) -> Vec<usize> {
        self.selection.iter().copied().collect()
    }

    pub fn is_selected(&self, position: usize) -> bool {
        self.selection.contains(&position)
    }

    pub fn selected_rows(&self) -> Vec<Row> {
        self.selection
            .iter()
            .filter_map(|p| self.displayed_row(*p).cloned())
            .collect()
    }

    pub fn toggle_row_selection(&mut self, position: usize) {
        if position >= self.displayed.len() {
            return;
        }
        if !self.selection.remove(&position) {
            self.selection.insert(position);
        }
    }

    pub fn select_only(&mut self, position: usize) {
        self.selection.clear();
        if position < self.displayed.len() {
            self.selection.insert(position);
        }
    }

    pub fn select_all_displayed(&mut self) {
        self.selection = (0..self.displayed.len()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn all_displayed_selected(&self) -> bool {
        !self.displayed.is_empty() && self.selection.len() == self.displayed.len()
    }

    fn selected_data_indices(&self) -> Vec<usize> {
        self.selection
            .iter()
            .filter_map(|p| self.displayed.get(*p).copied())
            .collect()
    }

    fn restore_selection(&mut self, data_indices: &[usize]) {
        let positions: HashMap<usize, usize> = self
            .displayed
            .iter()
            .enumerate()
            .map(|(pos, idx)| (*idx, pos))
            .collect();
        self.selection = data_indices
            .iter()
            .filter_map(|idx| positions.get(idx).copied())
            .collect();
    }

    pub fn request_add(&self) -> TableEvent {
        TableEvent::Add
    }

    pub fn request_edit(&self) -> Option<TableEvent> {
        match self.selected_rows().as_slice() {
            [row] => Some(TableEvent::Edit(row.clone())),
            _ => None,
        }
    }

    pub fn request_delete(&self) -> Option<TableEvent> {
        let rows = self.selected_rows();
        (!rows.is_empty()).then_some(TableEvent::Delete(rows))
    }

    pub fn submit_form(&self, form: &RowForm) -> Result<TableEvent, FormErrors> {
        let submission = form.submit()?;
        Ok(match (form.mode, form.original()) {
            (FormMode::Edit, Some(original)) => TableEvent::EditSubmit {
                original: original.clone(),
                submission,
            },
            _ => TableEvent::AddSubmit(submission),
        })
    }
}
