use serde_json::{json, Value};

use admingrid::state::column::RawColumn;
use admingrid::state::column_menu::ChecklistItem;
use admingrid::state::data_model::{self, Row};
use admingrid::state::filter::FilterOperation;
use admingrid::state::reorder::DropZone;
use admingrid::state::sorter::SortDirection;
use admingrid::state::table_state::{TableEvent, TableState};

fn row(value: Value) -> Row {
    data_model::row_from_value(value).unwrap()
}

fn people() -> TableState {
    let mut table = TableState::new("people", "people");
    table.set_data(
        vec![
            RawColumn::code("name", "string"),
            RawColumn::code("age", "integer"),
            RawColumn::code("city", "string"),
            RawColumn::code("joined", "date"),
        ],
        vec![
            row(json!({"name": "Alice", "age": 30, "city": "Berlin", "joined": "2020-01-15"})),
            row(json!({"name": "Bob", "age": 25, "city": "Paris", "joined": "2021-06-01"})),
            row(json!({"name": "Carol", "age": 35, "city": "berlin", "joined": "2019-03-10"})),
            row(json!({"name": "Dave", "age": 40, "city": "Rome", "joined": "2022-11-30"})),
            row(json!({"name": "Eve", "age": 20, "city": "Paris", "joined": null})),
        ],
    );
    table
}

fn letters() -> TableState {
    let mut table = TableState::new("letters", "letters");
    table.set_data(
        ["a", "b", "c", "d", "e"]
            .iter()
            .map(|k| RawColumn::code(k, "string"))
            .collect(),
        vec![row(json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5}))],
    );
    table
}

fn names(table: &TableState) -> Vec<String> {
    table
        .displayed_rows()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect()
}

fn ages(table: &TableState) -> Vec<i64> {
    table
        .displayed_rows()
        .iter()
        .map(|r| r["age"].as_i64().unwrap())
        .collect()
}

fn visible_keys(table: &TableState) -> Vec<String> {
    table.visible_columns().into_iter().map(|c| c.key).collect()
}

#[test]
fn test_filter_then_sort_toggle() {
    let mut table = people();
    table.set_filter_operation("age", FilterOperation::GreaterThan);
    table.set_search_value("age", "25".to_string());
    table.apply_filters();
    assert_eq!(ages(&table), vec![30, 35, 40]);

    assert!(table.sort(1, false));
    assert_eq!(ages(&table), vec![30, 35, 40]);
    assert!(table.sort(1, false));
    assert_eq!(ages(&table), vec![40, 35, 30]);
    assert_eq!(table.sort_spec().unwrap().direction, SortDirection::Desc);
}

#[test]
fn test_filters_are_conjunctive() {
    let mut table = people();
    table.set_search_value("city", "berlin".to_string());
    table.set_filter_operation("age", FilterOperation::GreaterThanOrEqual);
    table.set_search_value("age", "31".to_string());
    table.apply_filters();

    assert_eq!(names(&table), vec!["Carol"]);
}

#[test]
fn test_sort_never_resurrects_filtered_rows() {
    let mut table = TableState::new("numbers", "numbers");
    table.set_data(
        vec![RawColumn::code("name", "string"), RawColumn::code("age", "integer")],
        (1..=10).map(|i| row(json!({"name": format!("r{i}"), "age": i}))).collect(),
    );
    table.set_filter_operation("age", FilterOperation::GreaterThan);
    table.set_search_value("age", "7".to_string());
    table.apply_filters();
    assert_eq!(table.row_count(), 3);

    table.set_sort(1, SortDirection::Desc);
    assert_eq!(table.row_count(), 3);
    assert_eq!(ages(&table), vec![10, 9, 8]);
    assert_eq!(table.data().len(), 10);
}

#[test]
fn test_string_sort_is_case_insensitive_and_stable() {
    let mut table = people();
    assert!(table.sort_by_key("city"));
    assert_eq!(names(&table), vec!["Alice", "Carol", "Bob", "Eve", "Dave"]);
}

#[test]
fn test_unsortable_column_ignores_sort() {
    let mut table = TableState::new("t", "t");
    table.set_data(
        serde_json::from_str(r#"[{"key":"name","sortable":false}]"#).unwrap(),
        vec![row(json!({"name": "b"})), row(json!({"name": "a"}))],
    );
    assert!(!table.sort(0, false));
    assert!(table.sort_spec().is_none());
}

#[test]
fn test_filter_on_hidden_column_is_ignored() {
    let mut table = people();
    table.set_search_value("city", "rome".to_string());
    table.apply_filters();
    assert_eq!(names(&table), vec!["Dave"]);

    assert!(table.set_column_visibility("city", false));
    assert_eq!(table.row_count(), 5);
}

#[test]
fn test_date_and_empty_operations() {
    let mut table = people();
    table.set_filter_operation("joined", FilterOperation::Before);
    table.set_search_value("joined", "2020-06-01".to_string());
    table.apply_filters();
    assert_eq!(names(&table), vec!["Alice", "Carol"]);

    table.set_search_value("joined", String::new());
    table.set_filter_operation("joined", FilterOperation::Empty);
    table.apply_filters();
    assert_eq!(names(&table), vec!["Eve"]);
    assert!(table.has_active_filters());

    table.clear_filters();
    assert_eq!(table.row_count(), 5);
    assert!(!table.has_active_filters());
}

#[test]
fn test_unparseable_numeric_search_does_not_panic() {
    let mut table = people();
    table.set_filter_operation("age", FilterOperation::GreaterThan);
    table.set_search_value("age", "abc".to_string());
    table.apply_filters();
    assert_eq!(table.row_count(), 0);
}

#[test]
fn test_in_list_operation() {
    let mut table = people();
    table.set_filter_operation("name", FilterOperation::In);
    table.set_search_value("name", "alice, DAVE".to_string());
    table.apply_filters();
    assert_eq!(names(&table), vec!["Alice", "Dave"]);
}

#[test]
fn test_width_floor_and_resize_drag() {
    let mut table = people();
    assert_eq!(table.set_column_width("age", 10.0), 50);
    assert_eq!(table.column_width("age"), 50);
    assert_eq!(table.column_width("name"), 150);

    table.begin_resize("name", 100.0);
    assert!(table.is_resizing());
    assert_eq!(table.update_resize(20.0), Some(70));
    assert_eq!(table.column_width("name"), 70);
    assert_eq!(table.update_resize(-500.0), Some(50));
    assert!(table.finish_resize());
    assert!(!table.is_resizing());
    assert_eq!(table.column_width("name"), 50);
    assert_eq!(table.layout_state().widths.get("name"), Some(&50));
}

#[test]
fn test_cancelled_resize_keeps_width() {
    let mut table = people();
    table.begin_resize("name", 0.0);
    table.update_resize(300.0);
    table.cancel_resize();
    assert!(!table.finish_resize());
    assert_eq!(table.column_width("name"), 150);
}

#[test]
fn test_move_column_first_to_fourth() {
    let mut table = letters();
    assert!(table.move_column(0, 3));
    assert_eq!(table.order(), &[1, 2, 3, 0, 4]);
    assert_eq!(visible_keys(&table), vec!["b", "c", "d", "a", "e"]);
}

#[test]
fn test_move_column_keeps_hidden_columns_in_place() {
    let mut table = letters();
    table.set_column_visibility("b", false);
    assert!(table.move_column(0, 1));
    assert_eq!(table.order(), &[1, 2, 0, 3, 4]);
    assert_eq!(visible_keys(&table), vec!["c", "a", "d", "e"]);
}

#[test]
fn test_reorder_drag_with_drop_zones() {
    let mut table = people();
    table.begin_reorder(0);
    table.hover_reorder(2, 10.0, 100.0);
    assert_eq!(table.reorder_source(), Some(0));
    assert_eq!(table.drop_zone(2), Some(DropZone::Before));
    assert_eq!(table.drop_zone(0), None);

    assert!(table.finish_reorder());
    assert!(!table.is_reordering());
    assert_eq!(table.effective_order(), vec![1, 0, 2, 3]);
}

#[test]
fn test_reorder_after_zone() {
    let mut table = letters();
    table.begin_reorder(0);
    table.hover_reorder(2, 80.0, 100.0);
    assert_eq!(table.drop_zone(2), Some(DropZone::After));
    assert!(table.finish_reorder());
    assert_eq!(table.effective_order(), vec![1, 2, 0, 3, 4]);
}

#[test]
fn test_drop_on_own_header_does_nothing() {
    let mut table = letters();
    table.begin_reorder(1);
    table.hover_reorder(1, 90.0, 100.0);
    assert!(!table.finish_reorder());
    assert!(table.order().is_empty());
    assert_eq!(table.effective_order(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_visibility_toggle_and_reset() {
    let mut table = people();
    assert!(table.set_column_visibility("city", false));
    assert_eq!(visible_keys(&table), vec!["name", "age", "joined"]);
    assert_eq!(table.layout_state().visibility.get("city"), Some(&false));

    assert!(table.toggle_column_visibility("age"));
    assert_eq!(visible_keys(&table), vec!["name", "joined"]);

    table.reset_visibility();
    assert_eq!(visible_keys(&table), vec!["name", "age", "city", "joined"]);
    assert!(!table.set_column_visibility("missing", false));
}

#[test]
fn test_selection_follows_rows_through_sort_and_filter() {
    let mut table = people();
    table.select_only(0);
    assert!(table.sort(1, false));
    assert_eq!(table.selected_positions(), vec![2]);
    assert_eq!(table.selected_rows()[0]["name"], json!("Alice"));

    table.set_filter_operation("age", FilterOperation::GreaterThan);
    table.set_search_value("age", "32".to_string());
    table.apply_filters();
    assert_eq!(names(&table), vec!["Carol", "Dave"]);
    assert!(table.selected_positions().is_empty());
}

#[test]
fn test_multi_selection_toggle() {
    let mut table = people();
    table.toggle_row_selection(0);
    table.toggle_row_selection(2);
    assert_eq!(table.selected_positions(), vec![0, 2]);
    table.toggle_row_selection(0);
    assert_eq!(table.selected_positions(), vec![2]);
    table.toggle_row_selection(99);
    assert_eq!(table.selected_positions(), vec![2]);

    table.select_all_displayed();
    assert!(table.all_displayed_selected());
    table.clear_selection();
    assert!(table.selected_positions().is_empty());
}

#[test]
fn test_row_requests() {
    let mut table = people();
    assert_eq!(table.request_add(), TableEvent::Add);
    assert!(table.request_edit().is_none());
    assert!(table.request_delete().is_none());

    table.toggle_row_selection(1);
    match table.request_edit() {
        Some(TableEvent::Edit(row)) => assert_eq!(row["name"], json!("Bob")),
        other => panic!("unexpected {other:?}"),
    }

    table.toggle_row_selection(3);
    assert!(table.request_edit().is_none());
    match table.request_delete() {
        Some(TableEvent::Delete(rows)) => assert_eq!(rows.len(), 2),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_set_data_keeps_view_state_and_drops_selection() {
    let mut table = people();
    table.set_column_width("name", 300.0);
    table.set_search_value("city", "paris".to_string());
    table.apply_filters();
    table.select_all_displayed();

    let rows = table.data().clone();
    table.set_data(
        vec![
            RawColumn::code("name", "string"),
            RawColumn::code("age", "integer"),
            RawColumn::code("city", "string"),
            RawColumn::code("joined", "date"),
        ],
        rows,
    );

    assert_eq!(table.column_width("name"), 300);
    assert_eq!(names(&table), vec!["Bob", "Eve"]);
    assert!(table.selected_positions().is_empty());
}

#[test]
fn test_value_checklist_filters_rows() {
    let mut table = people();
    let mut checklist = table.checklist("city").unwrap();
    let values: Vec<&str> = checklist.entries.iter().map(|e| e.value.as_str()).collect();
    assert_eq!(values, vec!["Berlin", "berlin", "Paris", "Rome"]);
    assert!(!checklist.has_blanks);
    assert!(checklist.all_checked());

    checklist.toggle(2);
    table.set_value_filter("city", checklist.to_filter());
    assert_eq!(names(&table), vec!["Alice", "Carol", "Dave"]);

    let reopened = table.checklist("city").unwrap();
    assert!(!reopened.entries[2].checked);
    assert!(table.checklist("name").unwrap().all_checked());
}

#[test]
fn test_checklist_search_scopes_select_all() {
    let table = people();
    let mut checklist = table.checklist("city").unwrap();
    checklist.set_search("ber".to_string());
    assert_eq!(checklist.matching(), vec![0, 1]);

    checklist.set_all(false);
    let checked: Vec<bool> = checklist.entries.iter().map(|e| e.checked).collect();
    assert_eq!(checked, vec![false, false, true, true]);

    // A second checklist for the same column starts from the table, not
    // from the first one's unsaved edits.
    let other = table.checklist("city").unwrap();
    assert!(other.all_checked());
}

#[test]
fn test_checklist_blanks() {
    let mut table = people();
    let mut checklist = table.checklist("joined").unwrap();
    assert!(checklist.has_blanks);
    assert_eq!(checklist.entries[0].value, "2019-03-10");

    checklist.toggle_blanks();
    let filter = checklist.to_filter().unwrap();
    assert!(!filter.include_blanks);
    table.set_value_filter("joined", Some(filter));
    assert_eq!(table.row_count(), 4);

    table.set_value_filter("joined", None);
    assert_eq!(table.row_count(), 5);
}

#[test]
fn test_finish_drag_commits_whichever_drag_is_active() {
    let mut table = people();
    table.begin_resize("name", 100.0);
    table.update_resize(180.0);
    assert!(table.finish_drag());
    assert!(!table.is_resizing());
    assert_eq!(table.column_width("name"), 230);

    table.begin_reorder(0);
    table.hover_reorder(2, 80.0, 100.0);
    assert!(table.finish_drag());
    assert!(!table.is_reordering());
    assert!(!table.finish_drag());
}

#[test]
fn test_checklist_lists_blanks_before_values() {
    let table = people();
    let mut checklist = table.checklist("joined").unwrap();
    let labels: Vec<String> = checklist
        .items()
        .into_iter()
        .map(|item| checklist.label(item).to_string())
        .collect();
    assert_eq!(
        labels,
        vec!["(Select All)", "(Blanks)", "2019-03-10", "2020-01-15", "2021-06-01", "2022-11-30"]
    );

    checklist.toggle_item(ChecklistItem::SelectAll);
    assert!(!checklist.is_checked(ChecklistItem::Blanks));
    assert!(!checklist.is_checked(ChecklistItem::Value(0)));

    checklist.set_search("2020".to_string());
    assert_eq!(
        checklist.items(),
        vec![ChecklistItem::SelectAll, ChecklistItem::Value(1)]
    );
}
