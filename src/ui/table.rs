use dioxus::prelude::*;

use crate::state::column::{Column, ColumnType};
use crate::state::filter::{self, FilterOperation};
use crate::state::format;
use crate::state::reorder::DropZone;
use crate::state::sorter::SortDirection;
use crate::ui::actions::GridHandle;
use crate::ui::column_menu::ColumnMenu;
use crate::ui::{sanitize_id, Services};

#[component]
pub fn Table(grid: GridHandle) -> Element {
    let services = use_context::<Services>();
    let mut table = grid.table;
    let snapshot = table.read().clone();
    let columns = snapshot.visible_columns();

    if snapshot.columns().is_empty() {
        return rsx! {
            p { class: "empty-message", id: "empty-message", "No columns to display." }
        };
    }

    let sort = snapshot.sort_spec();
    let all_selected = snapshot.all_displayed_selected();
    let total_width: u32 = 40 + columns.iter().map(|c| snapshot.column_width(&c.key)).sum::<u32>();
    let search_delay = services.config.search_debounce();
    let container_class = if snapshot.is_resizing() || snapshot.is_reordering() {
        "table-container dragging"
    } else {
        "table-container"
    };

    rsx! {
        div {
            class: "{container_class}",
            id: "table-container",
            onpointermove: move |evt: PointerEvent| {
                if table.peek().is_resizing() {
                    table.write().update_resize(evt.client_coordinates().x);
                }
            },
            onpointerup: move |_| grid.end_drag(),
            onpointercancel: move |_| grid.end_drag(),
            onpointerleave: move |_| grid.end_drag(),
            table { class: "grid-table", style: "width: {total_width}px;",
                thead {
                    tr { class: "header-row",
                        th { class: "select-col",
                            input {
                                r#type: "checkbox",
                                id: "select-all",
                                checked: all_selected,
                                onchange: move |_| {
                                    let mut state = table.write();
                                    if state.all_displayed_selected() {
                                        state.clear_selection();
                                    } else {
                                        state.select_all_displayed();
                                    }
                                }
                            }
                        }
                        for (position, column) in columns.iter().enumerate() {
                            HeaderCell {
                                key: "{column.key}",
                                grid,
                                position,
                                column: column.clone(),
                                width: snapshot.column_width(&column.key),
                                sort: sort.filter(|s| s.column == column.original_index).map(|s| s.direction),
                                drop_zone: snapshot.drop_zone(position),
                                is_source: snapshot.reorder_source() == Some(position),
                            }
                        }
                    }
                    tr { class: "filter-row",
                        th { class: "select-col" }
                        for column in columns.iter() {
                            FilterCell {
                                key: "{column.key}",
                                grid,
                                column: column.clone(),
                                operation: snapshot.filter_operation(&column.key),
                                value: snapshot.search_value(&column.key).to_string(),
                                delay_ms: search_delay.as_millis() as u64,
                            }
                        }
                    }
                }
                tbody {
                    if snapshot.row_count() == 0 {
                        tr {
                            td { class: "empty-message", colspan: "{columns.len() + 1}",
                                if snapshot.data().is_empty() { "No rows." } else { "No rows match the current filters." }
                            }
                        }
                    }
                    for (position, row) in snapshot.displayed_rows().into_iter().enumerate() {
                        tr {
                            key: "{position}",
                            class: row_class(position, snapshot.is_selected(position)),
                            id: "row-{position}",
                            onclick: move |evt: MouseEvent| {
                                let modifiers = evt.modifiers();
                                let mut state = table.write();
                                if modifiers.contains(Modifiers::CONTROL) || modifiers.contains(Modifiers::META) {
                                    state.toggle_row_selection(position);
                                } else {
                                    state.select_only(position);
                                }
                            },
                            ondoubleclick: {
                                let services = services.clone();
                                move |_| {
                                    table.write().select_only(position);
                                    let event = table.peek().request_edit();
                                    if let Some(event) = event {
                                        grid.dispatch(&services, event);
                                    }
                                }
                            },
                            td { class: "select-col",
                                input {
                                    r#type: "checkbox",
                                    checked: snapshot.is_selected(position),
                                    onclick: move |evt| {
                                        evt.stop_propagation();
                                        table.write().toggle_row_selection(position);
                                    }
                                }
                            }
                            for column in columns.iter() {
                                td {
                                    class: cell_class(column.column_type),
                                    id: format!("cell-{}-{}", position, sanitize_id(&column.key)),
                                    "{format::display_cell(row, column)}"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn HeaderCell(
    grid: GridHandle,
    position: usize,
    column: Column,
    width: u32,
    #[props(!optional)] sort: Option<SortDirection>,
    #[props(!optional)] drop_zone: Option<DropZone>,
    is_source: bool,
) -> Element {
    let mut table = grid.table;
    let mut menu_column = grid.menu_column;
    let menu_open = menu_column.read().as_deref() == Some(column.key.as_str());
    let original_index = column.original_index;
    let sortable = column.sortable;

    let mut class = String::from("header-cell");
    if sortable {
        class.push_str(" sortable");
    }
    if is_source {
        class.push_str(" drag-source");
    }
    match drop_zone {
        Some(DropZone::Before) => class.push_str(" drop-before"),
        Some(DropZone::After) => class.push_str(" drop-after"),
        None => {}
    }
    let indicator = match sort {
        Some(SortDirection::Asc) => "\u{25B2}",
        Some(SortDirection::Desc) => "\u{25BC}",
        None => "",
    };

    rsx! {
        th {
            class: "{class}",
            id: format!("col-{}", sanitize_id(&column.key)),
            style: "width: {width}px; min-width: {width}px; max-width: {width}px;",
            onpointerdown: move |_| {
                table.write().begin_reorder(position);
            },
            onpointermove: move |evt: PointerEvent| {
                if table.peek().is_reordering() {
                    table.write().hover_reorder(position, evt.element_coordinates().x, width as f64);
                }
            },
            onclick: move |_| {
                if sortable && table.write().sort(original_index, false) {
                    grid.view_changed();
                }
            },
            span { class: "header-label", "{column.header}" }
            span { class: "sort-indicator", "{indicator}" }
            button {
                class: "column-menu-btn",
                id: format!("menu-{}", sanitize_id(&column.key)),
                onpointerdown: move |evt| evt.stop_propagation(),
                onclick: {
                    let key = column.key.clone();
                    move |evt: MouseEvent| {
                        evt.stop_propagation();
                        if menu_open {
                            menu_column.set(None);
                        } else {
                            menu_column.set(Some(key.clone()));
                        }
                    }
                },
                "\u{22EE}"
            }
            div {
                class: "resize-handle",
                onpointerdown: {
                    let key = column.key.clone();
                    move |evt: PointerEvent| {
                        evt.stop_propagation();
                        table.write().begin_resize(&key, evt.client_coordinates().x);
                    }
                },
                onclick: move |evt| evt.stop_propagation(),
            }
            if menu_open {
                ColumnMenu { grid, column: column.clone() }
            }
        }
    }
}

#[component]
fn FilterCell(
    grid: GridHandle,
    column: Column,
    operation: FilterOperation,
    value: String,
    delay_ms: u64,
) -> Element {
    let mut table = grid.table;
    let input_type = match column.column_type {
        ColumnType::Date => "date",
        _ => "text",
    };

    rsx! {
        th { class: "filter-cell",
            select {
                class: "filter-operation",
                id: format!("filter-op-{}", sanitize_id(&column.key)),
                value: "{operation.name()}",
                onchange: {
                    let key = column.key.clone();
                    move |evt: Event<FormData>| {
                        if let Some(next) = FilterOperation::from_name(&evt.value()) {
                            let mut state = table.write();
                            state.set_filter_operation(&key, next);
                            state.apply_filters();
                            drop(state);
                            grid.view_changed();
                        }
                    }
                },
                for op in filter::operations_for_type(column.column_type).iter().copied() {
                    option { value: "{op.name()}", selected: op == operation, "{op.label()}" }
                }
            }
            if !operation.ignores_search_value() {
                input {
                    class: "filter-input",
                    id: format!("filter-{}", sanitize_id(&column.key)),
                    r#type: input_type,
                    placeholder: "Filter\u{2026}",
                    value: "{value}",
                    oninput: {
                        let key = column.key.clone();
                        move |evt: Event<FormData>| {
                            grid.search_input(
                                key.clone(),
                                evt.value(),
                                std::time::Duration::from_millis(delay_ms),
                            );
                        }
                    }
                }
            }
        }
    }
}

fn row_class(position: usize, selected: bool) -> String {
    let parity = if position % 2 == 0 { "even" } else { "odd" };
    if selected {
        format!("{parity} selected-row")
    } else {
        parity.to_string()
    }
}

fn cell_class(column_type: ColumnType) -> &'static str {
    if column_type.is_numeric() {
        "cell cell-numeric"
    } else {
        "cell"
    }
}
