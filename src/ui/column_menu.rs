use dioxus::prelude::*;

use crate::state::column::Column;
use crate::state::column_menu;
use crate::state::sorter::SortDirection;
use crate::ui::actions::GridHandle;

/// Per-column popover: sort shortcuts, hide, and the value checklist.
#[component]
pub fn ColumnMenu(grid: GridHandle, column: Column) -> Element {
    let mut table = grid.table;
    let mut menu_column = grid.menu_column;
    let mut checklist = use_signal(|| table.peek().checklist(&column.key).unwrap_or_default());
    let (asc_label, desc_label) = column_menu::sort_labels(column.column_type);
    let original_index = column.original_index;

    let list = checklist.read().clone();
    let rows: Vec<_> = list
        .items()
        .into_iter()
        .map(|item| (item, format!("{item:?}"), list.label(item).to_string(), list.is_checked(item)))
        .collect();

    rsx! {
        div {
            class: "column-menu",
            onclick: move |evt| evt.stop_propagation(),
            onpointerdown: move |evt| evt.stop_propagation(),
            if column.sortable {
                button {
                    class: "menu-item",
                    onclick: move |_| {
                        if table.write().set_sort(original_index, SortDirection::Asc) {
                            grid.view_changed();
                        }
                        menu_column.set(None);
                    },
                    "{asc_label}"
                }
                button {
                    class: "menu-item",
                    onclick: move |_| {
                        if table.write().set_sort(original_index, SortDirection::Desc) {
                            grid.view_changed();
                        }
                        menu_column.set(None);
                    },
                    "{desc_label}"
                }
            }
            button {
                class: "menu-item",
                onclick: {
                    let key = column.key.clone();
                    move |_| {
                        if table.write().set_column_visibility(&key, false) {
                            grid.save_now();
                        }
                        menu_column.set(None);
                    }
                },
                "Hide column"
            }
            div { class: "menu-separator" }
            input {
                class: "checklist-search",
                placeholder: "Search values\u{2026}",
                value: "{list.search}",
                oninput: move |evt| checklist.write().set_search(evt.value()),
            }
            div { class: "checklist",
                for (item, row_key, text, checked) in rows {
                    label { key: "{row_key}", class: "checklist-item",
                        input {
                            r#type: "checkbox",
                            checked,
                            onchange: move |_| checklist.write().toggle_item(item),
                        }
                        "{text}"
                    }
                }
            }
            div { class: "menu-actions",
                button {
                    class: "toolbar-btn",
                    onclick: {
                        let key = column.key.clone();
                        move |_| {
                            let filter = checklist.peek().to_filter();
                            table.write().set_value_filter(&key, filter);
                            menu_column.set(None);
                        }
                    },
                    "OK"
                }
                button {
                    class: "toolbar-btn",
                    onclick: move |_| menu_column.set(None),
                    "Cancel"
                }
            }
        }
    }
}
