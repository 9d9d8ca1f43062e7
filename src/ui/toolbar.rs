use dioxus::prelude::*;

use crate::ui::actions::{self, GridHandle};
use crate::ui::Services;

#[component]
pub fn ActionBar(grid: GridHandle) -> Element {
    let services = use_context::<Services>();
    let mut table = grid.table;
    let mut error_message = grid.error_message;
    let mut status_message = grid.status_message;
    let mut columns_open = use_signal(|| false);

    let snapshot = table.read();
    let selected = snapshot.selected_positions().len();
    let row_count = snapshot.row_count();
    let total = snapshot.data().len();
    let has_filters = snapshot.has_active_filters();
    let columns: Vec<(String, String, bool)> = snapshot
        .ordered_columns()
        .into_iter()
        .map(|c| (c.key, c.header, c.visible))
        .collect();
    drop(snapshot);

    let unsaved = *grid.unsaved.read();
    let status = status_message.read().clone();
    let error = error_message.read().clone();
    let menu_open = *columns_open.read();
    let count_label = if row_count == total {
        format!("{total} rows")
    } else {
        format!("{row_count} of {total} rows")
    };

    rsx! {
        div { class: "toolbar",
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-add-row",
                    onclick: {
                        let services = services.clone();
                        move |_| {
                            let event = table.peek().request_add();
                            grid.dispatch(&services, event);
                        }
                    },
                    "\u{2795} Add"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-edit-row",
                    disabled: selected != 1,
                    onclick: {
                        let services = services.clone();
                        move |_| {
                            let event = table.peek().request_edit();
                            match event {
                                Some(event) => grid.dispatch(&services, event),
                                None => error_message.set(Some("Select exactly one row to edit".to_string())),
                            }
                        }
                    },
                    "\u{270E} Edit"
                }
                button {
                    class: "toolbar-btn toolbar-btn-danger",
                    id: "btn-delete-row",
                    disabled: selected == 0,
                    onclick: {
                        let services = services.clone();
                        move |_| {
                            let Some(event) = table.peek().request_delete() else {
                                error_message.set(Some("Select rows to delete".to_string()));
                                return;
                            };
                            let services = services.clone();
                            spawn(async move {
                                let question = format!("Delete {selected} selected row(s)?");
                                if actions::confirm("Delete rows", &question).await {
                                    grid.dispatch(&services, event);
                                }
                            });
                        }
                    },
                    "\u{1F5D1} Delete"
                }
            }
            div { class: "toolbar-separator" }

            div { class: "toolbar-group column-picker",
                button {
                    class: "toolbar-btn",
                    id: "btn-columns",
                    onclick: move |_| columns_open.set(!menu_open),
                    "Columns"
                }
                if menu_open {
                    div { class: "column-picker-menu", id: "column-picker",
                        for (key, header, visible) in columns {
                            label { key: "{key}", class: "checklist-item",
                                input {
                                    r#type: "checkbox",
                                    checked: visible,
                                    onchange: {
                                        let key = key.clone();
                                        move |_| {
                                            if table.write().toggle_column_visibility(&key) {
                                                grid.save_now();
                                            }
                                        }
                                    },
                                }
                                "{header}"
                            }
                        }
                        button {
                            class: "toolbar-btn",
                            id: "btn-reset-columns",
                            onclick: move |_| {
                                table.write().reset_visibility();
                                grid.save_now();
                            },
                            "Show all"
                        }
                    }
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-clear-filters",
                    disabled: !has_filters,
                    onclick: move |_| {
                        table.write().clear_filters();
                        grid.view_changed();
                    },
                    "\u{2715} Clear filters"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-reload",
                    onclick: {
                        let services = services.clone();
                        move |_| grid.reload(&services)
                    },
                    "\u{21BB} Reload"
                }
            }

            div { class: "toolbar-info",
                span { class: "toolbar-label", id: "row-count", "{count_label}" }
                if unsaved {
                    span { class: "unsaved-indicator", id: "unsaved-indicator", "\u{25CF} Unsaved changes" }
                }
                if let Some(message) = status {
                    span {
                        class: "save-success",
                        onclick: move |_| status_message.set(None),
                        "{message}"
                    }
                }
                if let Some(err) = error {
                    span {
                        class: "error-message",
                        onclick: move |_| error_message.set(None),
                        "{err}"
                    }
                }
            }
        }
    }
}
