use std::path::PathBuf;

use dioxus::prelude::*;

use crate::state::add_form::{ComboKey, Combobox, FieldMetadata, FieldType, FormMode};
use crate::ui::actions::{self, GridHandle};
use crate::ui::{sanitize_id, Services};

/// Add/edit dialog built from the form's field metadata.
#[component]
pub fn AddModal(grid: GridHandle) -> Element {
    let services = use_context::<Services>();
    let mut form = grid.form;
    let Some(row_form) = form.read().clone() else {
        return rsx! {};
    };
    let errors = grid.form_errors.read().clone();
    let lookups = grid.lookups.read().clone();
    let title = match row_form.mode {
        FormMode::Add => "Add row",
        FormMode::Edit => "Edit row",
    };

    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal", id: "row-modal",
                h3 { class: "modal-title", "{title}" }
                if row_form.fields.is_empty() {
                    p { class: "empty-message", "This form has no fields." }
                }
                if !errors.0.is_empty() {
                    div { class: "form-errors", id: "form-errors",
                        for error in errors.0.iter() {
                            p { "{error}" }
                        }
                    }
                }
                for field in row_form.fields.iter() {
                    FieldInput {
                        key: "{field.field_name}",
                        grid,
                        field: field.clone(),
                        text: row_form.text(&field.field_name).to_string(),
                        file: row_form.file(&field.field_name).cloned(),
                        error: errors.for_field(&field.field_name).map(ToString::to_string),
                        options: field
                            .lookup_sql
                            .as_deref()
                            .and_then(|lookup| lookups.get(lookup))
                            .map(<[String]>::to_vec)
                            .unwrap_or_default(),
                    }
                }
                div { class: "modal-actions",
                    button {
                        class: "toolbar-btn toolbar-btn-primary",
                        id: "btn-submit-row",
                        onclick: move |_| grid.submit_form(&services),
                        "Save"
                    }
                    button {
                        class: "toolbar-btn",
                        id: "btn-cancel-row",
                        onclick: move |_| form.set(None),
                        "Cancel"
                    }
                }
            }
        }
    }
}

#[component]
fn FieldInput(
    grid: GridHandle,
    field: FieldMetadata,
    text: String,
    #[props(!optional)] file: Option<PathBuf>,
    #[props(!optional)] error: Option<String>,
    options: Vec<String>,
) -> Element {
    let mut form = grid.form;
    let input_id = format!("field-{}", sanitize_id(&field.field_name));
    let class = if error.is_some() {
        "form-field has-error"
    } else {
        "form-field"
    };

    let control = match field.field_type {
        FieldType::Combobox => rsx! {
            ComboField {
                grid,
                field_name: field.field_name.clone(),
                input_id: input_id.clone(),
                text: text.clone(),
                options,
            }
        },
        FieldType::File => {
            let name = field.field_name.clone();
            let picked = file
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "No file chosen".to_string());
            rsx! {
                div { class: "file-field",
                    button {
                        class: "toolbar-btn",
                        id: "{input_id}",
                        onclick: move |_| {
                            let name = name.clone();
                            spawn(async move {
                                if let Some(path) = actions::pick_file().await {
                                    form.with_mut(|f| {
                                        if let Some(f) = f {
                                            f.set_file(&name, Some(path));
                                        }
                                    });
                                }
                            });
                        },
                        "Choose file\u{2026}"
                    }
                    span { class: "file-name", "{picked}" }
                }
            }
        }
        other => {
            let name = field.field_name.clone();
            rsx! {
                input {
                    class: "form-input",
                    id: "{input_id}",
                    r#type: other.input_type(),
                    value: "{text}",
                    oninput: move |evt| {
                        let value = evt.value();
                        form.with_mut(|f| {
                            if let Some(f) = f {
                                f.set_text(&name, value);
                            }
                        });
                    }
                }
            }
        }
    };

    rsx! {
        div { class: "{class}",
            label { r#for: "{input_id}",
                "{field.label()}"
                if field.mandatory {
                    span { class: "mandatory", " *" }
                }
            }
            {control}
            if let Some(error) = error {
                span { class: "field-error", "{error}" }
            }
        }
    }
}

/// Text input with live-filtered, highlighted suggestions.
#[component]
fn ComboField(
    grid: GridHandle,
    field_name: String,
    input_id: String,
    text: String,
    options: Vec<String>,
) -> Element {
    let mut form = grid.form;
    let mut combo = use_signal(|| {
        let mut combo = Combobox::new(Vec::new());
        combo.select(text.clone());
        combo
    });
    let view = combo.read().clone().with_options(options.clone());
    let suggestions = if view.open { view.suggestions() } else { Vec::new() };
    let highlighted = view.highlighted;

    let set_value = move |value: String, name: &str| {
        form.with_mut(|f| {
            if let Some(f) = f {
                f.set_text(name, value);
            }
        });
    };

    rsx! {
        div { class: "combobox",
            input {
                class: "form-input",
                id: "{input_id}",
                autocomplete: "off",
                value: "{view.input}",
                oninput: {
                    let name = field_name.clone();
                    let options = options.clone();
                    let mut set_value = set_value;
                    move |evt: Event<FormData>| {
                        let value = evt.value();
                        combo.with_mut(|c| {
                            *c = std::mem::take(c).with_options(options.clone());
                            c.type_text(value.clone());
                        });
                        set_value(value, &name);
                    }
                },
                onkeydown: {
                    let name = field_name.clone();
                    let options = options.clone();
                    let mut set_value = set_value;
                    move |evt: KeyboardEvent| {
                        let key = match evt.key() {
                            Key::ArrowDown => ComboKey::ArrowDown,
                            Key::ArrowUp => ComboKey::ArrowUp,
                            Key::Enter => ComboKey::Enter,
                            Key::Escape => ComboKey::Escape,
                            _ => return,
                        };
                        evt.prevent_default();
                        let picked = combo.with_mut(|c| {
                            *c = std::mem::take(c).with_options(options.clone());
                            c.key(key)
                        });
                        if let Some(value) = picked {
                            set_value(value, &name);
                        }
                    }
                },
                onfocusout: move |_| combo.with_mut(|c| c.open = false),
            }
            if !suggestions.is_empty() {
                ul { class: "combobox-list",
                    for (index, suggestion) in suggestions.into_iter().enumerate() {
                        li {
                            key: "{suggestion.value}",
                            class: option_class(highlighted == Some(index)),
                            onpointerdown: {
                                let name = field_name.clone();
                                let value = suggestion.value.clone();
                                let mut set_value = set_value;
                                move |evt: PointerEvent| {
                                    evt.prevent_default();
                                    combo.with_mut(|c| c.select(value.clone()));
                                    set_value(value.clone(), &name);
                                }
                            },
                            "{suggestion.before}"
                            mark { "{suggestion.matched}" }
                            "{suggestion.after}"
                        }
                    }
                }
            }
        }
    }
}

fn option_class(highlighted: bool) -> &'static str {
    if highlighted {
        "combobox-option highlighted"
    } else {
        "combobox-option"
    }
}
