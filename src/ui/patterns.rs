use dioxus::prelude::*;

use crate::io::pattern_store::{PatternManager, SaveOutcome};
use crate::state::patterns::{PatternData, PatternKind, SessionSnapshot};
use crate::ui::actions::{self, GridHandle};
use crate::ui::{LiveViews, PendingViews, Services};

/// Patterns for whole-window sessions are stored under this table name.
pub const SESSION_SCOPE: &str = "_session";

/// Searchable list of saved patterns of one kind, with apply, save and
/// delete.
#[component]
pub fn PatternBar(grid: GridHandle, kind: PatternKind) -> Element {
    let services = use_context::<Services>();
    let table_name = grid.table.read().table_name().to_string();
    let manager = use_signal({
        let backend = services.backend.clone();
        move || PatternManager::new(backend, kind, &table_name)
    });
    let query = use_signal(String::new);
    let selected = use_signal::<Option<i64>>(|| None);
    let new_name = use_signal(String::new);
    let status = use_signal::<Option<String>>(|| None);

    use_hook(move || {
        let mut manager = manager;
        spawn(async move {
            let mut loaded = manager.peek().clone();
            loaded.refresh().await;
            manager.set(loaded);
        });
    });

    let apply = move |_: MouseEvent| {
        let Some(id) = *selected.peek() else {
            return;
        };
        let mut error_message = grid.error_message;
        let mut table = grid.table;
        let loaded = manager.peek().clone();
        spawn(async move {
            match loaded.load(id).await {
                Ok(data) => {
                    data.apply_to(&mut table.write());
                    match kind {
                        PatternKind::Layout => grid.save_now(),
                        _ => grid.view_changed(),
                    }
                    error_message.set(None);
                }
                Err(err) => error_message.set(Some(format!("Could not load {}: {err}", kind.title()))),
            }
        });
    };

    rsx! {
        PatternControls { kind, manager, query, selected, new_name, status, on_apply: apply, grid: Some(grid), session: None }
    }
}

/// Saved window sessions: open tabs, the active tab and each grid's view.
#[component]
pub fn SessionBar(
    forms: Vec<String>,
    open_tabs: Signal<Vec<String>>,
    active_tab: Signal<Option<String>>,
    epoch: Signal<u64>,
) -> Element {
    let services = use_context::<Services>();
    let pending = use_context::<PendingViews>();
    let manager = use_signal({
        let backend = services.backend.clone();
        move || PatternManager::new(backend, PatternKind::Session, SESSION_SCOPE)
    });
    let query = use_signal(String::new);
    let selected = use_signal::<Option<i64>>(|| None);
    let new_name = use_signal(String::new);
    let status = use_signal::<Option<String>>(|| None);

    use_hook(move || {
        let mut manager = manager;
        spawn(async move {
            let mut loaded = manager.peek().clone();
            loaded.refresh().await;
            manager.set(loaded);
        });
    });

    let apply = move |_: MouseEvent| {
        let Some(id) = *selected.peek() else {
            return;
        };
        let loaded = manager.peek().clone();
        let forms = forms.clone();
        let PendingViews(mut pending_views) = pending;
        let mut open_tabs = open_tabs;
        let mut active_tab = active_tab;
        let mut epoch = epoch;
        let mut status = status;
        spawn(async move {
            let snapshot = match loaded.load_session(id).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(id, %err, "session snapshot could not be loaded");
                    status.set(Some(format!("Could not load session: {err}")));
                    return;
                }
            };
            let tabs: Vec<String> = snapshot
                .open_tabs
                .iter()
                .filter(|tab| forms.contains(tab))
                .cloned()
                .collect();
            pending_views.set(snapshot.grids.clone());
            active_tab.set(snapshot.active_tab.clone().or_else(|| tabs.first().cloned()));
            open_tabs.set(tabs);
            epoch += 1;
            status.set(None);
        });
    };

    rsx! {
        PatternControls {
            kind: PatternKind::Session,
            manager,
            query,
            selected,
            new_name,
            status,
            on_apply: apply,
            grid: None,
            session: Some(SessionTabs { open_tabs, active_tab }),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
pub struct SessionTabs {
    open_tabs: Signal<Vec<String>>,
    active_tab: Signal<Option<String>>,
}

impl SessionTabs {
    fn capture(&self) -> PatternData {
        let open_tabs = self.open_tabs.peek().clone();
        let grids = try_consume_context::<LiveViews>()
            .map(|LiveViews(live)| {
                live.peek()
                    .iter()
                    .filter(|(form, _)| open_tabs.contains(form))
                    .map(|(form, view)| (form.clone(), view.clone()))
                    .collect()
            })
            .unwrap_or_default();
        PatternData::Session(SessionSnapshot {
            active_tab: self.active_tab.peek().clone(),
            open_tabs,
            grids,
        })
    }
}

#[component]
fn PatternControls(
    kind: PatternKind,
    manager: Signal<PatternManager>,
    query: Signal<String>,
    selected: Signal<Option<i64>>,
    new_name: Signal<String>,
    status: Signal<Option<String>>,
    on_apply: EventHandler<MouseEvent>,
    #[props(!optional)] grid: Option<GridHandle>,
    #[props(!optional)] session: Option<SessionTabs>,
) -> Element {
    let mut query = query;
    let mut selected = selected;
    let mut new_name = new_name;
    let mut status = status;
    let matching: Vec<(i64, String)> = manager
        .read()
        .matching(&query.read())
        .into_iter()
        .map(|p| (p.id, p.name.clone()))
        .collect();
    let prefix = kind.as_str();
    let selected_value = (*selected.read()).map(|id| id.to_string()).unwrap_or_default();

    let save = move |_: MouseEvent| {
        let name = new_name.peek().trim().to_string();
        let data = match (grid, session) {
            (Some(grid), _) => PatternData::capture(kind, &grid.table.peek()),
            (None, Some(tabs)) => Some(tabs.capture()),
            (None, None) => None,
        };
        let Some(data) = data else {
            return;
        };
        let mut manager = manager;
        spawn(async move {
            let mut working = manager.peek().clone();
            let message = match working.save(&name, &data).await {
                Ok(SaveOutcome::Saved { .. }) => format!("Saved \"{name}\""),
                Ok(SaveOutcome::EmptyName) => "Enter a name first".to_string(),
                Ok(SaveOutcome::NameExists { id }) => {
                    let question = format!("\"{name}\" already exists. Overwrite it?");
                    if !actions::confirm(kind.title(), &question).await {
                        return;
                    }
                    match working.save_overwrite(id, &name, &data).await {
                        Ok(_) => format!("Overwrote \"{name}\""),
                        Err(err) => format!("Save failed: {err}"),
                    }
                }
                Err(err) => format!("Save failed: {err}"),
            };
            manager.set(working);
            new_name.set(String::new());
            status.set(Some(message));
        });
    };

    let delete = move |_: MouseEvent| {
        let Some(id) = *selected.peek() else {
            return;
        };
        let mut manager = manager;
        spawn(async move {
            let mut working = manager.peek().clone();
            let name = working
                .patterns()
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            if !actions::confirm(kind.title(), &format!("Delete \"{name}\"?")).await {
                return;
            }
            let message = match working.delete(id).await {
                Ok(()) => format!("Deleted \"{name}\""),
                Err(err) => format!("Delete failed: {err}"),
            };
            manager.set(working);
            selected.set(None);
            status.set(Some(message));
        });
    };

    rsx! {
        div { class: "pattern-bar", id: "pattern-bar-{prefix}",
            span { class: "toolbar-label", "{kind.title()}" }
            input {
                class: "toolbar-input toolbar-input-sm",
                id: "pattern-search-{prefix}",
                placeholder: "Search\u{2026}",
                value: "{query}",
                oninput: move |evt| query.set(evt.value()),
            }
            select {
                class: "toolbar-select",
                id: "pattern-select-{prefix}",
                value: "{selected_value}",
                onchange: move |evt| selected.set(evt.value().parse().ok()),
                option { value: "", "(none)" }
                for (id, name) in matching {
                    option { key: "{id}", value: "{id}", "{name}" }
                }
            }
            button {
                class: "toolbar-btn",
                id: "pattern-apply-{prefix}",
                disabled: selected.read().is_none(),
                onclick: move |evt| on_apply.call(evt),
                "Apply"
            }
            button {
                class: "toolbar-btn toolbar-btn-danger",
                id: "pattern-delete-{prefix}",
                disabled: selected.read().is_none(),
                onclick: delete,
                "Delete"
            }
            input {
                class: "toolbar-input toolbar-input-sm",
                id: "pattern-name-{prefix}",
                placeholder: "Name",
                value: "{new_name}",
                oninput: move |evt| new_name.set(evt.value()),
            }
            button {
                class: "toolbar-btn",
                id: "pattern-save-{prefix}",
                onclick: save,
                "Save"
            }
            if let Some(message) = status.read().as_ref() {
                span { class: "pattern-status", "{message}" }
            }
        }
    }
}
