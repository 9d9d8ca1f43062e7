use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use dioxus::prelude::*;

use crate::io::api::RowAction;
use crate::io::state_store::{AutoSaver, LoadedGrid};
use crate::state::add_form::{FieldMetadata, FormErrors, LookupCache, RowForm};
use crate::state::table_state::{TableEvent, TableState};
use crate::ui::{LiveViews, Services};

/// Signals of one mounted grid. Copy, so event handlers can capture it.
#[derive(Clone, Copy, PartialEq)]
pub struct GridHandle {
    pub form_name: Signal<String>,
    pub table: Signal<TableState>,
    pub fields: Signal<Vec<FieldMetadata>>,
    pub saver: Signal<Option<AutoSaver>>,
    pub unsaved: Signal<bool>,
    pub error_message: Signal<Option<String>>,
    pub status_message: Signal<Option<String>>,
    pub form: Signal<Option<RowForm>>,
    pub form_errors: Signal<FormErrors>,
    pub lookups: Signal<LookupCache>,
    pub menu_column: Signal<Option<String>>,
    search_generation: Signal<u64>,
    scope: ScopeId,
}

impl GridHandle {
    /// Call from a hook of the component that owns the grid.
    pub fn new(form_name: &str) -> Self {
        Self {
            form_name: Signal::new(form_name.to_string()),
            table: Signal::new(TableState::new(form_name, form_name)),
            fields: Signal::new(Vec::new()),
            saver: Signal::new(None),
            unsaved: Signal::new(false),
            error_message: Signal::new(None),
            status_message: Signal::new(None),
            form: Signal::new(None),
            form_errors: Signal::new(FormErrors::default()),
            lookups: Signal::new(LookupCache::default()),
            menu_column: Signal::new(None),
            search_generation: Signal::new(0),
            scope: current_scope_id().unwrap_or(ScopeId::ROOT),
        }
    }

    /// Runs `task` for as long as the grid is mounted. Popovers and the row
    /// dialog close before their work finishes, so their tasks live here.
    pub fn spawn(self, task: impl Future<Output = ()> + 'static) {
        self.scope.in_runtime(|| {
            spawn(task);
        });
    }

    pub fn install(mut self, services: &Services, loaded: LoadedGrid) {
        let saver = services.store.saver(loaded.table.table_name());
        self.table.set(loaded.table);
        self.fields.set(loaded.fields);
        self.saver.set(Some(saver));
        self.publish_view();
    }

    fn publish_view(self) {
        let view = self.table.peek().view_state();
        if let Some(LiveViews(mut live)) = try_consume_context::<LiveViews>() {
            let form_name = self.form_name.peek().clone();
            live.write().insert(form_name, view);
        }
    }

    /// Debounced save after a sort, filter, resize or reorder.
    pub fn view_changed(self) {
        self.publish_view();
        let Some(saver) = self.saver.peek().clone() else {
            return;
        };
        let view = self.table.peek().view_state();
        let unsaved = self.unsaved;
        set_if_alive(unsaved, true);
        // Outlives the grid: closing a tab must not drop the write.
        spawn_forever(async move {
            saver.schedule(view).await;
            set_if_alive(unsaved, saver.has_unsaved_changes());
        });
    }

    /// Commits an active resize or reorder when the pointer is released,
    /// cancelled or leaves the grid.
    pub fn end_drag(self) {
        let mut table = self.table;
        if !table.peek().is_resizing() && !table.peek().is_reordering() {
            return;
        }
        let committed = table.write().finish_drag();
        if committed {
            self.view_changed();
        }
    }

    /// Immediate save for visibility changes, layout application and
    /// explicit actions.
    pub fn save_now(self) {
        self.publish_view();
        let Some(saver) = self.saver.peek().clone() else {
            return;
        };
        let view = self.table.peek().view_state();
        let unsaved = self.unsaved;
        let error_message = self.error_message;
        spawn_forever(async move {
            let result = saver.flush(&view).await;
            set_if_alive(unsaved, saver.has_unsaved_changes());
            if let Err(err) = result {
                set_if_alive(error_message, Some(format!("Could not save grid state: {err}")));
            }
        });
    }

    /// Writes a still-pending debounced save when the grid unmounts.
    pub fn flush_on_unmount(self) {
        let saver = match self.saver.try_peek() {
            Ok(saver) => (*saver).clone(),
            Err(_) => None,
        };
        if let Some(saver) = saver {
            if saver.has_unsaved_changes() {
                spawn_forever(async move {
                    // Failures are logged by the saver.
                    let _ = saver.flush_pending().await;
                });
            }
        }
    }

    /// Stores the typed value now and filters once typing pauses.
    pub fn search_input(self, key: String, value: String, delay: Duration) {
        let mut table = self.table;
        let mut generation_signal = self.search_generation;
        table.write().set_search_value(&key, value);
        let generation = *generation_signal.peek() + 1;
        generation_signal.set(generation);
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            if *generation_signal.peek() != generation {
                return;
            }
            table.write().apply_filters();
            self.view_changed();
        });
    }

    /// Host-side handling of the grid's events.
    pub fn dispatch(self, services: &Services, event: TableEvent) {
        match event {
            TableEvent::Add => {
                let fields = self.fields.peek().clone();
                self.open_form(services, RowForm::new(fields));
            }
            TableEvent::Edit(row) => {
                let fields = self.fields.peek().clone();
                self.open_form(services, RowForm::for_edit(fields, &row));
            }
            event => {
                let form_name = self.form_name.peek().clone();
                let Some(action) = RowAction::from_event(&form_name, event) else {
                    return;
                };
                let backend = services.backend.clone();
                let mut form = self.form;
                let mut status_message = self.status_message;
                let mut error_message = self.error_message;
                let mut table = self.table;
                self.spawn(async move {
                    let outcome = match backend.submit_rows(action).await {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            tracing::warn!(form = %form_name, %err, "row action failed");
                            error_message.set(Some(err.to_string()));
                            return;
                        }
                    };
                    form.set(None);
                    error_message.set(None);
                    status_message.set(outcome.message);
                    match backend.fetch_table(&form_name).await {
                        Ok(data) => table.write().set_data(data.columns, data.data),
                        Err(err) => error_message.set(Some(err.to_string())),
                    }
                });
            }
        }
    }

    /// Shows the row dialog and fetches lookup lists not cached yet.
    pub fn open_form(self, services: &Services, row_form: RowForm) {
        let mut form = self.form;
        let mut form_errors = self.form_errors;
        let missing = self.lookups.peek().missing(&row_form.fields);
        form_errors.set(FormErrors::default());
        form.set(Some(row_form));

        for lookup in missing {
            let backend = services.backend.clone();
            let mut lookups = self.lookups;
            self.spawn(async move {
                match backend.lookup_values(&lookup).await {
                    Ok(values) => lookups.write().insert(lookup, values),
                    Err(err) => {
                        tracing::warn!(%lookup, %err, "lookup fetch failed");
                        lookups.write().insert(lookup, Vec::new());
                    }
                }
            });
        }
    }

    pub fn submit_form(self, services: &Services) {
        let Some(row_form) = self.form.peek().clone() else {
            return;
        };
        let mut form_errors = self.form_errors;
        let result = self.table.peek().submit_form(&row_form);
        match result {
            Ok(event) => {
                form_errors.set(FormErrors::default());
                self.dispatch(services, event);
            }
            Err(errors) => form_errors.set(errors),
        }
    }

    pub fn reload(self, services: &Services) {
        let backend = services.backend.clone();
        let form_name = self.form_name.peek().clone();
        let mut table = self.table;
        let mut error_message = self.error_message;
        self.spawn(async move {
            match backend.fetch_table(&form_name).await {
                Ok(data) => table.write().set_data(data.columns, data.data),
                Err(err) => error_message.set(Some(err.to_string())),
            }
        });
    }
}

/// Tasks that outlive the grid may find its signals already dropped.
fn set_if_alive<T: 'static>(mut signal: Signal<T>, value: T) {
    if let Ok(mut slot) = signal.try_write() {
        *slot = value;
    }
}

pub async fn confirm(title: &str, description: &str) -> bool {
    rfd::AsyncMessageDialog::new()
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::YesNo)
        .show()
        .await
        == rfd::MessageDialogResult::Yes
}

pub async fn pick_file() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}
