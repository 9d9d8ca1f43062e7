//! Loading and debounced saving of per-table view state.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::io::backend::{BackendError, GridBackend};
use crate::state::add_form::FieldMetadata;
use crate::state::table_state::TableState;
use crate::state::view_state::ViewState;

pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(2500);

/// Reads the persisted view state of a table. Never fails: anything that
/// goes wrong yields the default state so the grid can render.
pub async fn load_view_state(backend: &dyn GridBackend, table_name: &str) -> ViewState {
    match backend.load_grid_state(table_name).await {
        Ok(Some(value)) => ViewState::from_value(&value),
        Ok(None) => ViewState::default(),
        Err(err) => {
            tracing::warn!(table = table_name, %err, "could not load grid state");
            ViewState::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGrid {
    pub table: TableState,
    pub fields: Vec<FieldMetadata>,
}

/// Only the row fetch is fatal. `view` replaces the stored state, as when a
/// session snapshot is restored.
pub async fn load_grid(
    backend: &dyn GridBackend,
    form_name: &str,
    view: Option<ViewState>,
) -> Result<LoadedGrid, BackendError> {
    let (fields, table_name) = match backend.fetch_fields(form_name).await {
        Ok(form) if !form.table_name.trim().is_empty() => (form.fields, form.table_name),
        Ok(form) => (form.fields, form_name.to_string()),
        Err(err) => {
            tracing::warn!(form = form_name, %err, "could not load form fields");
            (Vec::new(), form_name.to_string())
        }
    };
    let data = backend.fetch_table(form_name).await?;
    let view = match view {
        Some(view) => view,
        None => load_view_state(backend, &table_name).await,
    };

    let mut table = TableState::new(table_name, form_name);
    table.hydrate(&view, data.columns, data.data);
    tracing::debug!(form = form_name, rows = table.data().len(), "grid loaded");
    Ok(LoadedGrid { table, fields })
}

#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn GridBackend>,
    delay: Duration,
}

impl StateStore {
    pub fn new(backend: Arc<dyn GridBackend>, delay: Duration) -> Self {
        Self { backend, delay }
    }

    pub async fn load(&self, table_name: &str) -> ViewState {
        load_view_state(self.backend.as_ref(), table_name).await
    }

    pub fn saver(&self, table_name: &str) -> AutoSaver {
        AutoSaver::new(self.backend.clone(), table_name, self.delay)
    }
}

#[derive(Debug, Default)]
struct SaverState {
    generation: u64,
    unsaved: bool,
    latest: Option<ViewState>,
    last_error: Option<String>,
    writes: u64,
}

/// Coalesces bursts of view-state changes into one write per quiet window.
#[derive(Clone)]
pub struct AutoSaver {
    backend: Arc<dyn GridBackend>,
    table_name: Arc<str>,
    delay: Duration,
    state: Arc<Mutex<SaverState>>,
}

impl AutoSaver {
    pub fn new(backend: Arc<dyn GridBackend>, table_name: &str, delay: Duration) -> Self {
        Self {
            backend,
            table_name: Arc::from(table_name),
            delay,
            state: Arc::new(Mutex::new(SaverState::default())),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn lock(&self) -> MutexGuard<'_, SaverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self, view: &ViewState) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.unsaved = true;
        state.latest = Some(view.clone());
        state.generation
    }

    /// Returns the delayed write for the caller to spawn.
    pub fn schedule(&self, view: ViewState) -> impl Future<Output = ()> + Send + 'static {
        let generation = self.bump(&view);
        let saver = self.clone();
        async move {
            tokio::time::sleep(saver.delay).await;
            if saver.lock().generation != generation {
                return;
            }
            // Failures are recorded in the saver state.
            let _ = saver.write(generation, &view).await;
        }
    }

    /// Writes immediately and cancels any pending scheduled write.
    pub async fn flush(&self, view: &ViewState) -> Result<(), BackendError> {
        let generation = self.bump(view);
        self.write(generation, view).await
    }

    pub async fn flush_pending(&self) -> Result<(), BackendError> {
        let pending = {
            let state = self.lock();
            state.latest.clone().filter(|_| state.unsaved)
        };
        match pending {
            Some(view) => self.flush(&view).await,
            None => Ok(()),
        }
    }

    async fn write(&self, generation: u64, view: &ViewState) -> Result<(), BackendError> {
        let result = self.backend.save_grid_state(&self.table_name, view).await;
        let mut state = self.lock();
        state.writes += 1;
        // Only the newest write decides whether the state is saved.
        let current = state.generation == generation;
        match &result {
            Ok(()) => {
                if current {
                    state.unsaved = false;
                    state.last_error = None;
                }
                tracing::debug!(table = %self.table_name, "grid state saved");
            }
            Err(err) => {
                if current {
                    state.unsaved = true;
                    state.last_error = Some(err.to_string());
                }
                tracing::warn!(table = %self.table_name, %err, "grid state save failed");
            }
        }
        result
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.lock().unsaved
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }
}
