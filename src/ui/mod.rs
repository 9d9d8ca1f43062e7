use std::collections::BTreeMap;
use std::sync::Arc;

use dioxus::prelude::*;

use crate::config::AppConfig;
use crate::io::backend::GridBackend;
use crate::io::state_store::StateStore;
use crate::state::view_state::ViewState;

pub mod actions;
pub mod add_modal;
pub mod app;
pub mod column_menu;
pub mod grid;
pub mod patterns;
pub mod table;
pub mod toolbar;

/// Backend and configuration shared by every grid of the window.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<dyn GridBackend>,
    pub config: AppConfig,
    pub store: StateStore,
}

impl Services {
    pub fn new(backend: Arc<dyn GridBackend>, config: AppConfig) -> Self {
        let store = StateStore::new(backend.clone(), config.save_debounce());
        Self {
            backend,
            config,
            store,
        }
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend) && self.config == other.config
    }
}

/// Current view state of every mounted grid, keyed by form name.
#[derive(Clone, Copy, PartialEq)]
pub struct LiveViews(pub Signal<BTreeMap<String, ViewState>>);

/// View states a restored session hands to grids as they mount.
#[derive(Clone, Copy, PartialEq)]
pub struct PendingViews(pub Signal<BTreeMap<String, ViewState>>);

pub(crate) fn sanitize_id(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
