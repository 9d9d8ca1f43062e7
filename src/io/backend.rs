use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::io::api::{ActionOutcome, FormFields, RowAction, TableData};
use crate::state::patterns::{PatternKind, PatternSummary};
use crate::state::view_state::ViewState;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Server(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Everything the grid and its host page need from the server side.
#[async_trait]
pub trait GridBackend: Send + Sync {
    /// Field metadata and the backing table name of a form.
    async fn fetch_fields(&self, form_name: &str) -> Result<FormFields, BackendError>;

    async fn fetch_table(&self, form_name: &str) -> Result<TableData, BackendError>;

    async fn submit_rows(&self, action: RowAction) -> Result<ActionOutcome, BackendError>;

    /// The stored view-state blob, `None` when nothing was saved yet.
    async fn load_grid_state(&self, table_name: &str) -> Result<Option<Value>, BackendError>;

    async fn save_grid_state(&self, table_name: &str, state: &ViewState) -> Result<(), BackendError>;

    async fn list_patterns(
        &self,
        kind: PatternKind,
        table_name: &str,
    ) -> Result<Vec<PatternSummary>, BackendError>;

    async fn load_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        id: i64,
    ) -> Result<Value, BackendError>;

    /// Creates a pattern, or overwrites `id` when given. Returns the id.
    async fn save_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        name: &str,
        data: Value,
        id: Option<i64>,
    ) -> Result<i64, BackendError>;

    async fn delete_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        id: i64,
    ) -> Result<(), BackendError>;

    async fn lookup_values(&self, lookup: &str) -> Result<Vec<String>, BackendError>;
}
