//! Local JSON-document backend for offline use and tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::io::api::{ActionOutcome, FormFields, RowAction, TableData};
use crate::io::write_json_atomic;
use crate::io::backend::{BackendError, GridBackend};
use crate::state::add_form::FieldMetadata;
use crate::state::column::RawColumn;
use crate::state::data_model::{self, Row, Rows};
use crate::state::patterns::{PatternKind, PatternSummary, SavedPattern};
use crate::state::view_state::ViewState;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub table_name: String,
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
    #[serde(default)]
    pub columns: Vec<RawColumn>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileStore {
    #[serde(default)]
    pub forms: BTreeMap<String, FormDefinition>,
    #[serde(default)]
    pub tables: BTreeMap<String, Rows>,
    #[serde(default)]
    pub grid_states: BTreeMap<String, Value>,
    #[serde(default)]
    pub patterns: Vec<SavedPattern>,
    #[serde(default)]
    pub lookups: BTreeMap<String, Vec<String>>,
    #[serde(default = "first_id")]
    pub next_id: i64,
}

fn first_id() -> i64 {
    1
}

pub struct FileBackend {
    path: PathBuf,
    store: Mutex<FileStore>,
}

impl FileBackend {
    /// Opens the document at `path`; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let store = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => FileStore {
                next_id: first_id(),
                ..FileStore::default()
            },
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), "opened file backend");
        Ok(Self {
            path,
            store: Mutex::new(store),
        })
    }

    pub fn create(path: impl Into<PathBuf>, store: FileStore) -> Result<Self, BackendError> {
        let backend = Self {
            path: path.into(),
            store: Mutex::new(store),
        };
        backend.persist(&backend.lock())?;
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> FileStore {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, FileStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, store: &FileStore) -> Result<(), BackendError> {
        write_json_atomic(&self.path, store)
    }

    fn form(store: &FileStore, form_name: &str) -> Result<FormDefinition, BackendError> {
        store
            .forms
            .get(form_name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("form '{form_name}'")))
    }
}

#[async_trait]
impl GridBackend for FileBackend {
    async fn fetch_fields(&self, form_name: &str) -> Result<FormFields, BackendError> {
        let form = Self::form(&self.lock(), form_name)?;
        Ok(FormFields {
            fields: form.fields,
            table_name: form.table_name,
        })
    }

    async fn fetch_table(&self, form_name: &str) -> Result<TableData, BackendError> {
        let store = self.lock();
        let form = Self::form(&store, form_name)?;
        let data = store.tables.get(&form.table_name).cloned().unwrap_or_default();
        let columns = if form.columns.is_empty() {
            infer_columns(&data)
        } else {
            form.columns
        };
        Ok(TableData { columns, data })
    }

    async fn submit_rows(&self, action: RowAction) -> Result<ActionOutcome, BackendError> {
        if action.files().is_some_and(|files| !files.is_empty()) {
            tracing::warn!("file backend does not store uploads; file fields ignored");
        }
        let mut store = self.lock();
        let outcome = match action {
            RowAction::Add {
                form_name,
                mut row_data,
                ..
            } => {
                let form = Self::form(&store, &form_name)?;
                let has_id_column = form.columns.iter().any(|c| c.key() == "id")
                    || store
                        .tables
                        .get(&form.table_name)
                        .and_then(|rows| rows.first())
                        .is_some_and(|row| row.contains_key("id"));
                if has_id_column && row_data.get("id").map_or(true, data_model::is_blank) {
                    row_data.insert("id".to_string(), Value::from(store.next_id));
                    store.next_id += 1;
                }
                store.tables.entry(form.table_name).or_default().push(row_data);
                ActionOutcome {
                    message: Some("Row added".to_string()),
                    deleted_count: None,
                }
            }
            RowAction::Update {
                form_name, row_data, ..
            } => {
                let form = Self::form(&store, &form_name)?;
                let id = row_data
                    .get("id")
                    .cloned()
                    .ok_or_else(|| BackendError::Server("update needs an id".to_string()))?;
                let rows = store.tables.entry(form.table_name).or_default();
                let row = rows
                    .iter_mut()
                    .find(|row| row.get("id").is_some_and(|v| same_id(v, &id)))
                    .ok_or_else(|| BackendError::NotFound(format!("row {id}")))?;
                for (key, value) in row_data {
                    row.insert(key, value);
                }
                ActionOutcome {
                    message: Some("Row updated".to_string()),
                    deleted_count: None,
                }
            }
            RowAction::Delete { form_name, rows } => {
                let form = Self::form(&store, &form_name)?;
                let table = store.tables.entry(form.table_name).or_default();
                let before = table.len();
                table.retain(|existing| !rows.iter().any(|gone| same_row(existing, gone)));
                let deleted = (before - table.len()) as u64;
                ActionOutcome {
                    message: Some(format!("{deleted} row(s) deleted")),
                    deleted_count: Some(deleted),
                }
            }
        };
        self.persist(&store)?;
        Ok(outcome)
    }

    async fn load_grid_state(&self, table_name: &str) -> Result<Option<Value>, BackendError> {
        Ok(self.lock().grid_states.get(table_name).cloned())
    }

    async fn save_grid_state(&self, table_name: &str, state: &ViewState) -> Result<(), BackendError> {
        let mut store = self.lock();
        store
            .grid_states
            .insert(table_name.to_string(), state.to_value());
        self.persist(&store)
    }

    async fn list_patterns(
        &self,
        kind: PatternKind,
        table_name: &str,
    ) -> Result<Vec<PatternSummary>, BackendError> {
        let mut out: Vec<PatternSummary> = self
            .lock()
            .patterns
            .iter()
            .filter(|p| p.kind == kind && p.table_name == table_name)
            .map(|p| PatternSummary {
                id: p.id,
                name: p.name.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(out)
    }

    async fn load_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        id: i64,
    ) -> Result<Value, BackendError> {
        self.lock()
            .patterns
            .iter()
            .find(|p| p.id == id && p.kind == kind && p.table_name == table_name)
            .map(|p| p.data.clone())
            .ok_or_else(|| BackendError::NotFound(format!("{} {id}", kind.as_str())))
    }

    async fn save_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        name: &str,
        data: Value,
        id: Option<i64>,
    ) -> Result<i64, BackendError> {
        let mut store = self.lock();
        let existing = store.patterns.iter_mut().find(|p| {
            p.kind == kind
                && p.table_name == table_name
                && match id {
                    Some(id) => p.id == id,
                    None => p.name == name,
                }
        });
        let saved_id = match existing {
            Some(pattern) => {
                pattern.name = name.to_string();
                pattern.data = data;
                pattern.id
            }
            None => {
                if let Some(id) = id {
                    return Err(BackendError::NotFound(format!("{} {id}", kind.as_str())));
                }
                let new_id = store.next_id;
                store.next_id += 1;
                store.patterns.push(SavedPattern {
                    id: new_id,
                    name: name.to_string(),
                    kind,
                    table_name: table_name.to_string(),
                    data,
                });
                new_id
            }
        };
        self.persist(&store)?;
        Ok(saved_id)
    }

    async fn delete_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        id: i64,
    ) -> Result<(), BackendError> {
        let mut store = self.lock();
        let before = store.patterns.len();
        store
            .patterns
            .retain(|p| !(p.id == id && p.kind == kind && p.table_name == table_name));
        if store.patterns.len() == before {
            return Err(BackendError::NotFound(format!("{} {id}", kind.as_str())));
        }
        self.persist(&store)
    }

    /// Named lookup lists first, then `table.column` distinct values.
    async fn lookup_values(&self, lookup: &str) -> Result<Vec<String>, BackendError> {
        let store = self.lock();
        if let Some(values) = store.lookups.get(lookup) {
            return Ok(values.clone());
        }
        let Some((table, column)) = lookup.split_once('.') else {
            return Err(BackendError::NotFound(format!("lookup '{lookup}'")));
        };
        let rows = store
            .tables
            .get(table)
            .ok_or_else(|| BackendError::NotFound(format!("table '{table}'")))?;
        let mut values: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !data_model::is_blank(v))
            .map(data_model::display_value)
            .collect();
        values.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        values.dedup();
        Ok(values)
    }
}

fn infer_columns(rows: &Rows) -> Vec<RawColumn> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    first
        .iter()
        .map(|(key, value)| {
            let column_type = match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
                Value::Number(_) => "number",
                Value::Bool(_) => "boolean",
                _ => "string",
            };
            RawColumn::code(key, column_type)
        })
        .collect()
}

fn same_id(left: &Value, right: &Value) -> bool {
    left == right || data_model::display_value(left) == data_model::display_value(right)
}

fn same_row(existing: &Row, gone: &Row) -> bool {
    match (existing.get("id"), gone.get("id")) {
        (Some(a), Some(b)) => same_id(a, b),
        _ => existing == gone,
    }
}
