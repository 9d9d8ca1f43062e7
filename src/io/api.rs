//! JSON shapes exchanged with the admin backend.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::io::backend::BackendError;
use crate::state::add_form::FieldMetadata;
use crate::state::column::RawColumn;
use crate::state::data_model::{Row, Rows};
use crate::state::patterns::PatternKind;
use crate::state::table_state::TableEvent;
use crate::state::view_state::ViewState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[default]
    Success,
    Error,
}

/// Envelope every endpoint answers with. Endpoints that omit `status` are
/// treated as successful.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ApiResponse {
    pub fn success(body: Map<String, Value>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            body,
        }
    }

    pub fn into_body(self) -> Result<Map<String, Value>, BackendError> {
        match self.status {
            ResponseStatus::Success => Ok(self.body),
            ResponseStatus::Error => Err(BackendError::Server(
                self.message
                    .unwrap_or_else(|| "Unknown server error".to_string()),
            )),
        }
    }

    pub fn decode<T: for<'de> Deserialize<'de>>(self) -> Result<T, BackendError> {
        let body = self.into_body()?;
        Ok(serde_json::from_value(Value::Object(body))?)
    }

    pub fn into_data(self) -> Result<Value, BackendError> {
        let mut body = self.into_body()?;
        Ok(body.remove("data").unwrap_or(Value::Null))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormFields {
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
    #[serde(default)]
    pub table_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default)]
    pub columns: Vec<RawColumn>,
    #[serde(default)]
    pub data: Rows,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "deletedCount", skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RowAction {
    Add {
        form_name: String,
        row_data: Row,
        #[serde(skip)]
        files: BTreeMap<String, PathBuf>,
    },
    Update {
        form_name: String,
        row_data: Row,
        #[serde(skip)]
        files: BTreeMap<String, PathBuf>,
    },
    Delete {
        form_name: String,
        rows: Vec<Row>,
    },
}

impl RowAction {
    /// The backend write a submitted grid event stands for. Edits send the
    /// original row with the form values on top so keys not on the form,
    /// such as `id`, reach the server.
    pub fn from_event(form_name: &str, event: TableEvent) -> Option<Self> {
        let form_name = form_name.to_string();
        match event {
            TableEvent::AddSubmit(submission) => Some(Self::Add {
                form_name,
                row_data: submission.values,
                files: submission.files,
            }),
            TableEvent::EditSubmit {
                original,
                submission,
            } => {
                let mut row_data = original;
                row_data.extend(submission.values);
                Some(Self::Update {
                    form_name,
                    row_data,
                    files: submission.files,
                })
            }
            TableEvent::Delete(rows) => Some(Self::Delete { form_name, rows }),
            TableEvent::Add | TableEvent::Edit(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn files(&self) -> Option<&BTreeMap<String, PathBuf>> {
        match self {
            Self::Add { files, .. } | Self::Update { files, .. } => Some(files),
            Self::Delete { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActionRequest {
    GetGridState {
        table_name: String,
    },
    SaveGridState {
        table_name: String,
        data: ViewState,
    },
    GetPatterns {
        #[serde(rename = "type")]
        kind: PatternKind,
        table_name: String,
    },
    GetPattern {
        #[serde(rename = "type")]
        kind: PatternKind,
        table_name: String,
        id: i64,
    },
    SavePattern {
        #[serde(rename = "type")]
        kind: PatternKind,
        table_name: String,
        name: String,
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
    },
    DeletePattern {
        #[serde(rename = "type")]
        kind: PatternKind,
        table_name: String,
        id: i64,
    },
    GetLookupData {
        lookup_sql: String,
    },
}

/// Pattern ids arrive as numbers or numeric strings depending on the driver.
pub fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
