use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::io::api::{self, ActionOutcome, ActionRequest, ApiResponse, FormFields, RowAction, TableData};
use crate::io::backend::{BackendError, GridBackend};
use crate::state::data_model::display_value;
use crate::state::patterns::{PatternKind, PatternSummary};
use crate::state::view_state::ViewState;

/// Talks to the PHP endpoints over HTTP.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    fields_endpoint: String,
    data_endpoint: String,
    action_endpoint: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, config: &AppConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            fields_endpoint: config.fields_endpoint.clone(),
            data_endpoint: config.data_endpoint.clone(),
            action_endpoint: config.action_endpoint.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn read(response: reqwest::Response) -> Result<ApiResponse, BackendError> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, url = %response.url(), "unexpected response status");
            return Err(BackendError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get(&self, endpoint: &str, form_name: &str) -> Result<ApiResponse, BackendError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(&[("formName", form_name)])
            .send()
            .await?;
        Self::read(response).await
    }

    async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<ApiResponse, BackendError> {
        let response = self
            .client
            .post(self.url(&self.action_endpoint))
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }

    /// Row data as a JSON part plus one part per picked file.
    async fn post_multipart(&self, action: &RowAction) -> Result<ApiResponse, BackendError> {
        let payload = serde_json::to_value(action)?;
        let mut form = Form::new();
        if let Value::Object(map) = payload {
            for (key, value) in map {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                form = form.text(key, text);
            }
        }
        for (field, path) in action.files().into_iter().flatten() {
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| field.clone());
            form = form.part(field.clone(), Part::bytes(bytes).file_name(file_name));
        }
        let response = self
            .client
            .post(self.url(&self.action_endpoint))
            .multipart(form)
            .send()
            .await?;
        Self::read(response).await
    }
}

#[async_trait]
impl GridBackend for HttpBackend {
    async fn fetch_fields(&self, form_name: &str) -> Result<FormFields, BackendError> {
        self.get(&self.fields_endpoint, form_name).await?.decode()
    }

    async fn fetch_table(&self, form_name: &str) -> Result<TableData, BackendError> {
        self.get(&self.data_endpoint, form_name).await?.decode()
    }

    async fn submit_rows(&self, action: RowAction) -> Result<ActionOutcome, BackendError> {
        tracing::info!(action = action.name(), "submitting rows");
        let response = if action.files().is_some_and(|f| !f.is_empty()) {
            self.post_multipart(&action).await?
        } else {
            self.post(&action).await?
        };
        response.decode()
    }

    async fn load_grid_state(&self, table_name: &str) -> Result<Option<Value>, BackendError> {
        let data = self
            .post(&ActionRequest::GetGridState {
                table_name: table_name.to_string(),
            })
            .await?
            .into_data()?;
        Ok((!data.is_null()).then_some(data))
    }

    async fn save_grid_state(&self, table_name: &str, state: &ViewState) -> Result<(), BackendError> {
        self.post(&ActionRequest::SaveGridState {
            table_name: table_name.to_string(),
            data: state.clone(),
        })
        .await?
        .into_body()?;
        Ok(())
    }

    async fn list_patterns(
        &self,
        kind: PatternKind,
        table_name: &str,
    ) -> Result<Vec<PatternSummary>, BackendError> {
        let data = self
            .post(&ActionRequest::GetPatterns {
                kind,
                table_name: table_name.to_string(),
            })
            .await?
            .into_data()?;
        let Value::Array(items) = data else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter_map(|item| {
                Some(PatternSummary {
                    id: api::id_from_value(item.get("id")?)?,
                    name: item.get("name")?.as_str()?.to_string(),
                })
            })
            .collect())
    }

    async fn load_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        id: i64,
    ) -> Result<Value, BackendError> {
        let data = self
            .post(&ActionRequest::GetPattern {
                kind,
                table_name: table_name.to_string(),
                id,
            })
            .await?
            .into_data()?;
        if data.is_null() {
            return Err(BackendError::NotFound(format!("{} {id}", kind.as_str())));
        }
        // Some endpoints wrap the blob in the pattern record.
        Ok(match data {
            Value::Object(mut record) if record.contains_key("name") && record.contains_key("data") => {
                record.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        })
    }

    async fn save_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        name: &str,
        data: Value,
        id: Option<i64>,
    ) -> Result<i64, BackendError> {
        let mut body = self
            .post(&ActionRequest::SavePattern {
                kind,
                table_name: table_name.to_string(),
                name: name.to_string(),
                data,
                id,
            })
            .await?
            .into_body()?;
        body.remove("id")
            .as_ref()
            .and_then(api::id_from_value)
            .or(id)
            .ok_or_else(|| BackendError::Server("save answered without an id".to_string()))
    }

    async fn delete_pattern(
        &self,
        kind: PatternKind,
        table_name: &str,
        id: i64,
    ) -> Result<(), BackendError> {
        self.post(&ActionRequest::DeletePattern {
            kind,
            table_name: table_name.to_string(),
            id,
        })
        .await?
        .into_body()?;
        Ok(())
    }

    async fn lookup_values(&self, lookup: &str) -> Result<Vec<String>, BackendError> {
        let data = self
            .post(&ActionRequest::GetLookupData {
                lookup_sql: lookup.to_string(),
            })
            .await?
            .into_data()?;
        let Value::Array(items) = data else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => map.values().next().map(display_value),
                Value::Null => None,
                other => Some(display_value(other)),
            })
            .collect())
    }
}
