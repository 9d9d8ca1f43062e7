use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::backend::{BackendError, GridBackend};
use crate::io::file_backend::FileBackend;
use crate::io::http_backend::HttpBackend;

pub const CONFIG_ENV: &str = "ADMINGRID_CONFIG";
pub const ENDPOINT_ENV: &str = "ADMINGRID_ENDPOINT";
pub const DATA_FILE_ENV: &str = "ADMINGRID_DATA_FILE";
pub const FORMS_ENV: &str = "ADMINGRID_FORMS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no backend configured: set ADMINGRID_ENDPOINT or ADMINGRID_DATA_FILE")]
    NoBackend,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the PHP backend.
    pub base_url: Option<String>,
    pub fields_endpoint: String,
    pub data_endpoint: String,
    pub action_endpoint: String,
    /// Local JSON document used instead of the HTTP backend.
    pub data_file: Option<PathBuf>,
    /// Forms offered as tabs, in order.
    pub forms: Vec<String>,
    pub save_debounce_ms: u64,
    pub search_debounce_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            fields_endpoint: "getFields.php".to_string(),
            data_endpoint: "table-data.php".to_string(),
            action_endpoint: "table-data.php".to_string(),
            data_file: None,
            forms: vec!["customers".to_string()],
            save_debounce_ms: 2500,
            search_debounce_ms: 300,
            request_timeout_ms: 15_000,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The file named by `ADMINGRID_CONFIG` (or defaults), then the
    /// individual variables on top.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Applies variable overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = get(ENDPOINT_ENV) {
            self.base_url = Some(endpoint.trim().to_string());
        }
        if let Some(file) = get(DATA_FILE_ENV) {
            self.data_file = Some(PathBuf::from(file.trim()));
        }
        if let Some(forms) = get(FORMS_ENV) {
            let forms: Vec<String> = forms
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            if !forms.is_empty() {
                self.forms = forms;
            }
        }
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// A local data file wins over a base URL.
    pub fn backend(&self) -> Result<Arc<dyn GridBackend>, ConfigError> {
        if let Some(path) = &self.data_file {
            tracing::info!(path = %path.display(), "using file backend");
            return Ok(Arc::new(FileBackend::open(path)?));
        }
        if let Some(base_url) = &self.base_url {
            tracing::info!(base_url = %base_url, "using http backend");
            return Ok(Arc::new(HttpBackend::new(base_url, self)?));
        }
        Err(ConfigError::NoBackend)
    }
}
