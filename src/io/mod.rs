pub mod api;
pub mod backend;
pub mod file_backend;
pub mod http_backend;
pub mod pattern_store;
pub mod state_store;

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::io::backend::BackendError;

pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), BackendError> {
    let content = serde_json::to_vec_pretty(value)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(&content)?;
    staged.as_file().sync_all()?;

    if let Err(err) = staged.persist(path) {
        if err.error.kind() != io::ErrorKind::AlreadyExists {
            return Err(err.error.into());
        }
        std::fs::remove_file(path)?;
        err.file.persist(path).map_err(|e| e.error)?;
    }
    Ok(())
}
