use std::sync::Arc;

use crate::io::backend::{BackendError, GridBackend};
use crate::state::patterns::{self, PatternData, PatternKind, PatternSummary, SessionSnapshot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { id: i64 },
    /// A pattern with this name exists; the caller must confirm and then
    /// call [`PatternManager::save_overwrite`].
    NameExists { id: i64 },
    EmptyName,
}

#[derive(Clone)]
pub struct PatternManager {
    backend: Arc<dyn GridBackend>,
    kind: PatternKind,
    table_name: String,
    patterns: Vec<PatternSummary>,
}

impl PatternManager {
    pub fn new(backend: Arc<dyn GridBackend>, kind: PatternKind, table_name: &str) -> Self {
        Self {
            backend,
            kind,
            table_name: table_name.to_string(),
            patterns: Vec::new(),
        }
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn patterns(&self) -> &[PatternSummary] {
        &self.patterns
    }

    pub fn matching(&self, query: &str) -> Vec<&PatternSummary> {
        patterns::filter_patterns(&self.patterns, query)
    }

    /// Reloads the name list; an unreachable backend leaves it empty.
    pub async fn refresh(&mut self) -> &[PatternSummary] {
        self.patterns = match self.backend.list_patterns(self.kind, &self.table_name).await {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(kind = self.kind.as_str(), table = %self.table_name, %err, "could not list patterns");
                Vec::new()
            }
        };
        &self.patterns
    }

    pub async fn load(&self, id: i64) -> Result<PatternData, BackendError> {
        let value = self
            .backend
            .load_pattern(self.kind, &self.table_name, id)
            .await?;
        Ok(PatternData::from_value(self.kind, &value))
    }

    pub async fn load_session(&self, id: i64) -> Result<SessionSnapshot, BackendError> {
        match self.load(id).await? {
            PatternData::Session(snapshot) => Ok(snapshot),
            other => Err(BackendError::Server(format!(
                "pattern {id} is a {}, not a session",
                other.kind().as_str()
            ))),
        }
    }

    /// Saves under a new name. An existing name is reported instead of
    /// silently overwritten.
    pub async fn save(&mut self, name: &str, data: &PatternData) -> Result<SaveOutcome, BackendError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(SaveOutcome::EmptyName);
        }
        self.check_kind(data)?;
        if let Some(existing) = patterns::find_by_name(&self.patterns, name) {
            return Ok(SaveOutcome::NameExists { id: existing.id });
        }
        let id = self
            .backend
            .save_pattern(self.kind, &self.table_name, name, data.to_value(), None)
            .await?;
        tracing::info!(kind = self.kind.as_str(), name, id, "pattern saved");
        self.refresh().await;
        Ok(SaveOutcome::Saved { id })
    }

    pub async fn save_overwrite(
        &mut self,
        id: i64,
        name: &str,
        data: &PatternData,
    ) -> Result<i64, BackendError> {
        self.check_kind(data)?;
        let id = self
            .backend
            .save_pattern(self.kind, &self.table_name, name.trim(), data.to_value(), Some(id))
            .await?;
        self.refresh().await;
        Ok(id)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), BackendError> {
        self.backend
            .delete_pattern(self.kind, &self.table_name, id)
            .await?;
        self.patterns.retain(|p| p.id != id);
        Ok(())
    }

    fn check_kind(&self, data: &PatternData) -> Result<(), BackendError> {
        if data.kind() == self.kind {
            Ok(())
        } else {
            Err(BackendError::Server(format!(
                "cannot store a {} as a {}",
                data.kind().as_str(),
                self.kind.as_str()
            )))
        }
    }
}
