use std::sync::Arc;

use pathway_core::model::{Module, Persistence};
use storage::repository::{ProgressRepository, StorageError};

use crate::error::ProgressNotFound;

/// What a save request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// Persistence is disabled or the list is empty.
    Skipped,
}

/// Encodes module status lists and keeps them per `(user, course)`.
#[derive(Clone)]
pub struct ProgressStore {
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self { repo }
    }

    /// Write a snapshot of `modules`, replacing any previous one.
    ///
    /// Nothing is written when persistence is disabled or the list is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or written.
    pub async fn save(
        &self,
        persistence: &Persistence,
        modules: &[Module],
    ) -> Result<SaveOutcome, StorageError> {
        let Some(key) = persistence.key() else {
            return Ok(SaveOutcome::Skipped);
        };
        if modules.is_empty() {
            return Ok(SaveOutcome::Skipped);
        }

        let payload = serde_json::to_string(modules)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.repo.put_snapshot(key, &payload).await?;
        tracing::debug!(%key, modules = modules.len(), "saved progress snapshot");
        Ok(SaveOutcome::Written)
    }

    /// Load the snapshot for the active course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressNotFound` when persistence is disabled, nothing is
    /// stored, the payload does not decode, or the backend cannot be read.
    pub async fn load(&self, persistence: &Persistence) -> Result<Vec<Module>, ProgressNotFound> {
        let Some(key) = persistence.key() else {
            return Err(ProgressNotFound);
        };

        let payload = match self.repo.get_snapshot(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Err(ProgressNotFound),
            Err(err) => {
                tracing::warn!(%key, error = %err, "could not read progress snapshot");
                return Err(ProgressNotFound);
            }
        };

        serde_json::from_str(&payload).map_err(|err| {
            tracing::warn!(%key, error = %err, "discarding unreadable progress snapshot");
            ProgressNotFound
        })
    }

    /// Drop the stored snapshot for the active course, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn discard(&self, persistence: &Persistence) -> Result<(), StorageError> {
        match persistence.key() {
            Some(key) => self.repo.delete_snapshot(key).await,
            None => Ok(()),
        }
    }
}
