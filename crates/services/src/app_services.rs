use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::generation::{CourseGenerator, TemplateCourseSource};
use crate::learning_path::LearningPathService;
use crate::library_service::LibraryService;
use crate::progress_store::ProgressStore;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    learning_paths: Arc<LearningPathService>,
    library: Arc<LibraryService>,
    generator: Arc<CourseGenerator>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        latency: Duration,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite_with_clock(db_url, clock).await?;
        Ok(Self::from_storage(&storage, clock, latency))
    }

    /// Build services over throwaway in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, latency: Duration) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, latency)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, latency: Duration) -> Self {
        let store = ProgressStore::new(Arc::clone(&storage.progress));
        let learning_paths = Arc::new(LearningPathService::new(store));
        let library = Arc::new(LibraryService::new(Arc::clone(&storage.profiles)));
        let generator = Arc::new(
            CourseGenerator::new(clock, Arc::new(TemplateCourseSource)).with_latency(latency),
        );

        Self {
            learning_paths,
            library,
            generator,
        }
    }

    #[must_use]
    pub fn learning_paths(&self) -> Arc<LearningPathService> {
        Arc::clone(&self.learning_paths)
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    #[must_use]
    pub fn generator(&self) -> Arc<CourseGenerator> {
        Arc::clone(&self.generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::time::fixed_clock;

    #[tokio::test]
    async fn unreachable_database_fails_to_start() {
        let result = AppServices::new_sqlite(
            "sqlite:///nonexistent-pathway-dir/nested/pathway.sqlite3",
            fixed_clock(),
            Duration::ZERO,
        )
        .await;
        assert!(matches!(result, Err(AppServicesError::Sqlite(_))));
    }
}
