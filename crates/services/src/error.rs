//! Shared error types for the services crate.

use thiserror::Error;

use pathway_core::model::{CourseError, IdError, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Stored progress is unavailable: missing, unreadable, or persistence is disabled.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no stored progress")]
pub struct ProgressNotFound;

/// Errors emitted by `LibraryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryError {
    #[error("no profile for user {0}")]
    UnknownUser(UserId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseGenerator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("please enter a course topic before generating")]
    EmptyPrompt,
    #[error("a course is already being generated")]
    InFlight,
    #[error("course source failed: {0}")]
    Source(String),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Course(#[from] CourseError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
