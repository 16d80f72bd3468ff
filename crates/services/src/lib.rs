#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod generation;
pub mod learning_path;
pub mod library_service;
pub mod progress_store;

pub use pathway_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, GenerationError, LibraryError, ProgressNotFound};
pub use generation::{CourseGenerator, CourseSource, DEFAULT_GENERATION_LATENCY, TemplateCourseSource};
pub use learning_path::{LearningPath, LearningPathService, PathOrigin, SyncOutcome};
pub use library_service::LibraryService;
pub use progress_store::{ProgressStore, SaveOutcome};
