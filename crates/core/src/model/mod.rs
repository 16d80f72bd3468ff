mod course;
mod identity;
mod ids;
mod profile;

pub use course::{
    CourseDescriptor, CourseError, DEFAULT_DURATION, Module, ModuleDraft, ModuleStatus,
    normalize_prompt,
};
pub use identity::{Identity, Persistence, ProgressKey};
pub use ids::{CourseId, IdError, ModuleId, UserId};
pub use profile::{HISTORY_LIMIT, HistoryOutcome, SaveToggle, UserProfile};
