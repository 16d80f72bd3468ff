use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course prompt cannot be empty")]
    EmptyPrompt,

    #[error("module ids must run 1..=n in order (expected {expected}, found {found})")]
    ModuleOrder { expected: u32, found: u32 },
}

//
// ─── MODULES ───────────────────────────────────────────────────────────────────
//

/// Progression status of a single module.
///
/// Variants are ordered so that a legal transition never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Locked,
    Current,
    Completed,
}

impl ModuleStatus {
    /// Returns true if moving from `self` to `next` never goes backwards.
    #[must_use]
    pub fn can_advance_to(self, next: ModuleStatus) -> bool {
        next >= self
    }
}

/// A module as produced by the course source, before progression is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDraft {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ModuleStatus>,
}

impl ModuleDraft {
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ModuleId::new(id),
            title: title.into(),
            description: description.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: ModuleStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn into_module(self, status: ModuleStatus) -> Module {
        Module {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
        }
    }
}

/// A module with its progression status, as tracked per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub status: ModuleStatus,
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

/// Default duration label used until the source reports one.
pub const DEFAULT_DURATION: &str = "8 weeks";

/// Immutable record of a generated course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDescriptor {
    pub prompt: String,
    pub course_id: CourseId,
    pub title: String,
    pub duration: String,
    pub modules: Vec<ModuleDraft>,
}

impl CourseDescriptor {
    /// Build a descriptor, checking the prompt and module numbering.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyPrompt` for a blank prompt and
    /// `CourseError::ModuleOrder` if module ids are not `1..=n`.
    pub fn new(
        prompt: impl Into<String>,
        course_id: CourseId,
        title: impl Into<String>,
        duration: impl Into<String>,
        modules: Vec<ModuleDraft>,
    ) -> Result<Self, CourseError> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(CourseError::EmptyPrompt);
        }
        for (expected, module) in (1_u32..).zip(&modules) {
            if module.id.value() != expected {
                return Err(CourseError::ModuleOrder {
                    expected,
                    found: module.id.value(),
                });
            }
        }
        Ok(Self {
            prompt,
            course_id,
            title: title.into(),
            duration: duration.into(),
            modules,
        })
    }

    /// Descriptor shown while generation is still running: no modules yet.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyPrompt` for a blank prompt.
    pub fn placeholder(prompt: &str, course_id: CourseId) -> Result<Self, CourseError> {
        let trimmed = prompt.trim();
        Self::new(trimmed, course_id, trimmed, DEFAULT_DURATION, Vec::new())
    }

    /// Case-insensitive, whitespace-trimmed prompt used for history dedup.
    #[must_use]
    pub fn normalized_prompt(&self) -> String {
        normalize_prompt(&self.prompt)
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

#[must_use]
pub fn normalize_prompt(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn course_id() -> CourseId {
        CourseId::new("python1").unwrap()
    }

    #[test]
    fn status_order_is_monotonic() {
        assert!(ModuleStatus::Locked.can_advance_to(ModuleStatus::Current));
        assert!(ModuleStatus::Current.can_advance_to(ModuleStatus::Completed));
        assert!(!ModuleStatus::Completed.can_advance_to(ModuleStatus::Current));
        assert!(!ModuleStatus::Current.can_advance_to(ModuleStatus::Locked));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ModuleStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn descriptor_rejects_out_of_order_modules() {
        let err = CourseDescriptor::new(
            "Python",
            course_id(),
            "Python",
            DEFAULT_DURATION,
            vec![ModuleDraft::new(1, "Intro", "Week 1"), ModuleDraft::new(3, "Core", "Week 2")],
        )
        .unwrap_err();
        assert_eq!(err, CourseError::ModuleOrder { expected: 2, found: 3 });
    }

    #[test]
    fn descriptor_rejects_blank_prompt() {
        let err = CourseDescriptor::placeholder("   ", course_id()).unwrap_err();
        assert_eq!(err, CourseError::EmptyPrompt);
    }

    #[test]
    fn normalized_prompt_ignores_case_and_padding() {
        let course = CourseDescriptor::placeholder("  PyThon ", course_id()).unwrap();
        assert_eq!(course.prompt, "PyThon");
        assert_eq!(course.normalized_prompt(), "python");
        assert_eq!(course.title, "PyThon");
        assert_eq!(course.duration, DEFAULT_DURATION);
        assert_eq!(course.module_count(), 0);
    }

    #[test]
    fn draft_without_status_omits_field() {
        let json = serde_json::to_value(ModuleDraft::new(1, "Intro", "Week 1")).unwrap();
        assert!(json.get("status").is_none());
    }
}
