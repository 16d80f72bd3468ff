use serde::{Deserialize, Serialize};

use crate::model::course::{CourseDescriptor, normalize_prompt};
use crate::model::ids::{CourseId, UserId};

/// Maximum number of generated courses kept in a user's history.
pub const HISTORY_LIMIT: usize = 30;

/// What `record_generation` did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    Added,
    MovedToTop,
}

impl HistoryOutcome {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Added => "Course added to your generated history.",
            Self::MovedToTop => "Course moved to top of history.",
        }
    }
}

/// What `toggle_save` did to the saved list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveToggle {
    Saved,
    Removed,
}

impl SaveToggle {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => "Course saved successfully!",
            Self::Removed => "Course removed from your saved list.",
        }
    }
}

/// A user's persisted profile: generated-course history and saved courses.
///
/// `history` is most-recent-first and bounded by [`HISTORY_LIMIT`];
/// `saved` is most-recently-saved-first and unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    /// Opaque credential handed over by the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(default)]
    pub history: Vec<CourseDescriptor>,
    #[serde(default)]
    pub saved: Vec<CourseDescriptor>,
}

impl UserProfile {
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            credential: None,
            history: Vec::new(),
            saved: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Put a freshly generated course at the top of the history.
    ///
    /// An entry whose prompt matches case- and whitespace-insensitively is
    /// moved to the front instead of being duplicated. The history is then
    /// truncated to [`HISTORY_LIMIT`].
    pub fn record_generation(&mut self, course: CourseDescriptor) -> HistoryOutcome {
        let key = course.normalized_prompt();
        let existing = self
            .history
            .iter()
            .position(|entry| normalize_prompt(&entry.prompt) == key);

        let outcome = match existing {
            Some(index) => {
                let entry = self.history.remove(index);
                self.history.insert(0, entry);
                HistoryOutcome::MovedToTop
            }
            None => {
                self.history.insert(0, course);
                HistoryOutcome::Added
            }
        };

        self.history.truncate(HISTORY_LIMIT);
        outcome
    }

    /// Save the course if it is not saved yet, otherwise unsave it.
    pub fn toggle_save(&mut self, course: &CourseDescriptor) -> SaveToggle {
        if self.remove_saved(&course.course_id) {
            SaveToggle::Removed
        } else {
            self.saved.insert(0, course.clone());
            SaveToggle::Saved
        }
    }

    /// Remove a saved course by id. Returns false if it was not saved.
    pub fn remove_saved(&mut self, course_id: &CourseId) -> bool {
        let before = self.saved.len();
        self.saved.retain(|entry| &entry.course_id != course_id);
        self.saved.len() != before
    }

    /// Empty the history. Returns false if it was already empty.
    pub fn clear_history(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        self.history.clear();
        true
    }

    #[must_use]
    pub fn is_saved(&self, course_id: &CourseId) -> bool {
        self.saved.iter().any(|entry| &entry.course_id == course_id)
    }

    /// Look a course up by id, history first, then the saved list.
    #[must_use]
    pub fn find_course(&self, course_id: &CourseId) -> Option<&CourseDescriptor> {
        self.history
            .iter()
            .chain(self.saved.iter())
            .find(|entry| &entry.course_id == course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::course::{DEFAULT_DURATION, ModuleDraft};

    fn course(prompt: &str, id: &str) -> CourseDescriptor {
        CourseDescriptor::new(
            prompt,
            CourseId::new(id).unwrap(),
            prompt,
            DEFAULT_DURATION,
            vec![ModuleDraft::new(1, "Intro", "Week 1")],
        )
        .unwrap()
    }

    fn profile() -> UserProfile {
        UserProfile::new(UserId::new("alice").unwrap(), "alice")
    }

    #[test]
    fn duplicate_prompt_moves_existing_entry_to_top() {
        let mut user = profile();
        assert_eq!(user.record_generation(course("Python", "p1")), HistoryOutcome::Added);
        assert_eq!(user.record_generation(course("Go", "g1")), HistoryOutcome::Added);

        let outcome = user.record_generation(course("  python  ", "p2"));

        assert_eq!(outcome, HistoryOutcome::MovedToTop);
        assert_eq!(user.history.len(), 2);
        assert_eq!(user.history[0].course_id.as_str(), "p1");
        assert_eq!(user.history[1].course_id.as_str(), "g1");
    }

    #[test]
    fn history_is_bounded_to_most_recent() {
        let mut user = profile();
        for i in 0..=HISTORY_LIMIT {
            user.record_generation(course(&format!("topic {i}"), &format!("c{i}")));
        }

        assert_eq!(user.history.len(), HISTORY_LIMIT);
        assert_eq!(user.history[0].prompt, format!("topic {HISTORY_LIMIT}"));
        assert!(user.history.iter().all(|c| c.prompt != "topic 0"));
    }

    #[test]
    fn toggle_save_adds_removes_and_re_adds_at_front() {
        let mut user = profile();
        let rust = course("Rust", "r1");
        user.toggle_save(&course("Go", "g1"));

        assert_eq!(user.toggle_save(&rust), SaveToggle::Saved);
        assert!(user.is_saved(&rust.course_id));
        assert_eq!(user.toggle_save(&rust), SaveToggle::Removed);
        assert!(!user.is_saved(&rust.course_id));
        assert_eq!(user.toggle_save(&rust), SaveToggle::Saved);
        assert_eq!(user.saved[0].course_id, rust.course_id);
        assert_eq!(user.saved.len(), 2);
    }

    #[test]
    fn remove_saved_is_noop_when_absent() {
        let mut user = profile();
        assert!(!user.remove_saved(&CourseId::new("missing").unwrap()));
        user.toggle_save(&course("Rust", "r1"));
        assert!(user.remove_saved(&CourseId::new("r1").unwrap()));
        assert!(user.saved.is_empty());
    }

    #[test]
    fn clear_history_keeps_saved_courses() {
        let mut user = profile();
        assert!(!user.clear_history());

        let rust = course("Rust", "r1");
        user.record_generation(rust.clone());
        user.toggle_save(&rust);

        assert!(user.clear_history());
        assert!(user.history.is_empty());
        assert_eq!(user.saved.len(), 1);
        assert_eq!(user.find_course(&rust.course_id), Some(&rust));
    }
}
