use std::fmt;

use crate::model::ids::{CourseId, UserId};

/// Who is driving the current session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(UserId),
}

impl Identity {
    /// Coerce an optional raw id into an identity.
    ///
    /// Missing, empty and whitespace-only ids all become `Anonymous`.
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.and_then(|value| UserId::new(value).ok())
            .map_or(Self::Anonymous, Self::User)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id),
        }
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl From<UserId> for Identity {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

/// Composite storage key for one user's progress through one course.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    user: UserId,
    course: CourseId,
}

const KEY_PREFIX: &str = "courseProgress";

impl ProgressKey {
    #[must_use]
    pub fn new(user: UserId, course: CourseId) -> Self {
        Self { user, course }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn course(&self) -> &CourseId {
        &self.course
    }

    /// Flat string form for key-value backends.
    ///
    /// The user id is length-prefixed so that no two `(user, course)` pairs
    /// map to the same key, whatever characters the ids contain.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{KEY_PREFIX}:{}:{}:{}",
            self.user.as_str().len(),
            self.user,
            self.course
        )
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Whether progress for the active course may be written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Persistence {
    #[default]
    Disabled,
    Enabled(ProgressKey),
}

impl Persistence {
    /// Persistence is enabled only for an authenticated user on a course with an id.
    #[must_use]
    pub fn for_course(identity: &Identity, course_id: Option<&CourseId>) -> Self {
        match (identity.user_id(), course_id) {
            (Some(user), Some(course)) => {
                Self::Enabled(ProgressKey::new(user.clone(), course.clone()))
            }
            _ => Self::Disabled,
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<&ProgressKey> {
        match self {
            Self::Disabled => None,
            Self::Enabled(key) => Some(key),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(raw: &str) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn course(raw: &str) -> CourseId {
        CourseId::new(raw).unwrap()
    }

    #[test]
    fn missing_or_blank_identity_is_anonymous() {
        assert_eq!(Identity::from_optional(None), Identity::Anonymous);
        assert_eq!(Identity::from_optional(Some("")), Identity::Anonymous);
        assert_eq!(Identity::from_optional(Some("  ")), Identity::Anonymous);
        assert_eq!(
            Identity::from_optional(Some("u-1")),
            Identity::User(user("u-1"))
        );
    }

    #[test]
    fn storage_keys_do_not_collide_on_separators() {
        let a = ProgressKey::new(user("a_b"), course("c"));
        let b = ProgressKey::new(user("a"), course("b_c"));
        assert_ne!(a.storage_key(), b.storage_key());

        let c = ProgressKey::new(user("a:1"), course("x"));
        let d = ProgressKey::new(user("a"), course("1:x"));
        assert_ne!(c.storage_key(), d.storage_key());
    }

    #[test]
    fn storage_key_is_stable() {
        let key = ProgressKey::new(user("alice"), course("rust1700"));
        assert_eq!(key.storage_key(), "courseProgress:5:alice:rust1700");
    }

    #[test]
    fn persistence_requires_user_and_course() {
        let id = course("rust1");
        assert_eq!(
            Persistence::for_course(&Identity::Anonymous, Some(&id)),
            Persistence::Disabled
        );
        assert_eq!(
            Persistence::for_course(&Identity::User(user("u")), None),
            Persistence::Disabled
        );
        assert!(Persistence::for_course(&Identity::User(user("u")), Some(&id)).is_enabled());
    }
}
