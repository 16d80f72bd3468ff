use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for building an identifier from a string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    #[error("failed to parse {kind} from {raw:?}")]
    Parse { kind: &'static str, raw: String },
}

fn non_empty(kind: &'static str, value: impl Into<String>) -> Result<String, IdError> {
    let raw = value.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty { kind });
    }
    Ok(trimmed.to_string())
}

/// Stable identifier handed out by the identity provider.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a new `UserId` from a trimmed, non-empty string.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        non_empty("UserId", value).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity key of a generated course.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseId(String);

impl CourseId {
    /// Creates a new `CourseId` from a trimmed, non-empty string.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        non_empty("CourseId", value).map(Self)
    }

    /// Derives the id of a freshly generated course.
    ///
    /// Whitespace in the trimmed prompt becomes `-`, followed by the
    /// generation time in epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the prompt is blank.
    pub fn derive(prompt: &str, generated_at: DateTime<Utc>) -> Result<Self, IdError> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty { kind: "CourseId" });
        }
        let slug: String = trimmed
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .collect();
        Ok(Self(format!("{slug}{}", generated_at.timestamp_millis())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 1-based position of a module inside its course.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    /// Creates a new `ModuleId`
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

// ─── Conversions ───────────────────────────────────────────────────────────────

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl TryFrom<String> for CourseId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourseId> for String {
    fn from(id: CourseId) -> Self {
        id.0
    }
}

// ─── Debug / Display ───────────────────────────────────────────────────────────

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({:?})", self.0)
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({:?})", self.0)
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for CourseId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for ModuleId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(ModuleId::new)
            .map_err(|_| IdError::Parse {
                kind: "ModuleId",
                raw: s.to_string(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn user_id_trims_input() {
        let id = UserId::new("  alice ").unwrap();
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(
            UserId::new("   ").unwrap_err(),
            IdError::Empty { kind: "UserId" }
        );
        assert!("".parse::<CourseId>().is_err());
    }

    #[test]
    fn course_id_derives_from_prompt_and_time() {
        let id = CourseId::derive("  Rust  for beginners ", fixed_now()).unwrap();
        assert_eq!(id.as_str(), "Rust--for-beginners1700000000000");
    }

    #[test]
    fn course_id_derive_rejects_blank_prompt() {
        assert!(CourseId::derive(" \t", fixed_now()).is_err());
    }

    #[test]
    fn module_id_from_str() {
        let id: ModuleId = "3".parse().unwrap();
        assert_eq!(id, ModuleId::new(3));
        assert!("three".parse::<ModuleId>().is_err());
    }

    #[test]
    fn course_id_deserialization_rejects_blank() {
        let result: Result<CourseId, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}
