use pathway_core::model::{CourseDescriptor, UserId, UserProfile};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Which ordered list of a profile a course row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CourseList {
    History,
    Saved,
}

impl CourseList {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Saved => "saved",
        }
    }

    pub(crate) fn parse(s: &str) -> Result<Self, StorageError> {
        match s {
            "history" => Ok(Self::History),
            "saved" => Ok(Self::Saved),
            _ => Err(StorageError::Serialization(format!("invalid course list: {s}"))),
        }
    }
}

pub(crate) fn position_to_i64(position: usize) -> Result<i64, StorageError> {
    i64::try_from(position).map_err(|_| StorageError::Serialization("position overflow".into()))
}

pub(crate) fn encode_course(course: &CourseDescriptor) -> Result<String, StorageError> {
    serde_json::to_string(course).map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<UserProfile, StorageError> {
    let id = UserId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    let name: String = row.try_get("name").map_err(ser)?;
    let credential: Option<String> = row.try_get("credential").map_err(ser)?;

    let mut profile = UserProfile::new(id, name);
    profile.credential = credential;
    Ok(profile)
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<(CourseList, CourseDescriptor), StorageError> {
    let list = CourseList::parse(row.try_get::<String, _>("list").map_err(ser)?.as_str())?;
    let payload: String = row.try_get("payload").map_err(ser)?;
    let course: CourseDescriptor = serde_json::from_str(&payload).map_err(ser)?;
    Ok((list, course))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_list_round_trips() {
        for list in [CourseList::History, CourseList::Saved] {
            assert_eq!(CourseList::parse(list.as_str()).unwrap(), list);
        }
        assert!(CourseList::parse("favourites").is_err());
    }
}
