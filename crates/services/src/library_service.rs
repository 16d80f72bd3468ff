use std::sync::Arc;

use pathway_core::model::{
    CourseDescriptor, CourseId, HistoryOutcome, SaveToggle, UserId, UserProfile,
};
use storage::repository::ProfileRepository;

use crate::error::LibraryError;

/// Keeps each user's generated-course history and saved list.
///
/// Every mutation loads the profile, applies the change, and writes the
/// whole profile back before returning it.
#[derive(Clone)]
pub struct LibraryService {
    profiles: Arc<dyn ProfileRepository>,
}

impl LibraryService {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Fetch the profile for `id`, creating an empty one on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` if the repository cannot be accessed.
    pub async fn ensure_profile(&self, id: &UserId, name: &str) -> Result<UserProfile, LibraryError> {
        if let Some(profile) = self.profiles.get_profile(id).await? {
            return Ok(profile);
        }

        let profile = UserProfile::new(id.clone(), name.trim());
        self.profiles.save_profile(&profile).await?;
        tracing::info!(user_id = %id, "created user profile");
        Ok(profile)
    }

    /// Fetch an existing profile.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::UnknownUser` if no profile exists.
    pub async fn profile(&self, id: &UserId) -> Result<UserProfile, LibraryError> {
        self.profiles
            .get_profile(id)
            .await?
            .ok_or_else(|| LibraryError::UnknownUser(id.clone()))
    }

    /// Record a freshly generated course at the top of the user's history.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the profile is missing or cannot be stored.
    pub async fn record_generation(
        &self,
        id: &UserId,
        course: CourseDescriptor,
    ) -> Result<(UserProfile, HistoryOutcome), LibraryError> {
        let mut profile = self.profile(id).await?;
        let outcome = profile.record_generation(course);
        self.profiles.save_profile(&profile).await?;
        tracing::info!(user_id = %id, ?outcome, history = profile.history.len(), "recorded generation");
        Ok((profile, outcome))
    }

    /// Save the course, or unsave it if it is already saved.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the profile is missing or cannot be stored.
    pub async fn toggle_save(
        &self,
        id: &UserId,
        course: &CourseDescriptor,
    ) -> Result<(UserProfile, SaveToggle), LibraryError> {
        let mut profile = self.profile(id).await?;
        let outcome = profile.toggle_save(course);
        self.profiles.save_profile(&profile).await?;
        tracing::info!(user_id = %id, course_id = %course.course_id, ?outcome, "toggled saved course");
        Ok((profile, outcome))
    }

    /// Remove a course from the saved list. Returns false if it was not saved.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the profile is missing or cannot be stored.
    pub async fn remove_saved(
        &self,
        id: &UserId,
        course_id: &CourseId,
    ) -> Result<(UserProfile, bool), LibraryError> {
        let mut profile = self.profile(id).await?;
        let removed = profile.remove_saved(course_id);
        if removed {
            self.profiles.save_profile(&profile).await?;
            tracing::info!(user_id = %id, %course_id, "removed saved course");
        }
        Ok((profile, removed))
    }

    /// Empty the history. Returns false if there was nothing to clear.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the profile is missing or cannot be stored.
    pub async fn clear_history(&self, id: &UserId) -> Result<(UserProfile, bool), LibraryError> {
        let mut profile = self.profile(id).await?;
        let cleared = profile.clear_history();
        if cleared {
            self.profiles.save_profile(&profile).await?;
            tracing::info!(user_id = %id, "cleared course history");
        }
        Ok((profile, cleared))
    }

    /// Look a course up in the user's history or saved list.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the profile is missing or cannot be read.
    pub async fn find_course(
        &self,
        id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<CourseDescriptor>, LibraryError> {
        let profile = self.profile(id).await?;
        Ok(profile.find_course(course_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::model::{HISTORY_LIMIT, ModuleDraft};
    use storage::repository::InMemoryRepository;

    fn course(prompt: &str, id: &str) -> CourseDescriptor {
        CourseDescriptor::new(
            prompt,
            CourseId::new(id).unwrap(),
            prompt,
            "8 weeks",
            vec![ModuleDraft::new(1, "Intro", "Week 1")],
        )
        .unwrap()
    }

    async fn setup() -> (LibraryService, UserId) {
        let svc = LibraryService::new(Arc::new(InMemoryRepository::new()));
        let id = UserId::new("alice").unwrap();
        svc.ensure_profile(&id, "Alice").await.unwrap();
        (svc, id)
    }

    #[tokio::test]
    async fn ensure_profile_is_idempotent() {
        let (svc, id) = setup().await;
        svc.record_generation(&id, course("Rust", "r1")).await.unwrap();

        let again = svc.ensure_profile(&id, "Someone Else").await.unwrap();
        assert_eq!(again.name, "Alice");
        assert_eq!(again.history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let svc = LibraryService::new(Arc::new(InMemoryRepository::new()));
        let err = svc.profile(&UserId::new("ghost").unwrap()).await.unwrap_err();
        assert!(matches!(err, LibraryError::UnknownUser(_)));
    }

    #[tokio::test]
    async fn history_dedups_and_persists() {
        let (svc, id) = setup().await;

        let (_, first) = svc.record_generation(&id, course("Python", "p1")).await.unwrap();
        svc.record_generation(&id, course("Go", "g1")).await.unwrap();
        let (profile, second) = svc
            .record_generation(&id, course("  python  ", "p2"))
            .await
            .unwrap();

        assert_eq!(first, HistoryOutcome::Added);
        assert_eq!(second, HistoryOutcome::MovedToTop);
        assert_eq!(profile.history.len(), 2);
        assert_eq!(svc.profile(&id).await.unwrap().history[0].course_id.as_str(), "p1");
    }

    #[tokio::test]
    async fn history_bound_holds_through_service() {
        let (svc, id) = setup().await;
        for i in 0..=HISTORY_LIMIT {
            svc.record_generation(&id, course(&format!("topic {i}"), &format!("c{i}")))
                .await
                .unwrap();
        }
        let profile = svc.profile(&id).await.unwrap();
        assert_eq!(profile.history.len(), HISTORY_LIMIT);
        assert_eq!(profile.history[HISTORY_LIMIT - 1].course_id.as_str(), "c1");
    }

    #[tokio::test]
    async fn save_list_is_independent_of_history() {
        let (svc, id) = setup().await;
        let rust = course("Rust", "r1");
        svc.record_generation(&id, rust.clone()).await.unwrap();

        let (_, toggled) = svc.toggle_save(&id, &rust).await.unwrap();
        assert_eq!(toggled, SaveToggle::Saved);

        let (profile, cleared) = svc.clear_history(&id).await.unwrap();
        assert!(cleared);
        assert!(profile.is_saved(&rust.course_id));

        let (_, cleared_again) = svc.clear_history(&id).await.unwrap();
        assert!(!cleared_again);

        let found = svc.find_course(&id, &rust.course_id).await.unwrap();
        assert_eq!(found, Some(rust.clone()));

        let (profile, removed) = svc.remove_saved(&id, &rust.course_id).await.unwrap();
        assert!(removed);
        assert!(profile.saved.is_empty());
        let (_, removed_again) = svc.remove_saved(&id, &rust.course_id).await.unwrap();
        assert!(!removed_again);
    }
}
