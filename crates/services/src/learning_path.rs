use pathway_core::model::{CourseDescriptor, Identity, Module, Persistence};
use pathway_core::progression::{
    self, PathSummary, Reconciliation, Transition, needs_resync, reconcile,
};

use crate::progress_store::ProgressStore;

/// Where the live status list came from when the path was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOrigin {
    Stored,
    Fresh,
}

/// Live progression state for one course in the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningPath {
    course: CourseDescriptor,
    persistence: Persistence,
    modules: Vec<Module>,
    origin: PathOrigin,
}

impl LearningPath {
    #[must_use]
    pub fn course(&self) -> &CourseDescriptor {
        &self.course
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    #[must_use]
    pub fn origin(&self) -> PathOrigin {
        self.origin
    }

    #[must_use]
    pub fn summary(&self) -> PathSummary {
        PathSummary::of(&self.modules)
    }
}

/// What `sync_course` did to a live path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    /// Same course, different module count: progress was reset.
    Resynchronized,
    /// A different course: the path was reopened from storage.
    Reopened,
}

/// Opens learning paths and applies completion transitions, persisting each change.
#[derive(Clone)]
pub struct LearningPathService {
    store: ProgressStore,
}

impl LearningPathService {
    #[must_use]
    pub fn new(store: ProgressStore) -> Self {
        Self { store }
    }

    /// Build the authoritative status list for `course` and `identity`.
    ///
    /// Stored progress is adopted when it matches the module count; otherwise
    /// the path starts fresh. Opening never writes.
    pub async fn open(&self, course: CourseDescriptor, identity: &Identity) -> LearningPath {
        let persistence = Persistence::for_course(identity, Some(&course.course_id));
        let stored = self.store.load(&persistence).await.ok();

        let (modules, origin) = match reconcile(stored, &course.modules) {
            Reconciliation::UseStored(modules) => (modules, PathOrigin::Stored),
            Reconciliation::UseFresh => {
                (progression::fresh_modules(&course.modules), PathOrigin::Fresh)
            }
        };
        tracing::debug!(
            course_id = %course.course_id,
            persisted = persistence.is_enabled(),
            ?origin,
            "opened learning path"
        );

        LearningPath {
            course,
            persistence,
            modules,
            origin,
        }
    }

    /// Complete the module at `index` (0-based) and persist the resulting list.
    ///
    /// Invalid requests leave the path untouched and write nothing. A failed
    /// write is logged; the in-memory state stays authoritative.
    pub async fn complete_module(&self, path: &mut LearningPath, index: usize) -> Transition {
        let transition = progression::complete_module(&mut path.modules, index);
        match transition {
            Transition::Advanced { completed, unlocked } => {
                tracing::info!(
                    course_id = %path.course.course_id,
                    completed,
                    ?unlocked,
                    "module completed"
                );
                self.persist(path).await;
            }
            Transition::Ignored(reason) => {
                tracing::debug!(course_id = %path.course.course_id, ?reason, "completion ignored");
            }
        }
        transition
    }

    /// Bring a live path in line with a newly supplied descriptor.
    ///
    /// A different course id reopens the path. The same course with another
    /// module count is resynchronized, which discards its completion progress.
    pub async fn sync_course(
        &self,
        path: &mut LearningPath,
        course: CourseDescriptor,
        identity: &Identity,
    ) -> SyncOutcome {
        if course.course_id != path.course.course_id {
            *path = self.open(course, identity).await;
            return SyncOutcome::Reopened;
        }

        if !needs_resync(&path.modules, &course.modules) {
            path.course = course;
            return SyncOutcome::Unchanged;
        }

        tracing::info!(
            course_id = %course.course_id,
            previous = path.modules.len(),
            current = course.modules.len(),
            "module count changed; resetting progress"
        );
        path.modules = progression::resynchronize(&course.modules);
        path.course = course;
        path.origin = PathOrigin::Fresh;
        self.persist(path).await;
        SyncOutcome::Resynchronized
    }

    async fn persist(&self, path: &LearningPath) {
        if let Err(err) = self.store.save(&path.persistence, &path.modules).await {
            tracing::warn!(
                course_id = %path.course.course_id,
                error = %err,
                "could not persist progress; keeping in-memory state"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use pathway_core::model::{CourseId, ModuleDraft, ModuleStatus, ProgressKey, UserId};
    use pathway_core::progression::IgnoreReason;
    use storage::repository::{InMemoryRepository, ProgressRepository, StorageError};

    use pathway_core::model::ModuleStatus::{Completed, Current, Locked};

    struct OfflineRepo;

    #[async_trait]
    impl ProgressRepository for OfflineRepo {
        async fn get_snapshot(&self, _key: &ProgressKey) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn put_snapshot(&self, _key: &ProgressKey, _payload: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn delete_snapshot(&self, _key: &ProgressKey) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    fn course(id: &str, n: u32) -> CourseDescriptor {
        let modules = (1..=n)
            .map(|i| ModuleDraft::new(i, format!("Module {i}"), format!("Week {i}")))
            .collect();
        CourseDescriptor::new("Rust", CourseId::new(id).unwrap(), "Rust", "8 weeks", modules)
            .unwrap()
    }

    fn alice() -> Identity {
        Identity::User(UserId::new("alice").unwrap())
    }

    fn service() -> LearningPathService {
        LearningPathService::new(ProgressStore::new(Arc::new(InMemoryRepository::new())))
    }

    fn statuses(path: &LearningPath) -> Vec<ModuleStatus> {
        path.modules().iter().map(|m| m.status).collect()
    }

    #[tokio::test]
    async fn progress_survives_reopen() {
        let svc = service();
        let mut path = svc.open(course("rust1", 3), &alice()).await;
        assert_eq!(path.origin(), PathOrigin::Fresh);

        svc.complete_module(&mut path, 0).await;

        let reopened = svc.open(course("rust1", 3), &alice()).await;
        assert_eq!(reopened.origin(), PathOrigin::Stored);
        assert_eq!(statuses(&reopened), [Completed, Current, Locked]);
    }

    #[tokio::test]
    async fn anonymous_progress_is_memory_only() {
        let svc = service();
        let mut path = svc.open(course("rust1", 3), &Identity::Anonymous).await;
        assert!(!path.persistence().is_enabled());

        let transition = svc.complete_module(&mut path, 0).await;
        assert!(transition.is_advanced());
        assert_eq!(statuses(&path), [Completed, Current, Locked]);

        let reopened = svc.open(course("rust1", 3), &Identity::Anonymous).await;
        assert_eq!(statuses(&reopened), [Current, Locked, Locked]);
    }

    #[tokio::test]
    async fn progress_is_per_user() {
        let svc = service();
        let mut path = svc.open(course("rust1", 3), &alice()).await;
        svc.complete_module(&mut path, 0).await;

        let bob = Identity::User(UserId::new("bob").unwrap());
        let other = svc.open(course("rust1", 3), &bob).await;
        assert_eq!(statuses(&other), [Current, Locked, Locked]);
    }

    #[tokio::test]
    async fn ignored_completion_does_not_write() {
        let repo = InMemoryRepository::new();
        let svc = LearningPathService::new(ProgressStore::new(Arc::new(repo.clone())));
        let mut path = svc.open(course("rust1", 3), &alice()).await;

        let transition = svc.complete_module(&mut path, 2).await;
        assert_eq!(transition, Transition::Ignored(IgnoreReason::Locked));

        let store = ProgressStore::new(Arc::new(repo));
        assert!(store.load(path.persistence()).await.is_err());
    }

    #[tokio::test]
    async fn persisted_list_matches_post_transition_state() {
        let repo = InMemoryRepository::new();
        let store = ProgressStore::new(Arc::new(repo));
        let svc = LearningPathService::new(store.clone());
        let mut path = svc.open(course("rust1", 2), &alice()).await;

        svc.complete_module(&mut path, 0).await;
        svc.complete_module(&mut path, 1).await;

        let stored = store.load(path.persistence()).await.unwrap();
        assert_eq!(stored, path.modules());
        assert!(path.summary().is_finished());
    }

    #[tokio::test]
    async fn changed_module_count_resets_progress() {
        let svc = service();
        let mut path = svc.open(course("rust1", 3), &alice()).await;
        svc.complete_module(&mut path, 0).await;

        let outcome = svc.sync_course(&mut path, course("rust1", 4), &alice()).await;
        assert_eq!(outcome, SyncOutcome::Resynchronized);
        assert_eq!(statuses(&path), [Current, Locked, Locked, Locked]);

        let reopened = svc.open(course("rust1", 4), &alice()).await;
        assert_eq!(reopened.origin(), PathOrigin::Stored);
        assert_eq!(statuses(&reopened), [Current, Locked, Locked, Locked]);
    }

    #[tokio::test]
    async fn sync_with_same_shape_keeps_progress() {
        let svc = service();
        let mut path = svc.open(course("rust1", 3), &alice()).await;
        svc.complete_module(&mut path, 0).await;

        let outcome = svc.sync_course(&mut path, course("rust1", 3), &alice()).await;
        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(statuses(&path), [Completed, Current, Locked]);
    }

    #[tokio::test]
    async fn sync_with_other_course_reopens() {
        let svc = service();
        let mut path = svc.open(course("rust1", 3), &alice()).await;
        svc.complete_module(&mut path, 0).await;

        let outcome = svc.sync_course(&mut path, course("go1", 3), &alice()).await;
        assert_eq!(outcome, SyncOutcome::Reopened);
        assert_eq!(path.course().course_id.as_str(), "go1");
        assert_eq!(statuses(&path), [Current, Locked, Locked]);
    }

    #[tokio::test]
    async fn storage_failure_is_not_fatal() {
        let svc = LearningPathService::new(ProgressStore::new(Arc::new(OfflineRepo)));
        let mut path = svc.open(course("rust1", 3), &alice()).await;
        assert_eq!(path.origin(), PathOrigin::Fresh);
        assert_eq!(statuses(&path), [Current, Locked, Locked]);

        let transition = svc.complete_module(&mut path, 0).await;
        assert_eq!(
            transition,
            Transition::Advanced {
                completed: 0,
                unlocked: Some(1)
            }
        );
        assert_eq!(statuses(&path), [Completed, Current, Locked]);

        let outcome = svc.sync_course(&mut path, course("rust1", 4), &alice()).await;
        assert_eq!(outcome, SyncOutcome::Resynchronized);
        assert_eq!(statuses(&path), [Current, Locked, Locked, Locked]);
    }
}
