//! Session-scoped draft persistence with in-memory fallback

use super::medium::{MemoryStorage, StorageMedium};
use crate::error::PersistenceError;
use crate::state::{FormDraft, StepState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const KEY_PREFIX: &str = "registration-draft";

/// Everything needed to resume a registration after a restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftSnapshot {
    pub draft: FormDraft,
    pub progress: StepState,
    pub saved_at: Option<DateTime<Utc>>,
}

impl DraftSnapshot {
    /// Snapshot stamped with the current time
    pub fn new(draft: FormDraft, progress: StepState) -> Self {
        Self {
            draft,
            progress,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.draft.is_empty() && self.progress == StepState::default()
    }
}

/// Draft persistence for one user session.
///
/// Every save lands in an in-memory mirror first. When the storage medium
/// fails the store switches to the mirror for the rest of the session.
pub struct DraftStore {
    medium: Box<dyn StorageMedium>,
    key: String,
    mirror: Option<DraftSnapshot>,
    degraded: bool,
}

impl DraftStore {
    pub fn new(medium: Box<dyn StorageMedium>, user_id: &str) -> Self {
        Self {
            medium,
            key: format!("{KEY_PREFIX}.{user_id}"),
            mirror: None,
            degraded: false,
        }
    }

    /// Store backed only by process memory
    pub fn in_memory(user_id: &str) -> Self {
        Self::new(Box::new(MemoryStorage::new()), user_id)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// True once the medium has failed and only the mirror is used
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Most recent snapshot, or an empty one if nothing was saved
    pub fn load(&mut self) -> DraftSnapshot {
        if self.degraded {
            return self.mirror.clone().unwrap_or_default();
        }

        match self.medium.get(&self.key) {
            Ok(Some(json)) => match serde_json::from_str::<DraftSnapshot>(&json) {
                Ok(snapshot) => {
                    self.mirror = Some(snapshot.clone());
                    snapshot
                }
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Discarding unreadable draft");
                    self.mirror.clone().unwrap_or_default()
                }
            },
            Ok(None) => self.mirror.clone().unwrap_or_default(),
            Err(e) => {
                self.degrade("load", e);
                self.mirror.clone().unwrap_or_default()
            }
        }
    }

    /// Overwrite the stored snapshot. Never fails: storage errors degrade the store.
    pub fn save(&mut self, snapshot: &DraftSnapshot) {
        self.mirror = Some(snapshot.clone());
        if self.degraded {
            return;
        }

        let result = serde_json::to_string(snapshot)
            .map_err(PersistenceError::from)
            .and_then(|json| self.medium.set(&self.key, &json));
        match result {
            Ok(()) => tracing::debug!(key = %self.key, "Draft saved"),
            Err(e) => self.degrade("save", e),
        }
    }

    /// Drop the snapshot from memory and, best-effort, from the medium.
    ///
    /// The medium is tried even when degraded: a snapshot written before the
    /// failure must not outlive the draft it belongs to.
    pub fn clear(&mut self) {
        self.mirror = None;
        match self.medium.remove(&self.key) {
            Ok(()) => tracing::debug!(key = %self.key, "Draft cleared"),
            Err(e) => tracing::warn!(
                key = %self.key,
                error = %e,
                "Could not remove stored draft"
            ),
        }
    }

    fn degrade(&mut self, operation: &str, error: PersistenceError) {
        tracing::warn!(
            key = %self.key,
            operation,
            error = %error,
            "Draft storage unavailable, continuing in memory only"
        );
        self.degraded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::medium::MockStorageMedium;
    use crate::state::StepKey;
    use mockall::predicate::eq;

    fn sample_snapshot() -> DraftSnapshot {
        let mut draft = FormDraft::new();
        draft.set_field(StepKey::BasicInfo, "last_name", "Doe").unwrap();
        draft.set_field(StepKey::Contact, "city", "Lyon").unwrap();
        let mut progress = StepState {
            current: 1,
            ..Default::default()
        };
        progress.completed.insert(StepKey::BasicInfo);
        DraftSnapshot::new(draft, progress)
    }

    fn unavailable() -> PersistenceError {
        PersistenceError::Unavailable("quota exceeded".to_string())
    }

    mod snapshot {
        use super::*;

        #[test]
        fn test_default_is_empty() {
            assert!(DraftSnapshot::default().is_empty());
            assert!(!sample_snapshot().is_empty());
        }

        #[test]
        fn test_new_stamps_saved_at() {
            assert!(sample_snapshot().saved_at.is_some());
        }
    }

    mod with_working_medium {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_key_is_scoped_to_user() {
            let store = DraftStore::in_memory("user-42");
            assert_eq!(store.key(), "registration-draft.user-42");
        }

        #[test]
        fn test_load_without_save_is_empty() {
            let mut store = DraftStore::in_memory("u1");
            assert_eq!(store.load(), DraftSnapshot::default());
        }

        #[test]
        fn test_save_then_load_roundtrips() {
            let mut store = DraftStore::in_memory("u1");
            let snapshot = sample_snapshot();
            store.save(&snapshot);
            assert_eq!(store.load(), snapshot);
        }

        #[test]
        fn test_save_is_idempotent() {
            let mut store = DraftStore::in_memory("u1");
            let snapshot = sample_snapshot();
            store.save(&snapshot);
            store.save(&snapshot);
            assert_eq!(store.load(), snapshot);
        }

        #[test]
        fn test_save_overwrites_without_merge() {
            let mut store = DraftStore::in_memory("u1");
            store.save(&sample_snapshot());

            let mut draft = FormDraft::new();
            draft.set_field(StepKey::Family, "father_name", "John").unwrap();
            let replacement = DraftSnapshot::new(draft, StepState::default());
            store.save(&replacement);

            let loaded = store.load();
            assert_eq!(loaded, replacement);
            assert!(loaded.draft.get(StepKey::BasicInfo).is_none());
        }

        #[test]
        fn test_clear_removes_snapshot() {
            let mut store = DraftStore::in_memory("u1");
            store.save(&sample_snapshot());
            store.clear();
            assert_eq!(store.load(), DraftSnapshot::default());
            assert!(!store.is_degraded());
        }

        #[test]
        fn test_snapshot_survives_new_store_on_same_medium() {
            let mut medium = MockStorageMedium::new();
            let snapshot = sample_snapshot();
            let json = serde_json::to_string(&snapshot).unwrap();
            medium
                .expect_get()
                .with(eq("registration-draft.u1"))
                .times(1)
                .returning(move |_| Ok(Some(json.clone())));

            let mut store = DraftStore::new(Box::new(medium), "u1");
            assert_eq!(store.load(), snapshot);
        }

        #[test]
        fn test_corrupt_snapshot_loads_empty_without_degrading() {
            let mut medium = MockStorageMedium::new();
            medium
                .expect_get()
                .returning(|_| Ok(Some("{not json".to_string())));

            let mut store = DraftStore::new(Box::new(medium), "u1");
            assert_eq!(store.load(), DraftSnapshot::default());
            assert!(!store.is_degraded());
        }
    }

    mod with_failing_medium {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_failed_save_degrades_and_keeps_data() {
            let mut medium = MockStorageMedium::new();
            medium
                .expect_set()
                .times(1)
                .returning(|_, _| Err(unavailable()));
            medium.expect_get().never();

            let mut store = DraftStore::new(Box::new(medium), "u1");
            let snapshot = sample_snapshot();
            store.save(&snapshot);

            assert!(store.is_degraded());
            assert_eq!(store.load(), snapshot);
        }

        #[test]
        fn test_degraded_store_stops_saving_to_medium() {
            let mut medium = MockStorageMedium::new();
            medium
                .expect_set()
                .times(1)
                .returning(|_, _| Err(unavailable()));
            medium.expect_get().never();

            let mut store = DraftStore::new(Box::new(medium), "u1");
            let snapshot = sample_snapshot();
            store.save(&snapshot);
            store.save(&snapshot);
            assert_eq!(store.load(), snapshot);
        }

        #[test]
        fn test_clear_after_degrading_still_removes_stored_snapshot() {
            let mut medium = MockStorageMedium::new();
            let mut seq = mockall::Sequence::new();
            medium
                .expect_set()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
            medium
                .expect_set()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Err(unavailable()));
            medium
                .expect_remove()
                .with(eq("registration-draft.u1"))
                .times(1)
                .returning(|_| Ok(()));

            let mut store = DraftStore::new(Box::new(medium), "u1");
            store.save(&sample_snapshot());
            store.save(&sample_snapshot());
            assert!(store.is_degraded());

            store.clear();
            assert_eq!(store.load(), DraftSnapshot::default());
        }

        #[test]
        fn test_failed_load_degrades_to_empty() {
            let mut medium = MockStorageMedium::new();
            medium.expect_get().returning(|_| Err(unavailable()));

            let mut store = DraftStore::new(Box::new(medium), "u1");
            assert_eq!(store.load(), DraftSnapshot::default());
            assert!(store.is_degraded());
        }

        #[test]
        fn test_failed_clear_still_drops_mirror() {
            let mut medium = MockStorageMedium::new();
            medium.expect_set().returning(|_, _| Ok(()));
            medium.expect_remove().returning(|_| Err(unavailable()));
            medium.expect_get().returning(|_| Ok(None));

            let mut store = DraftStore::new(Box::new(medium), "u1");
            store.save(&sample_snapshot());
            store.clear();
            assert!(!store.is_degraded());
            assert_eq!(store.load(), DraftSnapshot::default());
        }
    }
}
