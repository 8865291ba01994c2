//! Owner of the in-memory progress map.
//!
//! Reads prefer the remote store when a user is known and a gateway was
//! configured at construction. Writes attempt the remote upsert first, then
//! always apply the change in memory and persist the full map locally. Remote
//! failures are logged and never returned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prep_core::Clock;
use prep_core::metrics::ProgressSummary;
use prep_core::model::{
    ChapterId, ChapterProgress, ChapterProgressPatch, ProgressMap, UserId, subtopic_key,
};
use storage::LocalProgressStore;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::remote::{ProgressRow, RemoteProgressGateway};

#[derive(Default)]
pub(crate) struct SyncState {
    pub(crate) map: ProgressMap,
    pub(crate) user: Option<UserId>,
}

/// Where the last `load` got its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Local,
    Remote,
    /// Remote was attempted and failed.
    LocalFallback,
}

pub struct ProgressSynchronizer {
    clock: Clock,
    pub(crate) local: LocalProgressStore,
    remote: Option<Arc<dyn RemoteProgressGateway>>,
    pub(crate) state: Mutex<SyncState>,
}

impl ProgressSynchronizer {
    #[must_use]
    pub fn new(
        clock: Clock,
        local: LocalProgressStore,
        remote: Option<Arc<dyn RemoteProgressGateway>>,
    ) -> Self {
        Self {
            clock,
            local,
            remote,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Synchronizer with no remote backend.
    #[must_use]
    pub fn local_only(clock: Clock, local: LocalProgressStore) -> Self {
        Self::new(clock, local, None)
    }

    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// User whose progress is being synchronized, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.state().user.clone()
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load progress for `user` and make it the current map.
    ///
    /// Remote results replace the local copy wholesale. Never fails: remote
    /// errors fall back to the local store, which falls back to an empty map.
    pub async fn load(&self, user: Option<UserId>) -> ProgressMap {
        self.load_with_source(user).await.0
    }

    /// Same as [`Self::load`], also reporting which backend answered.
    pub async fn load_with_source(&self, user: Option<UserId>) -> (ProgressMap, LoadSource) {
        let (map, source) = match (self.remote.as_ref(), user.as_ref()) {
            (Some(remote), Some(user_id)) => match remote.fetch_by_user(user_id).await {
                Ok(rows) => {
                    let map: ProgressMap = rows.into_iter().map(ProgressRow::into_entry).collect();
                    info!(user = %user_id, chapters = map.len(), "loaded progress from remote store");
                    (map, LoadSource::Remote)
                }
                Err(err) => {
                    warn!(user = %user_id, error = %err, "remote progress unavailable, using local store");
                    (self.local.load().await, LoadSource::LocalFallback)
                }
            },
            _ => (self.local.load().await, LoadSource::Local),
        };

        let mut state = self.state();
        state.map = map.clone();
        state.user = user;
        (map, source)
    }

    /// Merge `patch` into the chapter's record and persist it.
    ///
    /// Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` only if the local write fails; the
    /// in-memory map is updated regardless.
    pub async fn update(
        &self,
        chapter: ChapterId,
        patch: &ChapterProgressPatch,
    ) -> Result<ChapterProgress, SyncError> {
        let (current, user) = {
            let state = self.state();
            (state.map.progress_of(&chapter), state.user.clone())
        };
        let merged = patch.apply(current);

        if let (Some(remote), Some(user_id)) = (self.remote.as_ref(), user) {
            let row = ProgressRow::new(user_id, chapter.clone(), &merged, self.clock.now());
            match remote.upsert(&row).await {
                Ok(()) => debug!(chapter = %chapter, "remote progress updated"),
                Err(err) => {
                    warn!(chapter = %chapter, error = %err, "remote progress update failed");
                }
            }
        }

        let snapshot = {
            let mut state = self.state();
            state.map.insert(chapter, merged.clone());
            state.map.clone()
        };
        self.local.save(&snapshot).await?;
        Ok(merged)
    }

    /// Mark the subtopic at `index` of `chapter` done or not done.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the local write fails.
    pub async fn set_subtopic(
        &self,
        chapter: ChapterId,
        index: usize,
        done: bool,
    ) -> Result<ChapterProgress, SyncError> {
        let mut subtopics = self.chapter(&chapter).subtopics;
        subtopics.insert(subtopic_key(index), done);
        self.update(chapter, &ChapterProgressPatch::new().subtopics(subtopics))
            .await
    }

    /// Current record for `chapter`, or the zero value.
    #[must_use]
    pub fn chapter(&self, chapter: &ChapterId) -> ChapterProgress {
        self.state().map.progress_of(chapter)
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressMap {
        self.state().map.clone()
    }

    #[must_use]
    pub fn summary<S: AsRef<str>>(&self, subjects: &[S]) -> ProgressSummary {
        ProgressSummary::from_map(&self.state().map, subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn synchronizer() -> ProgressSynchronizer {
        let store = LocalProgressStore::new(Arc::new(InMemoryRepository::new()));
        ProgressSynchronizer::local_only(fixed_clock(), store)
    }

    fn id(raw: &str) -> ChapterId {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn set_subtopic_keeps_other_subtopics() {
        let sync = synchronizer();
        sync.set_subtopic(id("Physics-11-1"), 0, true).await.unwrap();
        let progress = sync.set_subtopic(id("Physics-11-1"), 2, true).await.unwrap();
        assert!(progress.subtopic_done(0));
        assert!(!progress.subtopic_done(1));
        assert!(progress.subtopic_done(2));

        let progress = sync.set_subtopic(id("Physics-11-1"), 0, false).await.unwrap();
        assert!(!progress.subtopic_done(0));
        assert_eq!(progress.subtopics.len(), 2);
    }

    #[tokio::test]
    async fn local_only_load_reports_local_source() {
        let sync = synchronizer();
        let (map, source) = sync.load_with_source(Some(UserId::new("u1").unwrap())).await;
        assert!(map.is_empty());
        assert_eq!(source, LoadSource::Local);
        assert!(!sync.has_remote());
    }

    #[tokio::test]
    async fn unknown_chapter_reads_as_zero_value() {
        let sync = synchronizer();
        assert_eq!(sync.chapter(&id("Biology-12-9")), ChapterProgress::default());
        assert!(sync.snapshot().is_empty());
    }
}
