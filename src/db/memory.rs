//! In-memory store implementations backing tests and the integration flow.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::{CatalogEntry, FeedbackEvent, LibraryStat, PlayerProfile, UserPreference};

use super::{CatalogStore, FeedbackLog, LibraryStore, PreferenceStore, ProfileStore};

#[derive(Default)]
pub struct MemoryCatalogStore {
    entries: RwLock<HashMap<i64, CatalogEntry>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(entries: Vec<CatalogEntry>) -> Self {
        let map = entries.into_iter().map(|e| (e.app_id, e)).collect();
        Self {
            entries: RwLock::new(map),
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get(&self, app_id: i64) -> AppResult<Option<CatalogEntry>> {
        Ok(self.entries.read().await.get(&app_id).cloned())
    }

    async fn get_many(&self, app_ids: &[i64]) -> AppResult<HashMap<i64, CatalogEntry>> {
        let entries = self.entries.read().await;
        Ok(app_ids
            .iter()
            .filter_map(|id| entries.get(id).map(|e| (*id, e.clone())))
            .collect())
    }

    async fn all_documents(&self) -> AppResult<Vec<(i64, String)>> {
        let entries = self.entries.read().await;
        let mut docs: Vec<(i64, String)> = entries
            .values()
            .filter_map(|e| {
                e.document
                    .as_ref()
                    .filter(|d| !d.is_empty())
                    .map(|d| (e.app_id, d.clone()))
            })
            .collect();
        // Stable corpus order so rebuilds are reproducible
        docs.sort_by_key(|(id, _)| *id);
        Ok(docs)
    }

    async fn all_app_ids(&self) -> AppResult<HashSet<i64>> {
        Ok(self.entries.read().await.keys().copied().collect())
    }

    async fn upsert(&self, entry: CatalogEntry) -> AppResult<()> {
        self.entries.write().await.insert(entry.app_id, entry);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLibraryStore {
    stats: RwLock<Vec<LibraryStat>>,
}

impl MemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(stats: Vec<LibraryStat>) -> Self {
        Self {
            stats: RwLock::new(stats),
        }
    }
}

#[async_trait::async_trait]
impl LibraryStore for MemoryLibraryStore {
    async fn list_by_profile(&self, profile_id: &str) -> AppResult<Vec<LibraryStat>> {
        Ok(self
            .stats
            .read()
            .await
            .iter()
            .filter(|s| s.profile_id == profile_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<i64, PlayerProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(profiles: Vec<PlayerProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.user_id, p)).collect();
        Self {
            profiles: RwLock::new(map),
        }
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_user(&self, user_id: i64) -> AppResult<Option<PlayerProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    prefs: RwLock<HashMap<i64, UserPreference>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn find_by_user(&self, user_id: i64) -> AppResult<Option<UserPreference>> {
        Ok(self.prefs.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, pref: &UserPreference) -> AppResult<()> {
        self.prefs.write().await.insert(pref.user_id, pref.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFeedbackLog {
    events: RwLock<Vec<FeedbackEvent>>,
}

impl MemoryFeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, oldest first.
    pub async fn events(&self) -> Vec<FeedbackEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait::async_trait]
impl FeedbackLog for MemoryFeedbackLog {
    async fn append(&self, event: &FeedbackEvent) -> AppResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
