use std::collections::{HashMap, HashSet};

use crate::error::AppResult;
use crate::models::{CatalogEntry, FeedbackEvent, LibraryStat, PlayerProfile, UserPreference};

pub mod memory;
pub mod postgres;

pub use postgres::create_pool;

/// Game catalog metadata, keyed by external app id.
///
/// The only write path is `upsert`, used by enrichment and bulk import; the
/// request path is read-only.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get(&self, app_id: i64) -> AppResult<Option<CatalogEntry>>;

    /// Bulk lookup; absent ids are simply missing from the result map.
    async fn get_many(&self, app_ids: &[i64]) -> AppResult<HashMap<i64, CatalogEntry>>;

    /// Every (app id, document text) pair with a non-empty document, for
    /// index building.
    async fn all_documents(&self) -> AppResult<Vec<(i64, String)>>;

    async fn all_app_ids(&self) -> AppResult<HashSet<i64>>;

    async fn upsert(&self, entry: CatalogEntry) -> AppResult<()>;
}

/// Per-profile owned-game playtime facts.
#[async_trait::async_trait]
pub trait LibraryStore: Send + Sync {
    async fn list_by_profile(&self, profile_id: &str) -> AppResult<Vec<LibraryStat>>;
}

/// Account-to-external-profile bindings.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> AppResult<Option<PlayerProfile>>;
}

/// Learned preference state, one row per user.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> AppResult<Option<UserPreference>>;

    async fn upsert(&self, pref: &UserPreference) -> AppResult<()>;
}

/// Append-only feedback event log.
#[async_trait::async_trait]
pub trait FeedbackLog: Send + Sync {
    async fn append(&self, event: &FeedbackEvent) -> AppResult<()>;
}
