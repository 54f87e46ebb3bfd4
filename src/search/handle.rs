use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::error::AppResult;

use super::index::TfidfIndex;
use super::persist;

/// Explicitly owned handle to the active index snapshot.
///
/// Searches take a cheap `Arc` clone and run without holding the lock, so an
/// in-flight search keeps ranking against the snapshot it started with while
/// `swap` installs a rebuilt index for new callers. Readers observe either
/// the fully old or fully new index, never a mix.
pub struct IndexHandle {
    current: RwLock<Arc<TfidfIndex>>,
}

impl IndexHandle {
    pub fn new(index: TfidfIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Starts with a valid empty index; every search returns no hits until
    /// the first rebuild lands.
    pub fn empty() -> Self {
        Self::new(TfidfIndex::default())
    }

    /// Loads the persisted blob at `path` into a fresh handle.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        Ok(Self::new(persist::load_index(path)?))
    }

    /// The active snapshot. Callers may hold it as long as they like.
    pub fn snapshot(&self) -> Arc<TfidfIndex> {
        self.current.read().clone()
    }

    /// Atomically replaces the active snapshot.
    pub fn swap(&self, index: TfidfIndex) {
        let next = Arc::new(index);
        *self.current.write() = next;
    }
}
