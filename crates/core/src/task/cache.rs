//! Query result cache
//!
//! Memoizes paginated task listings keyed by the canonical filter key.
//! Entries expire after a fixed TTL; any task write flushes every entry,
//! not just those matching the written task. Concurrent misses for one
//! key may each compute the page, and the last insert wins.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use super::model::TaskPage;

/// How long entries stay fresh without an explicit flush
const CACHE_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    page: TaskPage,
    stored_at: Instant,
}

/// TTL cache over paginated query results
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// Cache with a custom TTL; tests use this to force expiry
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh copy stored under `key`, if any
    pub async fn get(&self, key: &str) -> Option<TaskPage> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.page.clone())
    }

    /// Store a page under `key`, replacing any previous entry
    pub async fn insert(&self, key: String, page: TaskPage) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                page,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every cached page
    pub async fn flush(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        debug!("Flushed task query cache ({} entries)", dropped);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
