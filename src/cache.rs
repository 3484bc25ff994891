use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::aggregator::SearchResponse;

struct CacheEntry {
    stored_at: Instant,
    response: Arc<SearchResponse>,
}

/// In-memory result cache keyed by the lowercased term. Entries expire
/// after `ttl`. Every insert first sweeps out expired entries, so the map
/// only ever holds terms searched within the last `ttl`.
pub struct ResultCache {
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<SearchResponse>> {
        match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(Arc::clone(&entry.response));
            }
            Some(_) => {}
            None => return None,
        }
        // shard guard must be released before removing
        self.entries
            .remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: &str, response: Arc<SearchResponse>) {
        let purged = self.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "evicted expired search results");
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                response,
            },
        );
    }

    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
