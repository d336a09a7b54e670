//! In-process cache backed by DashMap for lock-free concurrent access.
//! Serves as L1 in front of the Redis-backed L2 to reduce network round trips.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: Instant,
}

/// Lock-free local cache, generic over the value stored (baseline, weights,
/// deployment-event lists, ...). Returns `Arc<V>` to avoid cloning on hit.
pub struct LocalCache<V> {
    store: Arc<DashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V> LocalCache<V> {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            store: Arc::new(DashMap::with_capacity(max_entries.min(1024))),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let entry = self.store.get(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    pub fn put(&self, key: String, value: V) {
        self.put_arc(key, Arc::new(value));
    }

    pub fn put_arc(&self, key: String, value: Arc<V>) {
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            self.evict_one_expired();
            if self.store.len() >= self.max_entries {
                return;
            }
        }
        self.store.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    fn evict_one_expired(&self) {
        let mut to_remove = None;
        for entry in self.store.iter() {
            if entry.value().inserted_at.elapsed() > self.ttl {
                to_remove = Some(entry.key().clone());
                break;
            }
        }
        if let Some(key) = to_remove {
            self.store.remove(&key);
        }
    }

    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
