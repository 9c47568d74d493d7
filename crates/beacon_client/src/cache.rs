use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use vigil_metrics::{CACHE_HITS, CACHE_MISSES, inc_int_counter_vec};

/// Share of entries dropped (by insertion age) when a store reaches its
/// size bound.
const EVICTION_SHARE: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 4096,
            ttl: Duration::from_secs(1800),
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct CacheInner<V> {
    entries: HashMap<u64, Entry<V>>,
    stats: CacheStats,
}

/// Bounded, TTL-expiring slot-keyed store. Finalized blocks and committees
/// are immutable, so entries never need invalidation beyond expiry.
pub struct SlotCache<V> {
    name: &'static str,
    config: CacheConfig,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> SlotCache<V> {
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        Self {
            name,
            config,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Presence check without touching the hit/miss stats.
    pub fn has(&self, slot: u64) -> bool {
        let inner = self.inner.lock();
        inner
            .entries
            .get(&slot)
            .is_some_and(|entry| entry.inserted_at.elapsed() < self.config.ttl)
    }

    pub fn get(&self, slot: u64) -> Option<V> {
        let mut inner = self.inner.lock();
        let expired = inner
            .entries
            .get(&slot)
            .is_some_and(|entry| entry.inserted_at.elapsed() >= self.config.ttl);
        if expired {
            inner.entries.remove(&slot);
        }

        let value = inner.entries.get(&slot).map(|entry| entry.value.clone());
        match value {
            Some(value) => {
                inner.stats.hits += 1;
                inc_int_counter_vec(&CACHE_HITS, &[self.name]);
                Some(value)
            }
            None => {
                inner.stats.misses += 1;
                inc_int_counter_vec(&CACHE_MISSES, &[self.name]);
                None
            }
        }
    }

    pub fn insert(&self, slot: u64, value: V) {
        let mut inner = self.inner.lock();
        if !inner.entries.contains_key(&slot) && inner.entries.len() >= self.config.max_size {
            Self::evict_oldest(&mut inner.entries, self.config.max_size / EVICTION_SHARE);
        }
        inner.entries.insert(
            slot,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop the `count` oldest entries by insertion time (approximate FIFO).
    fn evict_oldest(entries: &mut HashMap<u64, Entry<V>>, count: usize) {
        let mut by_age: Vec<(u64, Instant)> = entries
            .iter()
            .map(|(slot, entry)| (*slot, entry.inserted_at))
            .collect();
        by_age.sort_by_key(|(slot, inserted_at)| (*inserted_at, *slot));
        for (slot, _) in by_age.into_iter().take(count.max(1)) {
            entries.remove(&slot);
        }
    }

    /// Periodic sweep: remove entries older than the TTL.
    pub fn evict_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let ttl = self.config.ttl;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - inner.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
