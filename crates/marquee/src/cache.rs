//! Resolved-list cache: bounded, time-expiring, keyed by stable id.
//!
//! ## Eviction
//!
//! When a new key arrives and the cache is at capacity, the entry with the
//! oldest insertion time is evicted. Overwriting a key counts as a fresh
//! insertion. Entries older than the TTL are never returned and are removed
//! lazily on lookup or when they reach the front of the eviction queue.

use crate::types::TitleRecord;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default maximum number of distinct lists held.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default lifetime of a cached list (one day).
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Capacity and TTL for a [`ListCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

struct CacheEntry {
    items: Vec<TitleRecord>,
    inserted_at: Instant,
    /// Insertion sequence number, matched against the eviction queue.
    seq: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order. Records whose seq no longer matches the live entry
    /// are stale and skipped.
    order: VecDeque<(u64, String)>,
    next_seq: u64,
}

impl CacheState {
    fn evict_oldest(&mut self) -> Option<String> {
        while let Some((seq, key)) = self.order.pop_front() {
            let live = self.entries.get(&key).is_some_and(|e| e.seq == seq);
            if live {
                self.entries.remove(&key);
                return Some(key);
            }
        }
        None
    }

    /// Drop stale queue records once they outnumber live entries.
    fn compact(&mut self) {
        if self.order.len() <= self.entries.len() * 2 + 16 {
            return;
        }
        let entries = &self.entries;
        self.order
            .retain(|(seq, key)| entries.get(key).is_some_and(|e| e.seq == *seq));
    }
}

/// In-process store of resolved lists, safe to share between resolutions.
pub struct ListCache {
    state: Mutex<CacheState>,
    config: CacheConfig,
}

impl ListCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            config,
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.inserted_at.elapsed() >= self.config.ttl
    }

    /// Get the cached list for `stable_id` if present and fresh.
    pub fn get(&self, stable_id: &str) -> Option<Vec<TitleRecord>> {
        if stable_id.is_empty() {
            return None;
        }
        let mut state = self.lock();
        let expired = match state.entries.get(stable_id) {
            None => return None,
            Some(entry) => self.is_expired(entry),
        };
        if expired {
            state.entries.remove(stable_id);
            tracing::debug!("cache entry expired: {stable_id}");
            return None;
        }
        state.entries.get(stable_id).map(|e| e.items.clone())
    }

    /// Store `items` under `stable_id`, replacing any previous entry.
    ///
    /// An empty key is never stored.
    pub fn set(&self, stable_id: &str, items: Vec<TitleRecord>) {
        if stable_id.is_empty() || self.config.capacity == 0 {
            return;
        }
        let mut state = self.lock();

        if !state.entries.contains_key(stable_id) {
            while state.entries.len() >= self.config.capacity {
                match state.evict_oldest() {
                    Some(evicted) => tracing::debug!("evicting cached list: {evicted}"),
                    None => break,
                }
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.push_back((seq, stable_id.to_string()));
        state.entries.insert(
            stable_id.to_string(),
            CacheEntry {
                items,
                inserted_at: Instant::now(),
                seq,
            },
        );
        state.compact();
    }

    /// Number of held entries, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl Default for ListCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
