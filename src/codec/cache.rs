//! Discovery cache: boards reached at runtime that have no dictionary key.
//!
//! A bounded LRU map from board to short key. Losing an entry only makes
//! the next token for that board longer, so a poisoned lock is recovered
//! rather than propagated.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;
use tracing::debug;

use super::types::Board;

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Thread-safe LRU of board → key.
#[derive(Debug)]
pub struct DiscoveryCache {
    inner: Mutex<LruCache<Board, String>>,
    capacity: NonZeroUsize,
}

impl DiscoveryCache {
    /// Create a cache holding at most `capacity` entries. Zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    /// Key for `board`, refreshing its recency.
    pub fn get(&self, board: &Board) -> Option<String> {
        self.lock().get(board).cloned()
    }

    /// Insert or overwrite the key for `board` and mark it most recent.
    pub fn put(&self, board: Board, key: String) {
        if let Some((evicted, _)) = self.lock().push(board.clone(), key) {
            if evicted != board {
                debug!(board = %evicted, "discovery cache evicted");
            }
        }
    }

    /// Insert only when `board` has no entry yet. Returns the key now held.
    pub fn get_or_insert(&self, board: Board, key: String) -> String {
        let mut cache = self.lock();
        if let Some(existing) = cache.get(&board) {
            return existing.clone();
        }
        debug!(%board, %key, "discovered short key");
        if let Some((evicted, _)) = cache.push(board, key.clone()) {
            debug!(board = %evicted, "discovery cache evicted");
        }
        key
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<Board, String>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DiscoveryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
