//! Quote cache with stale-on-error fallback.
//!
//! Entries are never evicted by age. A fresh entry is served without touching the
//! network; a stale one is only served when a refresh attempt fails.

use analysis_core::QuoteRecord;
use dashmap::DashMap;

pub const DEFAULT_TTL_MS: i64 = 60_000;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: QuoteRecord,
    /// Epoch milliseconds of the successful fetch that produced `data`
    pub timestamp: i64,
}

/// Per-key state at a given instant
#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    Fresh(QuoteRecord),
    Stale(QuoteRecord),
    Absent,
}

impl CacheState {
    pub fn of(entry: Option<&CacheEntry>, now_ms: i64, ttl_ms: i64) -> Self {
        match entry {
            Some(e) if now_ms - e.timestamp < ttl_ms => CacheState::Fresh(e.data.clone()),
            Some(e) => CacheState::Stale(e.data.clone()),
            None => CacheState::Absent,
        }
    }
}

/// What to do with the outcome of a refresh attempt
#[derive(Debug)]
pub enum FetchResolution<E> {
    /// Fetch succeeded: store with a new timestamp and return it
    Store(QuoteRecord),
    /// Fetch failed but an older entry exists: return it, keep its timestamp, swallow the error
    ServeStale { data: QuoteRecord, error: E },
    /// Fetch failed and nothing was ever cached
    Fail(E),
}

/// Fallback policy, independent of any network code.
pub fn resolve_fetch<E>(state: CacheState, outcome: Result<QuoteRecord, E>) -> FetchResolution<E> {
    match (outcome, state) {
        (Ok(data), _) => FetchResolution::Store(data),
        (Err(error), CacheState::Fresh(data) | CacheState::Stale(data)) => {
            FetchResolution::ServeStale { data, error }
        }
        (Err(error), CacheState::Absent) => FetchResolution::Fail(error),
    }
}

/// Process-wide quote store keyed by upper-cased symbol. Concurrent writers for the
/// same key race; the last insert wins.
pub struct QuoteCache {
    entries: DashMap<String, CacheEntry>,
    ttl_ms: i64,
}

impl QuoteCache {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms,
        }
    }

    pub fn key(symbol: &str) -> String {
        symbol.trim().to_uppercase()
    }

    pub fn state_at(&self, symbol: &str, now_ms: i64) -> CacheState {
        let key = Self::key(symbol);
        let entry = self.entries.get(&key);
        CacheState::of(entry.as_deref(), now_ms, self.ttl_ms)
    }

    pub fn insert_at(&self, symbol: &str, data: QuoteRecord, now_ms: i64) {
        self.entries.insert(
            Self::key(symbol),
            CacheEntry {
                data,
                timestamp: now_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}
