// crates/selectkit-core/src/cache.rs

//! # Suggestion Cache
//!
//! Keyed, TTL-based memo of asynchronous lookups shared by every picker of
//! one type.
//!
//! - A fresh entry (`now - fetched_at < ttl`) is returned without fetching.
//! - A fetch already in flight for the same key is joined, not repeated.
//! - Failures are never stored; the next `get` fetches again.
//! - Growth is bounded: expired entries are purged and the oldest ones
//!   evicted once `capacity` is exceeded. Fetches nobody awaits any more are
//!   released on the same passes.
//!
//! The handle is a cheap `Rc` clone. Everything runs on one logical thread,
//! so the shared state sits in a `RefCell` and no borrow is ever held across
//! an `.await`.

use crate::clock::{Clock, Timestamp};
use crate::common::{Candidate, Query, SearchOutcome};
use crate::config::{CacheConfig, TtlClass};
use crate::error::FetchError;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

pub type FetchResult = Result<Vec<Candidate>, FetchError>;

type SharedFetch = Shared<LocalBoxFuture<'static, FetchResult>>;

/// One stored result set.
#[derive(Debug, Clone)]
pub struct SuggestionCacheEntry {
    pub key: String,
    pub results: Vec<Candidate>,
    pub fetched_at: Timestamp,
    pub ttl: Duration,
}

impl SuggestionCacheEntry {
    fn is_fresh(&self, now: Timestamp, ttl: Duration) -> bool {
        now.saturating_since(self.fetched_at) < ttl
    }

    fn is_expired(&self, now: Timestamp) -> bool {
        !self.is_fresh(now, self.ttl)
    }
}

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub evictions: u64,
    pub failures: u64,
}

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

struct Inner {
    entries: HashMap<String, SuggestionCacheEntry>,
    in_flight: HashMap<String, InFlight>,
    next_generation: u64,
    config: CacheConfig,
    stats: CacheStats,
}

impl Inner {
    /// Records a finished fetch, unless the key was invalidated meanwhile.
    fn settle(&mut self, key: &str, generation: u64, result: &FetchResult, now: Timestamp, ttl: Duration) {
        match self.in_flight.get(key) {
            Some(flight) if flight.generation == generation => {
                self.in_flight.remove(key);
            }
            _ => {
                tracing::debug!(key, "discarding fetch for invalidated cache key");
                return;
            }
        }

        match result {
            Ok(results) => {
                self.entries.insert(
                    key.to_string(),
                    SuggestionCacheEntry {
                        key: key.to_string(),
                        results: results.clone(),
                        fetched_at: now,
                        ttl,
                    },
                );
                self.enforce_capacity(now);
            }
            Err(e) => {
                self.stats.failures += 1;
                tracing::warn!(key, error = %e, "suggestion fetch failed; not cached");
            }
        }
    }

    /// Drops in-flight fetches whose only remaining handle is the map's own.
    fn release_abandoned(&mut self) -> usize {
        let before = self.in_flight.len();
        self.in_flight
            .retain(|_, flight| flight.future.strong_count().is_some_and(|n| n > 1));
        let released = before - self.in_flight.len();
        if released > 0 {
            tracing::debug!(released, "released abandoned suggestion fetches");
        }
        released
    }

    fn purge_expired(&mut self, now: Timestamp) -> usize {
        self.release_abandoned();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        let purged = before - self.entries.len();
        self.stats.evictions += purged as u64;
        purged
    }

    fn enforce_capacity(&mut self, now: Timestamp) {
        self.release_abandoned();
        if self.entries.len() <= self.config.capacity {
            return;
        }
        self.purge_expired(now);
        while self.entries.len() > self.config.capacity {
            let oldest = self
                .entries
                .values()
                .min_by_key(|e| e.fetched_at)
                .map(|e| e.key.clone());
            let Some(key) = oldest else { break };
            self.entries.remove(&key);
            self.stats.evictions += 1;
            tracing::debug!(key = %key, "evicted oldest suggestion entry");
        }
    }
}

#[derive(Clone)]
pub struct SuggestionCache {
    inner: Rc<RefCell<Inner>>,
    clock: Rc<dyn Clock>,
}

impl std::fmt::Debug for SuggestionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SuggestionCache")
            .field("entries", &inner.entries.len())
            .field("in_flight", &inner.in_flight.len())
            .field("stats", &inner.stats)
            .finish()
    }
}

impl SuggestionCache {
    pub fn new(config: CacheConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                next_generation: 0,
                config,
                stats: CacheStats::default(),
            })),
            clock,
        }
    }

    pub fn ttl(&self, class: TtlClass) -> Duration {
        self.inner.borrow().config.ttl(class)
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    /// Returns the cached results for `key` if fresh, joins an in-flight
    /// fetch, or starts a new one with `fetcher`.
    ///
    /// `fetcher` is only called when a new fetch is actually needed.
    pub async fn get<F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult> + 'static,
    {
        let joined = {
            let mut inner = self.inner.borrow_mut();
            let now = self.clock.now();
            if let Some(entry) = inner.entries.get(key) {
                if entry.is_fresh(now, ttl) {
                    let results = entry.results.clone();
                    inner.stats.hits += 1;
                    tracing::debug!(key, "suggestion cache hit");
                    return Ok(results);
                }
            }
            let joined = inner.in_flight.get(key).map(|flight| flight.future.clone());
            if joined.is_some() {
                inner.stats.coalesced += 1;
                tracing::debug!(key, "joining in-flight suggestion fetch");
            } else {
                inner.stats.misses += 1;
            }
            joined
        };
        if let Some(future) = joined {
            return future.await;
        }

        // The borrow is released before user code runs.
        let fetch = fetcher();
        let future = {
            let mut inner = self.inner.borrow_mut();
            let now = self.clock.now();
            inner.enforce_capacity(now);
            inner.next_generation += 1;
            let generation = inner.next_generation;
            let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
            let clock = Rc::clone(&self.clock);
            let owned_key = key.to_string();
            let future = async move {
                let result = fetch.await;
                if let Some(inner) = weak.upgrade() {
                    inner
                        .borrow_mut()
                        .settle(&owned_key, generation, &result, clock.now(), ttl);
                }
                result
            }
            .boxed_local()
            .shared();
            inner.in_flight.insert(
                key.to_string(),
                InFlight {
                    generation,
                    future: future.clone(),
                },
            );
            tracing::debug!(key, "suggestion cache miss; fetching");
            future
        };
        future.await
    }

    /// Free-text lookup gated by a minimum query length.
    ///
    /// Queries whose normalized key is shorter than `min_len` characters
    /// resolve to [`SearchStatus::TooShort`](crate::SearchStatus::TooShort)
    /// without calling `fetcher`. Results are keyed by query and `limit`, so
    /// pickers asking for different page sizes never share a truncated list.
    pub async fn suggest<F, Fut>(
        &self,
        query: &Query,
        min_len: usize,
        limit: usize,
        ttl: Duration,
        fetcher: F,
    ) -> SearchOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult> + 'static,
    {
        if query.normalized_key.chars().count() < min_len {
            return SearchOutcome::too_short();
        }
        let key = search_key(query, limit);
        SearchOutcome::from_fetch(self.get(&key, ttl, fetcher).await)
    }

    /// Drops `key` and detaches any in-flight fetch for it; that fetch's
    /// eventual result is returned to its waiters but not stored.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.entries.remove(key);
        inner.in_flight.remove(key);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.entries.clear();
        inner.in_flight.clear();
    }

    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.inner.borrow_mut().purge_expired(now)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.inner.borrow().in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight_len(&self) -> usize {
        self.inner.borrow().in_flight.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.borrow().stats
    }
}

/// Cache key of a free-text search.
pub fn search_key(query: &Query, limit: usize) -> String {
    format!("q:{limit}:{}", query.normalized_key)
}
