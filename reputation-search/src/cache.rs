//! In-memory TTL cache for fetched results.
//!
//! [`ResultCache`] is an explicitly constructed service: the process
//! entry point builds one and hands clones to whoever needs it. Entries
//! carry their own time-to-live, capacity is bounded by `max_entries`,
//! and concurrent misses for the same key collapse into a single
//! producer call. Nothing is persisted.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::Expiry;

use crate::country::Country;
use crate::types::{SearchKind, SearchOptions};

/// Default capacity when none is configured.
pub const DEFAULT_MAX_ENTRIES: u64 = 500;

/// Composite cache key over every input that changes a fetch's result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed, whitespace-collapsed query.
    query: String,
    country: Option<Country>,
    language: Option<String>,
    max_results: usize,
    kind: SearchKind,
}

impl CacheKey {
    /// Build a deterministic key from a query, its scope and its kind.
    pub fn new(query: &str, options: &SearchOptions, kind: SearchKind) -> Self {
        Self {
            query: query
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
            country: options.country,
            language: options.language.as_ref().map(|l| l.to_ascii_lowercase()),
            max_results: options.max_results,
            kind,
        }
    }
}

/// A stored value plus its absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value.
    pub value: V,
    /// Wall-clock time after which the entry is recomputed.
    pub expires_at: DateTime<Utc>,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let expires_at = chrono::TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            value,
            expires_at,
            ttl,
        }
    }
}

/// Per-entry expiry: each entry lives for the TTL it was stored with.
struct EntryTtl;

impl<V> Expiry<CacheKey, Arc<CacheEntry<V>>> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry<V>>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from a stored entry (including single-flight waiters).
    pub hits: u64,
    /// Lookups that ran the producer.
    pub misses: u64,
    /// Entries currently held (approximate until pending tasks run).
    pub entries: u64,
}

/// Shared TTL cache with get-or-compute semantics.
///
/// Cloning is cheap; clones share storage and counters.
#[derive(Clone)]
pub struct ResultCache<V: Clone + Send + Sync + 'static> {
    inner: Cache<CacheKey, Arc<CacheEntry<V>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<V: Clone + Send + Sync + 'static> ResultCache<V> {
    /// Create a cache holding at most `max_entries` values.
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Return the live value for `key`, or run `producer` and store its
    /// result for `ttl`.
    ///
    /// The second element is `true` when the value came from the cache.
    /// Concurrent callers with the same key wait for one producer run
    /// and all but the caller that ran it see `true`.
    pub async fn get_or_set<F, Fut>(&self, key: CacheKey, ttl: Duration, producer: F) -> (V, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.get_or_set_with_ttl(key, move || async move { (producer().await, ttl) })
            .await
    }

    /// Like [`get_or_set`](Self::get_or_set), but the producer picks the
    /// TTL for the value it returns.
    pub async fn get_or_set_with_ttl<F, Fut>(&self, key: CacheKey, producer: F) -> (V, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = (V, Duration)>,
    {
        let produced = AtomicBool::new(false);
        let produced_ref = &produced;
        let entry = self
            .inner
            .get_with(key, async move {
                produced_ref.store(true, Ordering::Release);
                let (value, ttl) = producer().await;
                Arc::new(CacheEntry::new(value, ttl))
            })
            .await;

        let from_cache = !produced.load(Ordering::Acquire);
        if from_cache {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        (entry.value.clone(), from_cache)
    }

    /// Look up a live value without computing it.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        self.inner.get(key).await.map(|entry| entry.value.clone())
    }

    /// Counters since construction.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.inner.entry_count(),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn key(query: &str) -> CacheKey {
        CacheKey::new(query, &SearchOptions::default(), SearchKind::Web)
    }

    const TTL: Duration = Duration::from_secs(600);

    #[test]
    fn cache_key_normalises_query() {
        assert_eq!(key("  Acme   CORP "), key("acme corp"));
    }

    #[test]
    fn cache_key_differs_by_scope_and_kind() {
        let fr = SearchOptions::for_country(Country::France, 10);
        let de = SearchOptions::for_country(Country::Germany, 10);
        assert_ne!(
            CacheKey::new("acme", &fr, SearchKind::Web),
            CacheKey::new("acme", &de, SearchKind::Web)
        );
        assert_ne!(
            CacheKey::new("acme", &fr, SearchKind::Web),
            CacheKey::new("acme", &fr, SearchKind::Press)
        );
        let fewer = SearchOptions {
            max_results: 5,
            ..fr.clone()
        };
        assert_ne!(
            CacheKey::new("acme", &fr, SearchKind::Web),
            CacheKey::new("acme", &fewer, SearchKind::Web)
        );
    }

    #[tokio::test]
    async fn second_call_returns_first_value() {
        let cache: ResultCache<String> = ResultCache::new(10);
        let (first, hit1) = cache
            .get_or_set(key("round-trip"), TTL, || async { "first".to_owned() })
            .await;
        let (second, hit2) = cache
            .get_or_set(key("round-trip"), TTL, || async { "second".to_owned() })
            .await;
        assert_eq!(first, "first");
        assert!(!hit1);
        assert_eq!(second, "first");
        assert!(hit2);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn expired_entry_is_recomputed() {
        let cache: ResultCache<u32> = ResultCache::new(10);
        let short = Duration::from_millis(30);
        let (v1, _) = cache.get_or_set(key("ttl"), short, || async { 1 }).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        let (v2, hit) = cache.get_or_set(key("ttl"), short, || async { 2 }).await;
        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
        assert!(!hit);
    }

    #[tokio::test]
    async fn entries_keep_their_own_ttl() {
        let cache: ResultCache<u32> = ResultCache::new(10);
        cache
            .get_or_set(key("short"), Duration::from_millis(30), || async { 1 })
            .await;
        cache.get_or_set(key("long"), TTL, || async { 2 }).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get(&key("short")).await.is_none());
        assert_eq!(cache.get(&key("long")).await, Some(2));
    }

    #[tokio::test]
    async fn independent_keys_do_not_collide() {
        let cache: ResultCache<&'static str> = ResultCache::new(10);
        cache.get_or_set(key("a"), TTL, || async { "A" }).await;
        cache.get_or_set(key("b"), TTL, || async { "B" }).await;
        assert_eq!(cache.get(&key("a")).await, Some("A"));
        assert_eq!(cache.get(&key("b")).await, Some("B"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_run_producer_once() {
        let cache: ResultCache<u32> = ResultCache::new(10);
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_set(key("flight"), TTL, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            7
                        })
                        .await
                })
            })
            .collect();

        let mut computed = 0;
        for task in tasks {
            let (value, from_cache) = task.await.expect("task");
            assert_eq!(value, 7);
            if !from_cache {
                computed += 1;
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(computed, 1);
    }

    #[tokio::test]
    async fn producer_chosen_ttl() {
        let cache: ResultCache<u32> = ResultCache::new(10);
        cache
            .get_or_set_with_ttl(key("picked"), || async { (1, Duration::from_millis(30)) })
            .await;
        let (_, hit) = cache
            .get_or_set_with_ttl(key("picked"), || async { (2, TTL) })
            .await;
        assert!(hit);
        tokio::time::sleep(Duration::from_millis(80)).await;
        let (value, hit) = cache
            .get_or_set_with_ttl(key("picked"), || async { (3, TTL) })
            .await;
        assert_eq!(value, 3);
        assert!(!hit);
    }

    #[test]
    fn entry_expiry_is_in_the_future() {
        let entry = CacheEntry::new(1u8, TTL);
        assert!(entry.expires_at > Utc::now());
    }
}
