//! TTL result cache in front of a [`QueryExecutor`].
//!
//! Entries are keyed by `"{label}:{digest}"` where the digest is a hex SHA-256
//! of the query text and its serialized binds. Staleness is checked lazily on
//! read; nothing runs in the background.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::executor::{BindValue, QueryExecutor, QueryResult};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_KEY_LENGTH: usize = 32;
const DEFAULT_LABEL: &str = "query";

/// How much of the SHA-256 hex digest goes into the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDigest {
    /// First `n` hex characters. Shorter keys trade collision resistance for size.
    Truncated(usize),
    Full,
}

impl Default for KeyDigest {
    fn default() -> Self {
        Self::Truncated(DEFAULT_KEY_LENGTH)
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub key_digest: KeyDigest,
    /// Collapse concurrent identical misses into one execution.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            key_digest: KeyDigest::default(),
            single_flight: false,
        }
    }
}

/// Per-call cache behaviour.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub ttl: Option<Duration>,
    pub use_cache: bool,
    pub label: String,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            use_cache: true,
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl CacheOptions {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Force execution and skip storing the result.
    pub fn bypass(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: QueryResult,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.stored_at + self.ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Process-wide query result cache. Create one at startup and share it via
/// `Arc`; tests build their own isolated instances.
pub struct ResultCache {
    executor: Arc<dyn QueryExecutor>,
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: CacheConfig) -> Self {
        Self {
            executor,
            config,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Derive the cache key for a query.
    pub fn cache_key(&self, label: &str, query: &str, binds: &[BindValue]) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        hasher.update(serde_json::to_vec(binds)?);
        let digest = hex::encode(hasher.finalize());
        let digest = match self.config.key_digest {
            KeyDigest::Truncated(n) => &digest[..n.clamp(1, digest.len())],
            KeyDigest::Full => digest.as_str(),
        };
        Ok(format!("{label}:{digest}"))
    }

    /// Return a fresh cached result or execute `query` and cache it.
    ///
    /// Only successful, non-empty results are stored. Executor errors are
    /// returned as [`Error::Execution`] and never cached.
    pub async fn get_or_execute(
        &self,
        query: &str,
        binds: &[BindValue],
        options: &CacheOptions,
    ) -> Result<QueryResult> {
        if !options.use_cache {
            tracing::trace!(label = %options.label, "Cache bypassed");
            return self.execute(query, binds).await;
        }

        let key = self.cache_key(&options.label, query, binds)?;
        if let Some(hit) = self.peek(&key).await {
            return Ok(self.record_hit(&key, hit));
        }

        if !self.config.single_flight {
            self.record_miss(&key);
            return self.execute_and_store(key, query, binds, options).await;
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = gate.lock().await;

        // Another caller may have filled the entry while we waited.
        let result = match self.peek(&key).await {
            Some(hit) => Ok(self.record_hit(&key, hit)),
            None => {
                self.record_miss(&key);
                self.execute_and_store(key.clone(), query, binds, options).await
            }
        };

        let mut in_flight = self.in_flight.lock().await;
        if Arc::strong_count(&gate) <= 2 {
            in_flight.remove(&key);
        }
        result
    }

    /// Read a fresh entry without touching the hit/miss counters. A stale
    /// entry is evicted.
    async fn peek(&self, key: &str) -> Option<QueryResult> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Stale: evict under the write lock, unless it was refreshed meanwhile.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(now) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
            tracing::debug!(cache_key = %key, "Cache entry expired");
        }
        None
    }

    fn record_hit(&self, key: &str, mut value: QueryResult) -> QueryResult {
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(cache_key = %key, "Cache hit");
        value.cached = true;
        value
    }

    fn record_miss(&self, key: &str) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(cache_key = %key, "Cache miss");
    }

    async fn execute_and_store(
        &self,
        key: String,
        query: &str,
        binds: &[BindValue],
        options: &CacheOptions,
    ) -> Result<QueryResult> {
        let result = self.execute(query, binds).await?;
        if result.row_count > 0 {
            let ttl = options.ttl.unwrap_or(self.config.default_ttl);
            let entry = CacheEntry {
                value: result.clone(),
                stored_at: Instant::now(),
                ttl,
            };
            self.entries.write().await.insert(key, entry);
        }
        Ok(result)
    }

    async fn execute(&self, query: &str, binds: &[BindValue]) -> Result<QueryResult> {
        let started = Instant::now();
        let rows = self
            .executor
            .execute(query, binds)
            .await
            .map_err(Error::Execution)?;
        let elapsed = started.elapsed();
        tracing::debug!(
            rows = rows.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Query executed"
        );
        Ok(QueryResult::new(rows, elapsed.as_millis() as u64))
    }

    /// Evict every key containing `pattern`, or everything when `None`.
    /// Returns the number of evicted entries.
    pub async fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        match pattern {
            Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
            None => entries.clear(),
        }
        let evicted = before - entries.len();
        tracing::info!(pattern = pattern.unwrap_or("*"), evicted, "Cache invalidated");
        evicted
    }

    /// Drop all expired entries now instead of waiting for the next read.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Row;
    use async_trait::async_trait;

    struct NullExecutor;

    #[async_trait]
    impl QueryExecutor for NullExecutor {
        async fn execute(&self, _sql: &str, _binds: &[BindValue]) -> anyhow::Result<Vec<Row>> {
            Ok(Vec::new())
        }
    }

    fn cache(key_digest: KeyDigest) -> ResultCache {
        ResultCache::new(
            Arc::new(NullExecutor),
            CacheConfig {
                key_digest,
                ..CacheConfig::default()
            },
        )
    }

    #[test]
    fn key_is_deterministic_and_bounded() {
        let c = cache(KeyDigest::Truncated(16));
        let a = c.cache_key("budget", "SELECT 1", &[]).unwrap();
        let b = c.cache_key("budget", "SELECT 1", &[]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), "budget:".len() + 16);
        assert!(a.starts_with("budget:"));
    }

    #[test]
    fn binds_change_the_key() {
        let c = cache(KeyDigest::Full);
        let a = c.cache_key("q", "SELECT $1", &[BindValue::Text("a".into())]).unwrap();
        let b = c.cache_key("q", "SELECT $1", &[BindValue::Text("b".into())]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), "q:".len() + 64);
    }

    #[test]
    fn oversized_truncation_uses_full_digest() {
        let c = cache(KeyDigest::Truncated(500));
        let key = c.cache_key("q", "SELECT 1", &[]).unwrap();
        assert_eq!(key.len(), "q:".len() + 64);
    }
}
