//! In-memory result cache in front of a [`QueryClient`].
//!
//! Entries are keyed by the serialized query body, so two recipes that build
//! the same query share a result. Failed queries are never cached.

use crate::config::CacheConfig;
use crate::error::Result;
use crate::query::{Query, QueryClient, QueryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// A cached backend result with its fetch time.
struct CachedResult {
    result: QueryResult,
    fetched_at: Instant,
}

/// Query client decorator that reuses results for `ttl`.
pub struct CachingQueryClient {
    inner: Arc<dyn QueryClient>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedResult>>,
}

impl CachingQueryClient {
    /// Wraps `inner`, keeping results for `ttl`.
    pub fn new(inner: Arc<dyn QueryClient>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Wraps `inner` when caching is enabled in `config`, else returns it as is.
    pub fn wrap(inner: Arc<dyn QueryClient>, config: &CacheConfig) -> Arc<dyn QueryClient> {
        if config.enabled {
            tracing::debug!(ttl_secs = config.ttl_secs, "Query cache enabled");
            Arc::new(Self::new(inner, Duration::from_secs(config.ttl_secs)))
        } else {
            inner
        }
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    /// Returns whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<QueryResult> {
        let entries = self.entries.read().ok()?;
        let cached = entries.get(key)?;
        if cached.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(cached.result.clone())
    }

    fn store(&self, key: String, result: &QueryResult) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, cached| cached.fetched_at.elapsed() < self.ttl);
            entries.insert(
                key,
                CachedResult {
                    result: result.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
    }
}

#[async_trait]
impl QueryClient for CachingQueryClient {
    async fn run(&self, query: &Query) -> Result<QueryResult> {
        let key = serde_json::to_string(&query.body)?;
        if let Some(result) = self.lookup(&key) {
            tracing::debug!(query = %query.name, "Query cache hit");
            return Ok(result);
        }

        let result = self.inner.run(query).await?;
        self.store(key, &result);
        Ok(result)
    }
}

impl std::fmt::Debug for CachingQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingQueryClient")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
