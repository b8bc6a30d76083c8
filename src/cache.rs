//! Shared file-content cache used by frames during a pipeline run.
//!
//! Entries are keyed by path + mtime so a file edited mid-run is re-read.
//! Total cached bytes are bounded; least-recently-used entries are evicted
//! when the budget is exceeded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::trace;

/// Default total-bytes budget: 256 MiB
pub const DEFAULT_CACHE_BUDGET_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    mtime: Option<SystemTime>,
}

#[derive(Debug)]
struct CacheEntry {
    content: Arc<str>,
    size: u64,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    total_bytes: u64,
    clock: u64,
    hits: u64,
    misses: u64,
}

/// Bounded LRU content cache shared across frames through the context
#[derive(Debug)]
pub struct ContentCache {
    inner: Mutex<CacheInner>,
    budget_bytes: u64,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub hits: u64,
    pub misses: u64,
}

impl ContentCache {
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            budget_bytes,
        }
    }

    /// Read a file through the cache. Non-UTF-8 content is lossily decoded;
    /// frames operate on text.
    pub async fn read(&self, path: &Path) -> std::io::Result<Arc<str>> {
        let mtime = tokio::fs::metadata(path)
            .await
            .ok()
            .and_then(|m| m.modified().ok());
        let key = CacheKey {
            path: path.to_path_buf(),
            mtime,
        };

        {
            let mut inner = self.inner.lock().await;
            inner.clock += 1;
            let clock = inner.clock;
            if let Some(entry) = inner.entries.get_mut(&key) {
                entry.last_used = clock;
                inner.hits += 1;
                return Ok(Arc::clone(&inner.entries[&key].content));
            }
            inner.misses += 1;
        }

        let bytes = tokio::fs::read(path).await?;
        let content: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes).into_owned());
        let size = content.len() as u64;

        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let clock = inner.clock;

        // a single oversize file is served uncached
        if size <= self.budget_bytes {
            inner.total_bytes += size;
            inner.entries.insert(
                key,
                CacheEntry {
                    content: Arc::clone(&content),
                    size,
                    last_used: clock,
                },
            );
            while inner.total_bytes > self.budget_bytes {
                let Some(evict_key) = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_used)
                    .map(|(k, _)| k.clone())
                else {
                    break;
                };
                if let Some(evicted) = inner.entries.remove(&evict_key) {
                    inner.total_bytes -= evicted.size;
                    trace!("evicted {} from content cache", evict_key.path.display());
                }
            }
        }

        Ok(content)
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            entries: inner.entries.len(),
            total_bytes: inner.total_bytes,
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_BUDGET_BYTES)
    }
}
