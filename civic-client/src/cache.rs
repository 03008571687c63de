//! Query cache
//!
//! Keyed like the views key their queries: `["issues"]`,
//! `["issues", "officer", "open"]`, `["issue", "<id>"]`. Invalidating a
//! prefix marks every key under it stale; the next `get_or_fetch` refetches.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::ClientResult;

pub type QueryKey = Vec<String>;

/// Root key of every issue query
pub const ISSUES_KEY: &str = "issues";

pub fn query_key(parts: &[&str]) -> QueryKey {
    parts.iter().map(|p| (*p).to_string()).collect()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stale: bool,
}

pub struct QueryCache {
    entries: DashMap<QueryKey, CacheEntry>,
    invalidations: AtomicU64,
    tx: broadcast::Sender<QueryKey>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            entries: DashMap::new(),
            invalidations: AtomicU64::new(0),
            tx,
        }
    }

    /// Cached value, stale or not
    pub fn get<T: DeserializeOwned>(&self, key: &[String]) -> Option<T> {
        let entry = self.entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn set<T: Serialize>(&self, key: QueryKey, value: &T) -> ClientResult<()> {
        let value = serde_json::to_value(value)?;
        self.entries.insert(key, CacheEntry { value, stale: false });
        Ok(())
    }

    pub fn is_stale(&self, key: &[String]) -> bool {
        self.entries.get(key).is_none_or(|e| e.stale)
    }

    /// Fresh cached value, or run `fetch` and cache its result
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if !self.is_stale(&key)
            && let Some(value) = self.get(&key)
        {
            return Ok(value);
        }

        let value = fetch().await?;
        self.set(key, &value)?;
        Ok(value)
    }

    /// Mark every key starting with `prefix` stale and tell subscribers
    ///
    /// Returns how many entries were marked. Counts as one invalidation
    /// regardless of matches.
    pub fn invalidate(&self, prefix: &[&str]) -> usize {
        let mut marked = 0;
        for mut entry in self.entries.iter_mut() {
            let matches = entry.key().len() >= prefix.len()
                && entry.key().iter().zip(prefix).all(|(k, p)| k == p);
            if matches {
                entry.value_mut().stale = true;
                marked += 1;
            }
        }
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        // nobody listening is fine
        let _ = self.tx.send(query_key(prefix));
        tracing::debug!(prefix = ?prefix, marked, "Query cache invalidated");
        marked
    }

    pub fn invalidation_count(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }

    /// Invalidated prefixes, for views that refetch eagerly
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
