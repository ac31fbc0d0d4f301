//! Time-boxed in-memory response cache.
//!
//! Entries are keyed by URL plus the full query string. Archive responses for a
//! given key are idempotent, so concurrent writers simply race and the last
//! one wins.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use log::debug;

use crate::data::transport::{Query, Transport, TransportError};

#[derive(Debug, Clone)]
struct Entry {
    body: String,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key(url: &str, query: &Query) -> String {
        let params: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{url}?{}", params.join("&"))
    }

    /// Fresh body for `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        // A poisoned lock only means a writer panicked mid-insert; the map
        // itself is still a valid set of complete entries.
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| now.saturating_duration_since(e.stored_at) < self.ttl)
            .map(|e| e.body.clone())
    }

    pub fn insert(&self, key: String, body: String) {
        self.insert_at(key, body, Instant::now());
    }

    /// Store `body`, evicting whatever has expired by `stored_at`.
    fn insert_at(&self, key: String, body: String, stored_at: Instant) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let evicted = self.evict(&mut entries, stored_at);
        if evicted > 0 {
            debug!("evicted {evicted} expired response(s)");
        }
        if !self.ttl.is_zero() {
            entries.insert(key, Entry { body, stored_at });
        }
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        self.evict(&mut entries, Instant::now())
    }

    fn evict(&self, entries: &mut HashMap<String, Entry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.stored_at) < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serves fresh cached bodies and stores successful responses of `inner`.
pub struct Cached<T> {
    inner: T,
    cache: Arc<ResponseCache>,
}

impl<T> Cached<T> {
    pub fn new(inner: T, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for Cached<T> {
    fn get(&self, url: &str, query: &Query) -> Result<String, TransportError> {
        let key = ResponseCache::key(url, query);
        if let Some(body) = self.cache.get(&key) {
            debug!("cache hit: {key}");
            return Ok(body);
        }
        debug!("cache miss: {key}");
        let body = self.inner.get(url, query)?;
        self.cache.insert(key, body.clone());
        Ok(body)
    }
}
