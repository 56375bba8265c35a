// ABOUTME: In-process storage backend with LRU-bounded, TTL-aware transients
// ABOUTME: Expiry is lazy; entries are dropped when read after their deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use super::{OptionStore, StoreResult, TransientKey, TransientStore};
use crate::errors::StoreError;
use dashmap::DashMap;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// One transient entry with its optional expiry instant.
#[derive(Debug, Clone)]
struct TransientEntry {
    payload: Vec<u8>,
    expires_at: Option<Instant>,
}

impl TransientEntry {
    fn new(payload: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            payload,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process backend: options in a concurrent map, transients in a
/// locked LRU with lazy expiry.
#[derive(Clone)]
pub struct MemoryStorage {
    options: Arc<DashMap<String, serde_json::Value>>,
    transients: Arc<RwLock<LruCache<String, TransientEntry>>>,
}

impl MemoryStorage {
    /// Fallback capacity when a caller passes zero entries.
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a backend holding at most `max_entries` transients.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            options: Arc::new(DashMap::new()),
            transients: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Always healthy; exists for parity with the Redis backend.
    pub fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY.get())
    }
}

#[async_trait::async_trait]
impl OptionStore for MemoryStorage {
    async fn get_option(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.options.get(key).map(|entry| entry.value().clone()))
    }

    async fn update_option(&self, key: &str, value: &serde_json::Value) -> StoreResult<()> {
        self.options.insert(key.to_owned(), value.clone());
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> StoreResult<bool> {
        Ok(self.options.remove(key).is_some())
    }
}

#[async_trait::async_trait]
impl TransientStore for MemoryStorage {
    async fn set_transient<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        let payload = serde_json::to_vec(value)?;
        let entry = TransientEntry::new(payload, ttl);
        self.transients.write().await.push(key.to_string(), entry);
        Ok(())
    }

    async fn set_transient_nx<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let payload = serde_json::to_vec(value)?;
        let key = key.to_string();

        // Check and set under one write guard so concurrent callers cannot
        // both win the lock.
        let mut store = self.transients.write().await;
        if store.peek(&key).is_some_and(|entry| !entry.is_expired()) {
            drop(store);
            return Ok(false);
        }
        store.push(key, TransientEntry::new(payload, Some(ttl)));
        drop(store);
        Ok(true)
    }

    async fn get_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>> {
        let key = key.to_string();
        let mut store = self.transients.write().await;

        // LruCache::get is mutable (it refreshes access order).
        if let Some(entry) = store.get(&key) {
            if entry.is_expired() {
                store.pop(&key);
                drop(store);
                return Ok(None);
            }
            let value: T = serde_json::from_slice(&entry.payload)?;
            drop(store);
            return Ok(Some(value));
        }
        drop(store);
        Ok(None)
    }

    async fn take_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>> {
        let key = key.to_string();
        let entry = self.transients.write().await.pop(&key);

        match entry {
            Some(entry) if !entry.is_expired() => {
                let value: T = serde_json::from_slice(&entry.payload)?;
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    async fn delete_transient(&self, key: &TransientKey) -> StoreResult<bool> {
        Ok(self
            .transients
            .write()
            .await
            .pop(&key.to_string())
            .is_some())
    }

    async fn delete_transients_matching(&self, pattern: &str) -> StoreResult<u64> {
        let glob_pattern = glob::Pattern::new(pattern)
            .map_err(|_| StoreError::InvalidPattern(pattern.to_owned()))?;

        let mut store = self.transients.write().await;
        let matching: Vec<String> = store
            .iter()
            .filter_map(|(k, _)| glob_pattern.matches(k).then(|| k.clone()))
            .collect();
        for key in &matching {
            store.pop(key);
        }
        let removed = matching.len() as u64;
        drop(store);
        Ok(removed)
    }
}
