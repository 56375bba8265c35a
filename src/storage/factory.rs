// ABOUTME: Runtime storage backend selection behind one cloneable handle
// ABOUTME: Delegates both store traits to the configured backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use super::memory::MemoryStorage;
use super::redis::RedisStorage;
use super::{OptionStore, StoreResult, TransientKey, TransientStore};
use crate::config::{StorageBackend, StorageConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Storage handle that delegates to the configured backend.
///
/// Cloning is cheap; every component holds its own copy of the same
/// underlying backend.
#[derive(Clone)]
pub enum Storage {
    /// In-process backend.
    Memory(MemoryStorage),
    /// Redis backend.
    Redis(RedisStorage),
}

impl Storage {
    /// Build the backend named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the Redis backend is selected and the initial
    /// connection fails.
    pub async fn from_config(config: &StorageConfig) -> StoreResult<Self> {
        match config.backend {
            StorageBackend::Memory => {
                info!(
                    "Initializing in-memory storage (max transients: {})",
                    config.memory_max_entries
                );
                Ok(Self::Memory(MemoryStorage::new(config.memory_max_entries)))
            }
            StorageBackend::Redis => {
                info!("Initializing Redis storage");
                Ok(Self::Redis(RedisStorage::connect(&config.redis).await?))
            }
        }
    }

    /// Descriptive string for startup logging.
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory (in-process)",
            Self::Redis(_) => "redis (shared)",
        }
    }

    /// Verify the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend does not respond.
    pub async fn health_check(&self) -> StoreResult<()> {
        match self {
            Self::Memory(storage) => storage.health_check(),
            Self::Redis(storage) => storage.health_check().await,
        }
    }
}

#[async_trait::async_trait]
impl OptionStore for Storage {
    async fn get_option(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        match self {
            Self::Memory(storage) => storage.get_option(key).await,
            Self::Redis(storage) => storage.get_option(key).await,
        }
    }

    async fn update_option(&self, key: &str, value: &serde_json::Value) -> StoreResult<()> {
        match self {
            Self::Memory(storage) => storage.update_option(key, value).await,
            Self::Redis(storage) => storage.update_option(key, value).await,
        }
    }

    async fn delete_option(&self, key: &str) -> StoreResult<bool> {
        match self {
            Self::Memory(storage) => storage.delete_option(key).await,
            Self::Redis(storage) => storage.delete_option(key).await,
        }
    }
}

#[async_trait::async_trait]
impl TransientStore for Storage {
    async fn set_transient<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        match self {
            Self::Memory(storage) => storage.set_transient(key, value, ttl).await,
            Self::Redis(storage) => storage.set_transient(key, value, ttl).await,
        }
    }

    async fn set_transient_nx<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Duration,
    ) -> StoreResult<bool> {
        match self {
            Self::Memory(storage) => storage.set_transient_nx(key, value, ttl).await,
            Self::Redis(storage) => storage.set_transient_nx(key, value, ttl).await,
        }
    }

    async fn get_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>> {
        match self {
            Self::Memory(storage) => storage.get_transient(key).await,
            Self::Redis(storage) => storage.get_transient(key).await,
        }
    }

    async fn take_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>> {
        match self {
            Self::Memory(storage) => storage.take_transient(key).await,
            Self::Redis(storage) => storage.take_transient(key).await,
        }
    }

    async fn delete_transient(&self, key: &TransientKey) -> StoreResult<bool> {
        match self {
            Self::Memory(storage) => storage.delete_transient(key).await,
            Self::Redis(storage) => storage.delete_transient(key).await,
        }
    }

    async fn delete_transients_matching(&self, pattern: &str) -> StoreResult<u64> {
        match self {
            Self::Memory(storage) => storage.delete_transients_matching(pattern).await,
            Self::Redis(storage) => storage.delete_transients_matching(pattern).await,
        }
    }
}
