// ABOUTME: Redis storage backend over a shared ConnectionManager
// ABOUTME: Covers both store traits; namespace prefix isolates co-tenants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use super::{OptionStore, StoreResult, TransientKey, TransientStore};
use crate::config::RedisSettings;
use crate::errors::StoreError;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Redis backend implementing both store traits.
///
/// Uses a [`ConnectionManager`] for automatic reconnection. Every key
/// (including glob patterns) gets the configured namespace prefix, so
/// several sites can share one Redis without touching each other's data.
/// Transient expiry rides on native Redis TTLs; pattern deletes use
/// cursor-based SCAN so large keyspaces are never blocked.
#[derive(Clone)]
pub struct RedisStorage {
    manager: ConnectionManager,
    namespace: String,
}

impl RedisStorage {
    /// Connect to Redis with the configured retry/backoff policy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the server cannot be
    /// reached within the configured retries.
    pub async fn connect(settings: &RedisSettings) -> StoreResult<Self> {
        info!(
            "Connecting to Redis at {} (timeout={}s, retries={})",
            settings.url, settings.connection_timeout_secs, settings.initial_connection_retries
        );

        let client = redis::Client::open(settings.url.as_str())
            .map_err(|e| StoreError::Unavailable(format!("invalid Redis URL: {e}")))?;

        let manager = Self::connect_with_retry(&client, settings).await?;
        info!("Successfully connected to Redis");

        Ok(Self {
            manager,
            namespace: settings.namespace.clone(),
        })
    }

    /// Connect with exponential backoff on initial-connection failure.
    async fn connect_with_retry(
        client: &redis::Client,
        settings: &RedisSettings,
    ) -> StoreResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(settings.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(settings.response_timeout_secs))
            .set_number_of_retries(settings.reconnection_retries)
            .set_exponent_base(settings.retry_exponent_base)
            .set_max_delay(settings.max_retry_delay_ms);

        let max_retries = settings.initial_connection_retries;
        let mut delay_ms = settings.initial_retry_delay_ms;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < max_retries {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            max_retries + 1,
                            delay_ms,
                            last_error
                                .as_ref()
                                .map_or_else(|| "unknown".to_owned(), ToString::to_string)
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(settings.max_retry_delay_ms);
                    }
                }
            }
        }

        Err(StoreError::Unavailable(format!(
            "failed to connect to Redis after {} attempts: {}",
            max_retries + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn backend_err(op: &str, e: &redis::RedisError) -> StoreError {
        error!("Redis {op} operation failed: {e}");
        StoreError::Backend(format!("{op}: {e}"))
    }

    /// Verify the connection with PING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when Redis does not answer PONG.
    pub async fn health_check(&self) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(format!("PING failed: {e}")))?;

        if response == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "unexpected PING response '{response}'"
            )))
        }
    }

    /// Delete every namespaced key matching `pattern` via cursor-based SCAN.
    async fn scan_delete(&self, pattern: &str) -> StoreResult<u64> {
        let scoped_pattern = self.scoped(pattern);
        let mut conn = self.manager.clone();
        let mut count = 0u64;
        let mut cursor = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&scoped_pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| Self::backend_err("SCAN", &e))?;

            if !keys.is_empty() {
                let deleted: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| Self::backend_err("DEL", &e))?;
                count += deleted;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(count)
    }
}

#[async_trait::async_trait]
impl OptionStore for RedisStorage {
    async fn get_option(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        let mut conn = self.manager.clone();
        let data: Option<Vec<u8>> = conn
            .get(self.scoped(key))
            .await
            .map_err(|e| Self::backend_err("GET", &e))?;

        match data {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update_option(&self, key: &str, value: &serde_json::Value) -> StoreResult<()> {
        let serialized = serde_json::to_vec(value)?;
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(self.scoped(key), serialized)
            .await
            .map_err(|e| Self::backend_err("SET", &e))?;
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.manager.clone();
        let removed: u64 = conn
            .del(self.scoped(key))
            .await
            .map_err(|e| Self::backend_err("DEL", &e))?;
        Ok(removed > 0)
    }
}

#[async_trait::async_trait]
impl TransientStore for RedisStorage {
    async fn set_transient<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        let serialized = serde_json::to_vec(value)?;
        let redis_key = self.scoped(&key.to_string());
        let mut conn = self.manager.clone();

        match ttl {
            Some(ttl) => {
                // SETEX writes value and expiry atomically.
                conn.set_ex::<_, _, ()>(&redis_key, serialized, ttl.as_secs())
                    .await
                    .map_err(|e| Self::backend_err("SETEX", &e))?;
            }
            None => {
                conn.set::<_, _, ()>(&redis_key, serialized)
                    .await
                    .map_err(|e| Self::backend_err("SET", &e))?;
            }
        }
        Ok(())
    }

    async fn set_transient_nx<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let serialized = serde_json::to_vec(value)?;
        let redis_key = self.scoped(&key.to_string());
        let mut conn = self.manager.clone();

        // SET NX EX replies OK when the key was free, nil when it was held.
        let reply: Option<String> = redis::cmd("SET")
            .arg(&redis_key)
            .arg(serialized)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::backend_err("SET NX", &e))?;

        Ok(reply.is_some())
    }

    async fn get_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>> {
        let mut conn = self.manager.clone();
        let data: Option<Vec<u8>> = conn
            .get(self.scoped(&key.to_string()))
            .await
            .map_err(|e| Self::backend_err("GET", &e))?;

        match data {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn take_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>> {
        let mut conn = self.manager.clone();

        // GETDEL reads and removes in one round trip.
        let data: Option<Vec<u8>> = redis::cmd("GETDEL")
            .arg(self.scoped(&key.to_string()))
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::backend_err("GETDEL", &e))?;

        match data {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete_transient(&self, key: &TransientKey) -> StoreResult<bool> {
        let mut conn = self.manager.clone();
        let removed: u64 = conn
            .del(self.scoped(&key.to_string()))
            .await
            .map_err(|e| Self::backend_err("DEL", &e))?;
        Ok(removed > 0)
    }

    async fn delete_transients_matching(&self, pattern: &str) -> StoreResult<u64> {
        // Validate locally so both backends reject the same patterns.
        glob::Pattern::new(pattern).map_err(|_| StoreError::InvalidPattern(pattern.to_owned()))?;
        self.scan_delete(pattern).await
    }
}
