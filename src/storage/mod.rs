// ABOUTME: Storage abstraction over the host's option and transient stores
// ABOUTME: Pluggable backends (in-memory, Redis) behind serde-generic traits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Storage Layer
//!
//! The host exposes two generic key-value stores: a durable *option* store
//! for connection records and an expiring *transient* store for caches,
//! locks, and nonces. Both are modeled as traits with serde-generic methods
//! and implemented by two backends, selected at runtime by
//! [`factory::Storage`].
//!
//! Transient keys are typed ([`TransientKey`]) so every key this crate
//! writes stays inside the `pulseboard:` namespace.

/// Runtime backend selection
pub mod factory;
/// In-process backend for tests and single-site deployments
pub mod memory;
/// Redis backend for shared deployments
pub mod redis;

use crate::constants::keys;
use crate::errors::StoreError;
use crate::registry::ToolId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable key-value store for connection records.
///
/// Values are raw [`serde_json::Value`]s so callers can inspect legacy
/// shapes before deserializing into the current record type.
#[async_trait::async_trait]
pub trait OptionStore: Send + Sync + Clone {
    /// Read a stored option, `None` when the key was never written.
    async fn get_option(&self, key: &str) -> StoreResult<Option<serde_json::Value>>;

    /// Create or replace an option.
    async fn update_option(&self, key: &str, value: &serde_json::Value) -> StoreResult<()>;

    /// Delete an option; returns whether a value existed.
    async fn delete_option(&self, key: &str) -> StoreResult<bool>;
}

/// Expiring key-value store for summaries, locks, status, and nonces.
///
/// # Examples
///
/// ```rust,no_run
/// use pulseboard::registry::ToolId;
/// use pulseboard::storage::memory::MemoryStorage;
/// use pulseboard::storage::{TransientKey, TransientStore};
/// use std::time::Duration;
/// # async fn example() -> Result<(), pulseboard::errors::StoreError> {
///
/// let store = MemoryStorage::new(1024);
/// let key = TransientKey::Summary(ToolId::Mautic);
///
/// store
///     .set_transient(&key, &"payload", Some(Duration::from_secs(60)))
///     .await?;
/// let cached: Option<String> = store.get_transient(&key).await?;
/// assert_eq!(cached.as_deref(), Some("payload"));
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait TransientStore: Send + Sync + Clone {
    /// Store a value, expiring after `ttl` (`None` keeps it until deleted).
    async fn set_transient<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> StoreResult<()>;

    /// Store a value only when the key is absent; returns whether it was set.
    ///
    /// This is the run-lock primitive: check and set happen atomically.
    async fn set_transient_nx<T: Serialize + Send + Sync>(
        &self,
        key: &TransientKey,
        value: &T,
        ttl: Duration,
    ) -> StoreResult<bool>;

    /// Read a value, `None` when absent or expired.
    async fn get_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>>;

    /// Read and delete in one step, `None` when absent or expired.
    ///
    /// One-shot consumption for OAuth state nonces.
    async fn take_transient<T: for<'de> Deserialize<'de>>(
        &self,
        key: &TransientKey,
    ) -> StoreResult<Option<T>>;

    /// Delete a value; returns whether one existed.
    async fn delete_transient(&self, key: &TransientKey) -> StoreResult<bool>;

    /// Delete every key matching a glob pattern; returns how many went away.
    async fn delete_transients_matching(&self, pattern: &str) -> StoreResult<u64>;
}

/// Typed transient keys, rendered into namespaced strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransientKey {
    /// One tool's cached summary snapshot.
    Summary(ToolId),
    /// Singleton set-if-absent lock guarding the background sync run.
    SyncLock,
    /// Singleton observable sync status record.
    SyncStatus,
    /// One-shot OAuth state nonce awaiting its callback.
    OauthState(String),
}

impl fmt::Display for TransientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = keys::NAMESPACE;
        match self {
            Self::Summary(tool) => write!(f, "{ns}summary:{tool}"),
            Self::SyncLock => write!(f, "{ns}sync-lock"),
            Self::SyncStatus => write!(f, "{ns}sync-status"),
            Self::OauthState(nonce) => write!(f, "{ns}oauth-state:{nonce}"),
        }
    }
}
