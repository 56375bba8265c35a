// ABOUTME: Environment-driven application configuration with typed sub-configs
// ABOUTME: Storage backend selection, sync cadence, and OAuth redirect settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Configuration
//!
//! All knobs come from environment variables with documented defaults.
//! [`AppConfig::from_env`] never fails; unrecognized values fall back to
//! defaults so a half-configured site still boots.

use crate::constants::{env_config, schedule, ttl};
use std::env;
use std::fmt;
use std::time::Duration;

/// Which storage backend serves the option and transient stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// In-process maps; state lives and dies with the process.
    #[default]
    Memory,
    /// Redis; state is shared and survives restarts.
    Redis,
}

impl StorageBackend {
    /// Parse from string with fallback.
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "redis" => Self::Redis,
            _ => Self::Memory,
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

/// Redis connection and retry settings.
#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// Connection URL.
    pub url: String,
    /// Prefix prepended to every key, for shared Redis instances.
    pub namespace: String,
    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds.
    pub response_timeout_secs: u64,
    /// Reconnection retries after a dropped connection.
    pub reconnection_retries: usize,
    /// Exponential backoff base for reconnection delays.
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
    /// Retries for the initial connection at startup.
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds, doubling per attempt.
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: env_config::redis_url(),
            namespace: String::new(),
            connection_timeout_secs: 5,
            response_timeout_secs: 5,
            reconnection_retries: 6,
            retry_exponent_base: 2,
            max_retry_delay_ms: 5000,
            initial_connection_retries: 3,
            initial_retry_delay_ms: 500,
        }
    }
}

impl RedisSettings {
    /// Load Redis settings from environment.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env_config::redis_url(),
            namespace: env::var("PULSEBOARD_REDIS_NAMESPACE").unwrap_or_default(),
            connection_timeout_secs: parse_env("REDIS_CONNECTION_TIMEOUT_SECS")
                .unwrap_or(defaults.connection_timeout_secs),
            response_timeout_secs: parse_env("REDIS_RESPONSE_TIMEOUT_SECS")
                .unwrap_or(defaults.response_timeout_secs),
            reconnection_retries: parse_env("REDIS_RECONNECTION_RETRIES")
                .unwrap_or(defaults.reconnection_retries),
            retry_exponent_base: defaults.retry_exponent_base,
            max_retry_delay_ms: parse_env("REDIS_MAX_RETRY_DELAY_MS")
                .unwrap_or(defaults.max_retry_delay_ms),
            initial_connection_retries: parse_env("REDIS_INITIAL_CONNECTION_RETRIES")
                .unwrap_or(defaults.initial_connection_retries),
            initial_retry_delay_ms: defaults.initial_retry_delay_ms,
        }
    }
}

/// Storage layer configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend.
    pub backend: StorageBackend,
    /// Transient capacity for the in-memory backend.
    pub memory_max_entries: usize,
    /// Redis settings, used when the backend is [`StorageBackend::Redis`].
    pub redis: RedisSettings,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            memory_max_entries: env_config::memory_max_entries(),
            redis: RedisSettings::default(),
        }
    }
}

/// Background synchronization configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period of the recurring refresh.
    pub recurring_period: Duration,
    /// Delay before a connect-triggered one-shot refresh.
    pub kickoff_delay: Duration,
    /// TTL of the run lock.
    pub lock_ttl: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            recurring_period: schedule::RECURRING_SYNC,
            kickoff_delay: schedule::KICKOFF_DELAY,
            lock_ttl: Duration::from_secs(ttl::SYNC_LOCK_SECS),
        }
    }
}

/// Integration-manager configuration.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    /// Redirect URI handed to OAuth providers.
    pub oauth_redirect_uri: String,
    /// How long cached summaries stay readable.
    pub summary_ttl: Duration,
    /// How long an OAuth state nonce stays valid.
    pub oauth_state_ttl: Duration,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            oauth_redirect_uri: env_config::oauth_redirect_uri(),
            summary_ttl: Duration::from_secs(ttl::SUMMARY_SECS),
            oauth_state_ttl: Duration::from_secs(ttl::OAUTH_STATE_SECS),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Storage layer settings.
    pub storage: StorageConfig,
    /// Background sync cadence.
    pub sync: SyncConfig,
    /// Integration-manager settings.
    pub integration: IntegrationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let storage = StorageConfig {
            backend: StorageBackend::from_str_or_default(&env_config::storage_backend()),
            memory_max_entries: env_config::memory_max_entries(),
            redis: RedisSettings::from_env(),
        };

        let sync_defaults = SyncConfig::default();
        let sync = SyncConfig {
            recurring_period: parse_env("PULSEBOARD_SYNC_PERIOD_SECS")
                .map_or(sync_defaults.recurring_period, Duration::from_secs),
            kickoff_delay: parse_env("PULSEBOARD_SYNC_KICKOFF_DELAY_SECS")
                .map_or(sync_defaults.kickoff_delay, Duration::from_secs),
            lock_ttl: sync_defaults.lock_ttl,
        };

        let integration_defaults = IntegrationConfig::default();
        let integration = IntegrationConfig {
            oauth_redirect_uri: env_config::oauth_redirect_uri(),
            summary_ttl: integration_defaults.summary_ttl,
            oauth_state_ttl: integration_defaults.oauth_state_ttl,
        };

        Self {
            storage,
            sync,
            integration,
        }
    }

    /// One-line settings summary for startup logging.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "storage={} sync_period={}s kickoff_delay={}s summary_ttl={}s redirect_uri={}",
            self.storage.backend,
            self.sync.recurring_period.as_secs(),
            self.sync.kickoff_delay.as_secs(),
            self.integration.summary_ttl.as_secs(),
            self.integration.oauth_redirect_uri
        )
    }
}

/// Parse an environment variable, `None` when unset or malformed.
fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}
