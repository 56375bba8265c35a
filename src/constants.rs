// ABOUTME: Application constants organized by domain
// ABOUTME: TTLs, schedule periods, storage key naming, and env-driven defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Constants
//!
//! Constants are grouped by domain rather than dumped in one flat list.
//! Environment-driven defaults live in [`env_config`] so the bootstrap and
//! tests read them through one place.

use std::env;

/// Time-to-live values for transient records, in seconds.
pub mod ttl {
    /// Cached tool summaries stay readable for 30 minutes.
    pub const SUMMARY_SECS: u64 = 30 * 60;

    /// The background sync run lock expires after 5 minutes, so a crashed
    /// run cannot block refreshes forever.
    pub const SYNC_LOCK_SECS: u64 = 5 * 60;

    /// OAuth state nonces stay valid for 10 minutes.
    pub const OAUTH_STATE_SECS: u64 = 10 * 60;
}

/// Background synchronization cadence.
pub mod schedule {
    use std::time::Duration;

    /// Period of the recurring summary refresh.
    pub const RECURRING_SYNC: Duration = Duration::from_secs(60 * 60);

    /// Delay before a connect-triggered one-shot refresh runs.
    pub const KICKOFF_DELAY: Duration = Duration::from_secs(10);
}

/// Windows used by the stats aggregator.
pub mod stats {
    /// Recent-activity lookback for posts and comments, in days.
    pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

    /// Default lookback for the commerce activity card, in days.
    pub const COMMERCE_WINDOW_DAYS: i64 = 30;
}

/// Storage key naming.
///
/// Every key this crate writes is namespaced under `pulseboard:` so pattern
/// deletes can never touch foreign data in a shared backend.
pub mod keys {
    use crate::registry::ToolId;

    /// Namespace prefix shared by all option and transient keys.
    pub const NAMESPACE: &str = "pulseboard:";

    /// Option-store key holding one tool's [`crate::models::ConnectionRecord`].
    #[must_use]
    pub fn connection_option(tool: ToolId) -> String {
        format!("{NAMESPACE}connection:{tool}")
    }

    /// Glob matching every transient belonging to one tool.
    ///
    /// The summary is the only per-tool transient, and the pattern names its
    /// shape outright: a wildcard segment would also reach
    /// `connection:{tool}` option keys on backends where options and
    /// transients share one keyspace.
    #[must_use]
    pub fn tool_transient_pattern(tool: ToolId) -> String {
        format!("{NAMESPACE}summary:{tool}")
    }
}

/// Credential shape limits enforced by the connectors.
pub mod limits {
    /// Minimum accepted Mautic API key length.
    pub const MIN_API_KEY_LEN: usize = 16;

    /// Minimum accepted Clarity project key length.
    pub const MIN_PROJECT_KEY_LEN: usize = 6;

    /// Trailing characters left visible when masking an API key.
    pub const API_KEY_MASK_KEEP: usize = 6;

    /// Trailing characters left visible when masking a project key.
    pub const PROJECT_KEY_MASK_KEEP: usize = 5;

    /// Lifetime of a simulated OAuth access token, in seconds.
    pub const OAUTH_TOKEN_TTL_SECS: i64 = 60 * 60;
}

/// Environment-based configuration defaults.
pub mod env_config {
    use super::env;

    /// Storage backend selector (`memory` or `redis`).
    #[must_use]
    pub fn storage_backend() -> String {
        env::var("PULSEBOARD_STORAGE").unwrap_or_else(|_| "memory".to_string())
    }

    /// Redis connection URL for the redis backend.
    #[must_use]
    pub fn redis_url() -> String {
        env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    /// Site base URL used to build the OAuth redirect URI.
    #[must_use]
    pub fn base_url() -> String {
        env::var("PULSEBOARD_BASE_URL").unwrap_or_else(|_| "https://localhost".to_string())
    }

    /// OAuth redirect URI registered with the provider.
    #[must_use]
    pub fn oauth_redirect_uri() -> String {
        env::var("PULSEBOARD_OAUTH_REDIRECT_URI")
            .unwrap_or_else(|_| format!("{}/wp-admin/admin.php?page=pulseboard", base_url()))
    }

    /// Transient capacity for the in-memory backend.
    #[must_use]
    pub fn memory_max_entries() -> usize {
        env::var("PULSEBOARD_MEMORY_MAX_ENTRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10_000)
    }

    /// Log level from environment or default.
    #[must_use]
    pub fn log_level() -> String {
        env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    }
}
