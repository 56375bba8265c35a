// ABOUTME: Shared data model for connections, validation, summaries, and sync
// ABOUTME: Everything here is serde-serializable for the storage layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Data Model
//!
//! Persistent records exchanged between the manager, the storage layer, and
//! the dashboard. Records are serialized as JSON; maps use [`BTreeMap`] so
//! stored documents are byte-stable across round trips.

use crate::registry::ToolId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of the last validation attempt for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// No validation has been attempted yet.
    Unknown,
    /// The most recent validation succeeded.
    Success,
    /// The most recent validation failed.
    Failed,
}

impl Default for ValidationStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Validation bookkeeping carried on every stored connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    /// Result of the most recent validation attempt.
    pub status: ValidationStatus,
    /// When validation last ran, successful or not.
    pub checked_at: Option<DateTime<Utc>>,
    /// When validation last succeeded.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Human-readable outcome detail; empty until a check has run.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ValidationState {
    /// Marks a successful check at `now`, stamping the standard message.
    #[must_use]
    pub fn succeeded(now: DateTime<Utc>) -> Self {
        Self {
            status: ValidationStatus::Success,
            checked_at: Some(now),
            last_success_at: Some(now),
            message: "Validation succeeded".to_owned(),
        }
    }

    /// Marks a failed check at `now`, keeping the previous success stamp.
    #[must_use]
    pub fn failed(now: DateTime<Utc>, message: impl Into<String>, previous: &Self) -> Self {
        Self {
            status: ValidationStatus::Failed,
            checked_at: Some(now),
            last_success_at: previous.last_success_at,
            message: message.into(),
        }
    }

    /// Whether the connection is currently considered healthy.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ValidationStatus::Success
    }
}

/// Stored connection for a single tool: credentials plus bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Credential fields keyed by field name (`api_key`, `refresh_token`, ...).
    pub credentials: BTreeMap<String, String>,
    /// Non-secret metadata such as the connected account email.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Validation bookkeeping for this connection.
    #[serde(default)]
    pub validation: ValidationState,
    /// When the record was first persisted.
    pub stored_at: Option<DateTime<Utc>>,
}

impl ConnectionRecord {
    /// Builds a record from submitted credentials, stamped at `now`.
    #[must_use]
    pub fn new(credentials: BTreeMap<String, String>, now: DateTime<Utc>) -> Self {
        Self {
            credentials,
            metadata: BTreeMap::new(),
            validation: ValidationState::default(),
            stored_at: Some(now),
        }
    }

    /// Credential field by name, if present and non-empty.
    #[must_use]
    pub fn credential(&self, field: &str) -> Option<&str> {
        self.credentials
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// One tool's cached metrics summary.
///
/// The payload is an opaque JSON object produced by the tool's client; the
/// dashboard renders whatever figures it finds there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarySnapshot {
    /// Summary figures keyed by metric name.
    pub data: serde_json::Map<String, serde_json::Value>,
    /// When this snapshot was captured; `None` for the empty placeholder.
    pub cached_at: Option<DateTime<Utc>>,
}

impl SummarySnapshot {
    /// Wraps freshly fetched figures with a capture timestamp.
    #[must_use]
    pub fn new(data: serde_json::Map<String, serde_json::Value>, now: DateTime<Utc>) -> Self {
        Self {
            data,
            cached_at: Some(now),
        }
    }

    /// Whether this is the placeholder returned when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.cached_at.is_none()
    }
}

/// Lifecycle phase of the background refresh job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No refresh is queued or running.
    Idle,
    /// A refresh has been scheduled but has not started yet.
    Queued,
    /// A refresh is currently executing.
    Running,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Observable status of the background refresh job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Current lifecycle phase.
    pub state: SyncState,
    /// When the pending run was queued, while one is queued.
    pub queued_at: Option<DateTime<Utc>>,
    /// When the current or most recent run started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the most recent run finished.
    pub ended_at: Option<DateTime<Utc>>,
}

/// Result of a completed synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Whether the pass ran at all (false when the run lock was held).
    pub started: bool,
    /// Tools whose summaries were refreshed.
    pub refreshed: Vec<ToolId>,
    /// Tools skipped because they were unconnected or their fetch failed.
    pub skipped: Vec<ToolId>,
}

/// What connecting a tool produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConnectOutcome {
    /// OAuth tools: the browser must visit the provider's consent screen.
    AuthorizationRequired {
        /// Fully formed provider authorization URL.
        authorization_url: String,
        /// Nonce embedded in the URL, for callers that surface it.
        state: String,
    },
    /// Credential tools: stored and validated immediately.
    Connected(ValidationState),
}

/// One recent order surfaced on the dashboard activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommerceActivity {
    /// Order identifier in the host commerce system.
    pub order_id: u64,
    /// Order total in the shop currency.
    pub total: f64,
    /// Display status, e.g. `processing` or `completed`.
    pub status: String,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}
