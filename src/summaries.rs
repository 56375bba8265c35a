// ABOUTME: TTL cache of per-tool display summaries over the transient store
// ABOUTME: Absent or expired entries read as the empty placeholder snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use crate::models::SummarySnapshot;
use crate::registry::ToolId;
use crate::storage::factory::Storage;
use crate::storage::{StoreResult, TransientKey, TransientStore};
use chrono::Utc;
use std::time::Duration;

/// Cache of the display payloads the background sync produces.
///
/// The dashboard reads through this cache only; a cold or expired entry
/// renders as "no data yet", never as an error.
#[derive(Clone)]
pub struct SummaryCache {
    storage: Storage,
    ttl: Duration,
}

impl SummaryCache {
    /// Wrap the given storage backend with the configured entry TTL.
    #[must_use]
    pub fn new(storage: Storage, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    /// Read one tool's snapshot; the empty placeholder when absent or expired.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn get(&self, tool: ToolId) -> StoreResult<SummarySnapshot> {
        let snapshot = self
            .storage
            .get_transient::<SummarySnapshot>(&TransientKey::Summary(tool))
            .await?;
        Ok(snapshot.unwrap_or_default())
    }

    /// Store freshly fetched figures, stamped now and expiring after the TTL.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn put(
        &self,
        tool: ToolId,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> StoreResult<()> {
        let snapshot = SummarySnapshot::new(data, Utc::now());
        self.storage
            .set_transient(&TransientKey::Summary(tool), &snapshot, Some(self.ttl))
            .await
    }

    /// Drop one tool's snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn clear(&self, tool: ToolId) -> StoreResult<()> {
        self.storage
            .delete_transient(&TransientKey::Summary(tool))
            .await?;
        Ok(())
    }
}
