// ABOUTME: Background refresh pass over every registered tool
// ABOUTME: Guarded by a TTL lock; one tool's failure never stalls the rest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use super::IntegrationManager;
use crate::connectors::{Connector, ToolClient};
use crate::errors::IntegrationResult;
use crate::models::{SyncOutcome, SyncState, SyncStatus};
use crate::registry::{all_tools, ToolId};
use crate::storage::{TransientKey, TransientStore};
use chrono::Utc;
use tracing::{debug, error, info, warn};

impl IntegrationManager {
    /// Run one synchronization pass over every registered tool.
    ///
    /// At most one pass runs at a time: the pass first claims a run lock
    /// whose TTL outlives any plausible run, so a crashed pass cannot block
    /// syncing forever. When the lock is already held the pass is a no-op
    /// and the returned outcome has `started == false`.
    ///
    /// # Errors
    ///
    /// Returns an error when the lock or status records cannot be written.
    /// Per-tool fetch failures do not error the pass; they show up in
    /// [`SyncOutcome::skipped`].
    pub async fn run_sync(&self) -> IntegrationResult<SyncOutcome> {
        let acquired = self
            .storage
            .set_transient_nx(&TransientKey::SyncLock, &true, self.sync.lock_ttl)
            .await?;
        if !acquired {
            debug!("Sync lock is held; another pass is running");
            return Ok(SyncOutcome::default());
        }

        let started_at = Utc::now();
        let result = self.run_locked(started_at).await;

        // Release and settle even when the pass errored part-way.
        if let Err(e) = self.storage.delete_transient(&TransientKey::SyncLock).await {
            error!("Failed to release sync lock: {e}");
        }
        let settled = SyncStatus {
            state: SyncState::Idle,
            queued_at: None,
            started_at: Some(started_at),
            ended_at: Some(Utc::now()),
        };
        if let Err(e) = self.write_sync_status(&settled).await {
            error!("Failed to record sync completion: {e}");
        }

        result
    }

    /// The pass body, entered only while the run lock is held.
    async fn run_locked(&self, started_at: chrono::DateTime<Utc>) -> IntegrationResult<SyncOutcome> {
        self.write_sync_status(&SyncStatus {
            state: SyncState::Running,
            queued_at: None,
            started_at: Some(started_at),
            ended_at: None,
        })
        .await?;

        let mut outcome = SyncOutcome {
            started: true,
            ..SyncOutcome::default()
        };
        for descriptor in all_tools() {
            match self.refresh_tool(descriptor.id).await {
                Ok(true) => outcome.refreshed.push(descriptor.id),
                Ok(false) => outcome.skipped.push(descriptor.id),
                Err(e) => {
                    warn!("Sync pass could not refresh {}: {e}", descriptor.id);
                    outcome.skipped.push(descriptor.id);
                }
            }
        }

        info!(
            "Sync pass finished: {} refreshed, {} skipped",
            outcome.refreshed.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    /// Refresh one tool's summary; `Ok(true)` when new figures were cached.
    ///
    /// Unconnected and never-validated tools have any stale summary cleared.
    /// A fetch failure keeps the previous summary so the dashboard degrades
    /// to slightly old figures instead of blanks.
    async fn refresh_tool(&self, tool: ToolId) -> IntegrationResult<bool> {
        let Some(mut record) = self.connections.get(tool).await? else {
            self.summaries.clear(tool).await?;
            return Ok(false);
        };
        if !record.validation.is_success() {
            self.summaries.clear(tool).await?;
            return Ok(false);
        }

        let client = match ToolClient::for_tool(tool, &record.credentials) {
            Ok(client) => client,
            Err(e) => {
                warn!("Stored credentials for {tool} no longer build a client: {e}");
                self.summaries.clear(tool).await?;
                return Ok(false);
            }
        };

        let data = match client.fetch_latest_data().await {
            Ok(data) => data,
            Err(e) => {
                warn!("Fetch for {tool} failed, keeping previous summary: {e}");
                return Ok(false);
            }
        };
        self.summaries.put(tool, data).await?;

        // OAuth fetches may have rotated tokens; write the client's view back.
        let now = Utc::now();
        record.credentials = client.credentials().await;
        record.metadata = client.connection_metadata().await;
        record.validation.checked_at = Some(now);
        record.validation.last_success_at = Some(now);
        self.connections.put(tool, &record).await?;

        debug!("Refreshed summary for {tool}");
        Ok(true)
    }
}
