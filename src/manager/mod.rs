// ABOUTME: Integration manager driving connect, OAuth, disconnect, and reads
// ABOUTME: All collaborators are injected; every expected failure is an error value
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Integration Manager
//!
//! The coordinating service behind the integrations settings screen. It owns
//! the connect flows for all three tool kinds, the OAuth state nonce
//! lifecycle, validation bookkeeping, and the read accessors the dashboard
//! renders from. The background refresh pass lives in [`sync`] as a second
//! `impl` block.
//!
//! Tools are addressed by their string identifiers exactly as the host
//! submits them; an unknown identifier is [`IntegrationError::InvalidTool`],
//! never a panic.

/// Background synchronization pass
pub mod sync;

use crate::config::{AppConfig, IntegrationConfig, SyncConfig};
use crate::connectors::{Connector, ToolClient};
use crate::connections::ConnectionStore;
use crate::errors::{IntegrationError, IntegrationResult};
use crate::models::{
    ConnectOutcome, ConnectionRecord, SummarySnapshot, SyncState, SyncStatus, ValidationState,
};
use crate::registry::{all_tools, ToolDescriptor, ToolId, ToolKind};
use crate::scheduler::SyncScheduler;
use crate::storage::factory::Storage;
use crate::storage::{TransientKey, TransientStore};
use crate::summaries::SummaryCache;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Pending OAuth authorization, keyed by its one-time state nonce.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OauthStateRecord {
    tool: ToolId,
    created_at: DateTime<Utc>,
}

/// Coordinating service for tool connections and cached summaries.
pub struct IntegrationManager {
    storage: Storage,
    connections: ConnectionStore,
    summaries: SummaryCache,
    scheduler: Arc<dyn SyncScheduler>,
    sync: SyncConfig,
    integration: IntegrationConfig,
}

impl IntegrationManager {
    /// Wire the manager from its collaborators.
    #[must_use]
    pub fn new(storage: Storage, scheduler: Arc<dyn SyncScheduler>, config: &AppConfig) -> Self {
        let connections = ConnectionStore::new(storage.clone());
        let summaries = SummaryCache::new(storage.clone(), config.integration.summary_ttl);
        Self {
            storage,
            connections,
            summaries,
            scheduler,
            sync: config.sync.clone(),
            integration: config.integration.clone(),
        }
    }

    /// Descriptors of every supported tool, in display order.
    #[must_use]
    pub fn tools(&self) -> &'static [ToolDescriptor] {
        all_tools()
    }

    /// Connect a tool.
    ///
    /// OAuth tools get an authorization URL to visit; credential tools are
    /// validated and stored immediately.
    ///
    /// # Errors
    ///
    /// [`IntegrationError::InvalidTool`] for unknown identifiers and
    /// [`IntegrationError::InvalidCredentials`] when submitted fields fail
    /// the shape check; in the latter case nothing is persisted.
    pub async fn connect_tool(
        &self,
        tool: &str,
        credentials: BTreeMap<String, String>,
    ) -> IntegrationResult<ConnectOutcome> {
        let tool_id: ToolId = tool.parse()?;

        match tool_id.kind() {
            ToolKind::OAuth => self.begin_oauth(tool_id).await,
            ToolKind::ApiKey | ToolKind::ProjectKey => {
                let client = ToolClient::for_tool(tool_id, &credentials)?;
                if !client.validate_credentials().await {
                    return Err(IntegrationError::InvalidCredentials);
                }
                let validation = self.finalize_connection(tool_id, &client).await?;
                Ok(ConnectOutcome::Connected(validation))
            }
        }
    }

    /// Complete an OAuth connect after the provider redirected back.
    ///
    /// The state nonce is consumed on first use; replaying a callback fails
    /// with [`IntegrationError::OAuthStateMismatch`].
    ///
    /// # Errors
    ///
    /// Also [`IntegrationError::InvalidTool`] when the tool is unknown or
    /// not an OAuth tool, and [`IntegrationError::InvalidOAuthParams`] when
    /// code or state is missing.
    pub async fn handle_oauth_callback(
        &self,
        tool: &str,
        code: &str,
        state: &str,
    ) -> IntegrationResult<ValidationState> {
        let tool_id: ToolId = tool.parse()?;
        if tool_id.kind() != ToolKind::OAuth {
            return Err(IntegrationError::InvalidTool(tool.to_owned()));
        }
        if code.is_empty() || state.is_empty() {
            return Err(IntegrationError::InvalidOAuthParams);
        }

        let stored: Option<OauthStateRecord> = self
            .storage
            .take_transient(&TransientKey::OauthState(state.to_owned()))
            .await?;
        let valid = stored.is_some_and(|record| record.tool == tool_id);
        if !valid {
            warn!("OAuth callback for {tool_id} carried an unknown or foreign state nonce");
            return Err(IntegrationError::OAuthStateMismatch);
        }

        let ToolClient::GoogleAnalytics(client) =
            ToolClient::for_tool(tool_id, &BTreeMap::new())?
        else {
            return Err(IntegrationError::MissingClientClass(tool_id));
        };
        client.exchange_code(code).await?;

        let client = ToolClient::GoogleAnalytics(client);
        self.finalize_connection(tool_id, &client).await
    }

    /// Remove a tool's connection and every transient belonging to it.
    ///
    /// Idempotent: disconnecting an unconnected tool succeeds.
    ///
    /// # Errors
    ///
    /// [`IntegrationError::InvalidTool`] for unknown identifiers.
    pub async fn disconnect_tool(&self, tool: &str) -> IntegrationResult<()> {
        let tool_id: ToolId = tool.parse()?;

        let existed = self.connections.delete(tool_id).await?;
        self.storage
            .delete_transients_matching(&crate::constants::keys::tool_transient_pattern(tool_id))
            .await?;

        if existed {
            info!("Disconnected {tool_id}");
        } else {
            debug!("Disconnect for {tool_id} found nothing to remove");
        }
        Ok(())
    }

    /// Queue a refresh to run shortly.
    ///
    /// # Errors
    ///
    /// Returns an error when the status record cannot be written.
    pub async fn trigger_immediate_sync(&self) -> IntegrationResult<()> {
        let mut status = self.sync_status().await?;
        status.state = SyncState::Queued;
        status.queued_at = Some(Utc::now());
        self.write_sync_status(&status).await?;

        self.scheduler.schedule_once(self.sync.kickoff_delay).await;
        debug!(
            "Queued sync to run in {}s",
            self.sync.kickoff_delay.as_secs()
        );
        Ok(())
    }

    /// Make sure the recurring refresh is scheduled; safe to call repeatedly.
    pub async fn ensure_sync_schedule(&self) {
        self.scheduler
            .ensure_recurring(self.sync.recurring_period)
            .await;
    }

    /// One tool's stored connection record, if any.
    ///
    /// # Errors
    ///
    /// [`IntegrationError::InvalidTool`] for unknown identifiers.
    pub async fn connection(&self, tool: &str) -> IntegrationResult<Option<ConnectionRecord>> {
        let tool_id: ToolId = tool.parse()?;
        Ok(self.connections.get(tool_id).await?)
    }

    /// Display metadata of a connected tool.
    ///
    /// # Errors
    ///
    /// [`IntegrationError::MissingConnection`] when nothing is stored.
    pub async fn connection_metadata(
        &self,
        tool: &str,
    ) -> IntegrationResult<BTreeMap<String, String>> {
        let tool_id: ToolId = tool.parse()?;
        let record = self
            .connections
            .get(tool_id)
            .await?
            .ok_or(IntegrationError::MissingConnection(tool_id))?;
        Ok(record.metadata)
    }

    /// Validation bookkeeping for a tool; the default (unknown) state when
    /// nothing is stored.
    ///
    /// # Errors
    ///
    /// [`IntegrationError::InvalidTool`] for unknown identifiers.
    pub async fn validation_state(&self, tool: &str) -> IntegrationResult<ValidationState> {
        let tool_id: ToolId = tool.parse()?;
        let record = self.connections.get(tool_id).await?;
        Ok(record.map(|r| r.validation).unwrap_or_default())
    }

    /// Cached summary snapshot; the empty placeholder when absent or expired.
    ///
    /// # Errors
    ///
    /// [`IntegrationError::InvalidTool`] for unknown identifiers.
    pub async fn cached_summary(&self, tool: &str) -> IntegrationResult<SummarySnapshot> {
        let tool_id: ToolId = tool.parse()?;
        Ok(self.summaries.get(tool_id).await?)
    }

    /// Whether a tool has a stored connection whose last validation passed.
    ///
    /// # Errors
    ///
    /// [`IntegrationError::InvalidTool`] for unknown identifiers.
    pub async fn is_connected(&self, tool: &str) -> IntegrationResult<bool> {
        let tool_id: ToolId = tool.parse()?;
        let record = self.connections.get(tool_id).await?;
        Ok(record.is_some_and(|r| r.validation.is_success()))
    }

    /// Current status of the background refresh job.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn sync_status(&self) -> IntegrationResult<SyncStatus> {
        let status = self
            .storage
            .get_transient::<SyncStatus>(&TransientKey::SyncStatus)
            .await?;
        Ok(status.unwrap_or_default())
    }

    /// Whether a refresh pass is executing right now.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn is_sync_running(&self) -> IntegrationResult<bool> {
        Ok(self.sync_status().await?.state == SyncState::Running)
    }

    /// Start the OAuth flow: mint a nonce and build the authorization URL.
    async fn begin_oauth(&self, tool_id: ToolId) -> IntegrationResult<ConnectOutcome> {
        let descriptor = tool_id.descriptor();
        let endpoint = descriptor
            .authorize_url
            .ok_or(IntegrationError::MissingClientClass(tool_id))?;

        let nonce = Uuid::new_v4().to_string();
        let record = OauthStateRecord {
            tool: tool_id,
            created_at: Utc::now(),
        };
        self.storage
            .set_transient(
                &TransientKey::OauthState(nonce.clone()),
                &record,
                Some(self.integration.oauth_state_ttl),
            )
            .await?;

        let mut url = Url::parse(endpoint).map_err(|e| {
            IntegrationError::ValidationFailed(format!("authorize endpoint is invalid: {e}"))
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", &self.integration.oauth_redirect_uri)
                .append_pair("access_type", "offline")
                .append_pair("state", &nonce);
            if let Some(scope) = descriptor.oauth_scope {
                pairs.append_pair("scope", scope);
            }
        }

        info!("Starting OAuth authorization for {tool_id}");
        Ok(ConnectOutcome::AuthorizationRequired {
            authorization_url: url.into(),
            state: nonce,
        })
    }

    /// Validate, persist, and on success prime the refresh pipeline.
    ///
    /// Shared tail of every connect path. A failed validation is still
    /// persisted so the dashboard can show what went wrong.
    async fn finalize_connection(
        &self,
        tool_id: ToolId,
        client: &ToolClient,
    ) -> IntegrationResult<ValidationState> {
        let now = Utc::now();
        let previous = self.connections.get(tool_id).await?;
        let prior_validation = previous
            .as_ref()
            .map(|record| record.validation.clone())
            .unwrap_or_default();

        let validation = match client.validate_connection().await {
            Ok(()) => ValidationState::succeeded(now),
            Err(e) => ValidationState::failed(now, e.to_string(), &prior_validation),
        };

        let record = ConnectionRecord {
            credentials: client.credentials().await,
            metadata: client.connection_metadata().await,
            validation: validation.clone(),
            stored_at: previous.and_then(|r| r.stored_at).or(Some(now)),
        };
        self.connections.put(tool_id, &record).await?;

        if validation.is_success() {
            self.summaries.clear(tool_id).await?;
            // Fresh data should appear without waiting for the hourly run;
            // a scheduling hiccup must not fail the connect itself.
            if let Err(e) = self.trigger_immediate_sync().await {
                warn!("Could not queue post-connect sync for {tool_id}: {e}");
            }
            info!("Connected {tool_id}");
        } else {
            warn!(
                "Stored {tool_id} connection with failed validation: {}",
                validation.message
            );
        }

        Ok(validation)
    }

    /// Persist the sync status singleton.
    pub(crate) async fn write_sync_status(&self, status: &SyncStatus) -> IntegrationResult<()> {
        self.storage
            .set_transient(&TransientKey::SyncStatus, status, None)
            .await?;
        Ok(())
    }
}
