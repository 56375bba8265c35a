// ABOUTME: Capability gate in front of every state-mutating integration call
// ABOUTME: The host decides who may manage integrations; this layer enforces it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Admin Gateway
//!
//! Mutating entry points (connect, disconnect, manual refresh, the OAuth
//! callback) must only run for actors the host considers administrators.
//! The host supplies that judgement through [`CapabilityCheck`];
//! [`AdminGateway`] applies it in front of the manager so no mutating path
//! can be wired up without the check.
//!
//! Read accessors are deliberately not gated here: the dashboard is
//! rendered inside the host's own admin chrome, which has already decided
//! the viewer may see it.

use crate::errors::IntegrationError;
use crate::manager::IntegrationManager;
use crate::models::{ConnectOutcome, ValidationState};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Host-side authorization judgement for the current actor.
pub trait CapabilityCheck: Send + Sync {
    /// Whether the current actor may manage integrations.
    fn can_manage_integrations(&self) -> bool;
}

/// Capability check that admits everyone; demo and test wiring only.
pub struct AllowAll;

impl CapabilityCheck for AllowAll {
    fn can_manage_integrations(&self) -> bool {
        true
    }
}

/// Errors from gated admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The current actor lacks the integration-management capability.
    #[error("you are not allowed to manage integrations")]
    Forbidden,

    /// The underlying integration operation failed.
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

/// Result alias for gated admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// Capability-checked front door to the integration manager.
pub struct AdminGateway {
    manager: Arc<IntegrationManager>,
    capability: Arc<dyn CapabilityCheck>,
}

impl AdminGateway {
    /// Wires the gateway in front of a manager.
    #[must_use]
    pub fn new(manager: Arc<IntegrationManager>, capability: Arc<dyn CapabilityCheck>) -> Self {
        Self {
            manager,
            capability,
        }
    }

    /// Connect a tool on behalf of the current actor.
    ///
    /// # Errors
    ///
    /// [`AdminError::Forbidden`] when the actor lacks the capability,
    /// otherwise whatever the connect flow reports.
    pub async fn connect_tool(
        &self,
        tool: &str,
        credentials: BTreeMap<String, String>,
    ) -> AdminResult<ConnectOutcome> {
        self.authorize(tool)?;
        Ok(self.manager.connect_tool(tool, credentials).await?)
    }

    /// Disconnect a tool on behalf of the current actor.
    ///
    /// # Errors
    ///
    /// [`AdminError::Forbidden`] when the actor lacks the capability.
    pub async fn disconnect_tool(&self, tool: &str) -> AdminResult<()> {
        self.authorize(tool)?;
        Ok(self.manager.disconnect_tool(tool).await?)
    }

    /// Complete an OAuth authorization on behalf of the current actor.
    ///
    /// # Errors
    ///
    /// [`AdminError::Forbidden`] when the actor lacks the capability,
    /// otherwise whatever the callback flow reports.
    pub async fn handle_oauth_callback(
        &self,
        tool: &str,
        code: &str,
        state: &str,
    ) -> AdminResult<ValidationState> {
        self.authorize(tool)?;
        Ok(self
            .manager
            .handle_oauth_callback(tool, code, state)
            .await?)
    }

    /// Queue an immediate refresh on behalf of the current actor.
    ///
    /// # Errors
    ///
    /// [`AdminError::Forbidden`] when the actor lacks the capability.
    pub async fn trigger_refresh(&self) -> AdminResult<()> {
        self.authorize("background sync")?;
        Ok(self.manager.trigger_immediate_sync().await?)
    }

    fn authorize(&self, what: &str) -> AdminResult<()> {
        if self.capability.can_manage_integrations() {
            Ok(())
        } else {
            warn!("Blocked integration management attempt on {what}");
            Err(AdminError::Forbidden)
        }
    }
}
