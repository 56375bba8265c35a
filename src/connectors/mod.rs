// ABOUTME: Integration clients for the supported marketing tools
// ABOUTME: Shared capability trait plus a closed dispatch enum, no dynamic registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Integration Clients
//!
//! One client per tool, all implementing [`Connector`]. The set is closed,
//! so dispatch is the [`ToolClient`] enum rather than a trait-object
//! registry.
//!
//! Clients simulate provider behavior: no outbound HTTP happens anywhere.
//! Payload figures and token material are derived deterministically from the
//! stable credential fields, so the same connection always produces the same
//! data. The fetch contracts (flat figure maps, error values on failure,
//! idempotent calls) are exactly what a real transport would preserve.

/// Microsoft Clarity client (project id + project key)
pub mod clarity;
/// Google Analytics client (OAuth account grant)
pub mod google_analytics;
/// Mautic client (instance URL + API key)
pub mod mautic;

pub use clarity::ClarityConnector;
pub use google_analytics::GoogleAnalyticsConnector;
pub use mautic::MauticConnector;

use crate::errors::{IntegrationError, IntegrationResult};
use crate::registry::{ToolId, ToolKind};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Capabilities every integration client provides.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Which tool this client talks to.
    fn tool(&self) -> ToolId;

    /// Cheap shape check of the held credentials; no provider round trip.
    async fn validate_credentials(&self) -> bool;

    /// Deep check that the connection would work, returning the specific
    /// failure as an error value.
    async fn validate_connection(&self) -> IntegrationResult<()>;

    /// Display-safe connection details for the dashboard card.
    ///
    /// Secrets are masked before they leave the client.
    async fn connection_metadata(&self) -> BTreeMap<String, String>;

    /// Fetch the latest summary figures as a flat JSON object.
    async fn fetch_latest_data(&self)
        -> IntegrationResult<serde_json::Map<String, serde_json::Value>>;

    /// Current credential snapshot, including any rotated tokens.
    ///
    /// Persisting this after a fetch keeps lazily rotated tokens from being
    /// lost between runs.
    async fn credentials(&self) -> BTreeMap<String, String>;
}

/// Closed dispatch over the supported clients.
pub enum ToolClient {
    /// Google Analytics client.
    GoogleAnalytics(GoogleAnalyticsConnector),
    /// Mautic client.
    Mautic(MauticConnector),
    /// Microsoft Clarity client.
    Clarity(ClarityConnector),
}

impl ToolClient {
    /// Build the client for `tool` from stored or submitted credentials.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::MissingClientClass`] when the registry
    /// descriptor's kind does not match any client, which indicates an
    /// inconsistent registry edit rather than user input.
    pub fn for_tool(
        tool: ToolId,
        credentials: &BTreeMap<String, String>,
    ) -> IntegrationResult<Self> {
        match (tool, tool.kind()) {
            (ToolId::GoogleAnalytics, ToolKind::OAuth) => Ok(Self::GoogleAnalytics(
                GoogleAnalyticsConnector::from_credentials(credentials),
            )),
            (ToolId::Mautic, ToolKind::ApiKey) => {
                Ok(Self::Mautic(MauticConnector::from_credentials(credentials)))
            }
            (ToolId::Clarity, ToolKind::ProjectKey) => Ok(Self::Clarity(
                ClarityConnector::from_credentials(credentials),
            )),
            _ => Err(IntegrationError::MissingClientClass(tool)),
        }
    }
}

#[async_trait::async_trait]
impl Connector for ToolClient {
    fn tool(&self) -> ToolId {
        match self {
            Self::GoogleAnalytics(client) => client.tool(),
            Self::Mautic(client) => client.tool(),
            Self::Clarity(client) => client.tool(),
        }
    }

    async fn validate_credentials(&self) -> bool {
        match self {
            Self::GoogleAnalytics(client) => client.validate_credentials().await,
            Self::Mautic(client) => client.validate_credentials().await,
            Self::Clarity(client) => client.validate_credentials().await,
        }
    }

    async fn validate_connection(&self) -> IntegrationResult<()> {
        match self {
            Self::GoogleAnalytics(client) => client.validate_connection().await,
            Self::Mautic(client) => client.validate_connection().await,
            Self::Clarity(client) => client.validate_connection().await,
        }
    }

    async fn connection_metadata(&self) -> BTreeMap<String, String> {
        match self {
            Self::GoogleAnalytics(client) => client.connection_metadata().await,
            Self::Mautic(client) => client.connection_metadata().await,
            Self::Clarity(client) => client.connection_metadata().await,
        }
    }

    async fn fetch_latest_data(
        &self,
    ) -> IntegrationResult<serde_json::Map<String, serde_json::Value>> {
        match self {
            Self::GoogleAnalytics(client) => client.fetch_latest_data().await,
            Self::Mautic(client) => client.fetch_latest_data().await,
            Self::Clarity(client) => client.fetch_latest_data().await,
        }
    }

    async fn credentials(&self) -> BTreeMap<String, String> {
        match self {
            Self::GoogleAnalytics(client) => client.credentials().await,
            Self::Mautic(client) => client.credentials().await,
            Self::Clarity(client) => client.credentials().await,
        }
    }
}

/// Mask a secret down to its last `keep` characters.
///
/// Values no longer than `keep` come back fully starred so the raw secret is
/// never echoed.
#[must_use]
pub fn mask_all_but_last(value: &str, keep: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= keep {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - keep..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - keep), visible)
}

/// Derive a 64-char lowercase hex string from the given parts.
///
/// Stands in for provider-issued token material; same parts, same output.
pub(crate) fn derive_hex(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b":");
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Derive a stable figure in `lo..=hi` from a seed and a metric label.
pub(crate) fn derive_figure(seed: &str, label: &str, lo: u64, hi: u64) -> u64 {
    let digest = Sha256::digest(format!("{seed}:{label}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let raw = u64::from_be_bytes(bytes);
    lo + raw % (hi - lo + 1)
}
