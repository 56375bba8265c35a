// ABOUTME: Mautic marketing-automation client keyed by instance URL + API key
// ABOUTME: Enforces https endpoints; summary figures derive from the API key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use super::{derive_figure, mask_all_but_last, Connector};
use crate::constants::limits;
use crate::errors::{IntegrationError, IntegrationResult};
use crate::registry::ToolId;
use std::collections::BTreeMap;
use url::Url;

/// Mautic client for a self-hosted instance.
pub struct MauticConnector {
    api_url: String,
    api_key: String,
}

impl MauticConnector {
    /// Build a client from stored credential fields.
    #[must_use]
    pub fn from_credentials(credentials: &BTreeMap<String, String>) -> Self {
        Self {
            api_url: credentials.get("api_url").cloned().unwrap_or_default(),
            api_key: credentials.get("api_key").cloned().unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Connector for MauticConnector {
    fn tool(&self) -> ToolId {
        ToolId::Mautic
    }

    async fn validate_credentials(&self) -> bool {
        Url::parse(&self.api_url).is_ok() && self.api_key.len() >= limits::MIN_API_KEY_LEN
    }

    async fn validate_connection(&self) -> IntegrationResult<()> {
        let url =
            Url::parse(&self.api_url).map_err(|_| IntegrationError::InvalidCredentials)?;

        // Long-lived keys over plain http would leak on every request.
        if url.scheme() != "https" {
            return Err(IntegrationError::InsecureUrl);
        }
        if self.api_key.len() < limits::MIN_API_KEY_LEN {
            return Err(IntegrationError::InvalidCredentials);
        }
        Ok(())
    }

    async fn connection_metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("api_url".to_owned(), self.api_url.clone());
        metadata.insert(
            "api_key_mask".to_owned(),
            mask_all_but_last(&self.api_key, limits::API_KEY_MASK_KEEP),
        );
        metadata
    }

    async fn fetch_latest_data(
        &self,
    ) -> IntegrationResult<serde_json::Map<String, serde_json::Value>> {
        let seed = self.api_key.as_str();

        let mut data = serde_json::Map::new();
        data.insert(
            "contacts_total".to_owned(),
            derive_figure(seed, "contacts", 500, 25_000).into(),
        );
        data.insert(
            "contacts_new_30d".to_owned(),
            derive_figure(seed, "new_contacts", 10, 900).into(),
        );
        data.insert(
            "campaigns_active".to_owned(),
            derive_figure(seed, "campaigns", 1, 24).into(),
        );
        data.insert(
            "emails_sent_30d".to_owned(),
            derive_figure(seed, "emails", 200, 60_000).into(),
        );
        data.insert(
            "open_rate_pct".to_owned(),
            derive_figure(seed, "open_rate", 12, 58).into(),
        );
        Ok(data)
    }

    async fn credentials(&self) -> BTreeMap<String, String> {
        let mut credentials = BTreeMap::new();
        credentials.insert("api_url".to_owned(), self.api_url.clone());
        credentials.insert("api_key".to_owned(), self.api_key.clone());
        credentials
    }
}
