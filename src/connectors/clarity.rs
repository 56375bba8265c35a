// ABOUTME: Microsoft Clarity client keyed by project id + project key
// ABOUTME: Session analytics figures derive from the project id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use super::{derive_figure, mask_all_but_last, Connector};
use crate::constants::limits;
use crate::errors::{IntegrationError, IntegrationResult};
use crate::registry::ToolId;
use std::collections::BTreeMap;

/// Microsoft Clarity client.
pub struct ClarityConnector {
    project_id: String,
    project_key: String,
}

impl ClarityConnector {
    /// Build a client from stored credential fields.
    #[must_use]
    pub fn from_credentials(credentials: &BTreeMap<String, String>) -> Self {
        Self {
            project_id: credentials.get("project_id").cloned().unwrap_or_default(),
            project_key: credentials.get("project_key").cloned().unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Connector for ClarityConnector {
    fn tool(&self) -> ToolId {
        ToolId::Clarity
    }

    async fn validate_credentials(&self) -> bool {
        !self.project_id.is_empty() && !self.project_key.is_empty()
    }

    async fn validate_connection(&self) -> IntegrationResult<()> {
        if self.project_id.is_empty() || self.project_key.is_empty() {
            return Err(IntegrationError::InvalidCredentials);
        }
        if self.project_key.len() < limits::MIN_PROJECT_KEY_LEN {
            return Err(IntegrationError::InvalidKeyFormat);
        }
        Ok(())
    }

    async fn connection_metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("project_id".to_owned(), self.project_id.clone());
        metadata.insert(
            "project_key_mask".to_owned(),
            mask_all_but_last(&self.project_key, limits::PROJECT_KEY_MASK_KEEP),
        );
        metadata
    }

    async fn fetch_latest_data(
        &self,
    ) -> IntegrationResult<serde_json::Map<String, serde_json::Value>> {
        let seed = self.project_id.as_str();

        let mut data = serde_json::Map::new();
        data.insert(
            "sessions_30d".to_owned(),
            derive_figure(seed, "sessions", 900, 40_000).into(),
        );
        data.insert(
            "distinct_users_30d".to_owned(),
            derive_figure(seed, "users", 600, 28_000).into(),
        );
        data.insert(
            "rage_clicks_30d".to_owned(),
            derive_figure(seed, "rage_clicks", 0, 400).into(),
        );
        data.insert(
            "dead_clicks_30d".to_owned(),
            derive_figure(seed, "dead_clicks", 0, 900).into(),
        );
        data.insert(
            "avg_scroll_depth_pct".to_owned(),
            derive_figure(seed, "scroll_depth", 38, 92).into(),
        );
        Ok(data)
    }

    async fn credentials(&self) -> BTreeMap<String, String> {
        let mut credentials = BTreeMap::new();
        credentials.insert("project_id".to_owned(), self.project_id.clone());
        credentials.insert("project_key".to_owned(), self.project_key.clone());
        credentials
    }
}
