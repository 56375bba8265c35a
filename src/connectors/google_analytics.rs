// ABOUTME: Google Analytics client with a simulated OAuth token lifecycle
// ABOUTME: Tokens rotate lazily once expired; everything derives deterministically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

use super::{derive_figure, derive_hex, Connector};
use crate::constants::limits;
use crate::errors::{IntegrationError, IntegrationResult};
use crate::registry::ToolId;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

const CHANNELS: [&str; 5] = ["organic_search", "direct", "social", "referral", "email"];

/// Mutable token state, shared across calls on one client instance.
#[derive(Debug, Clone, Default)]
struct TokenState {
    access_token: String,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
    account_email: Option<String>,
}

/// Google Analytics client.
///
/// Follows the provider's real shape: a short-lived access token, a
/// long-lived refresh token, and lazy rotation once the access token
/// expires. The rotation itself is simulated; new token material is derived
/// from the refresh token instead of a network exchange.
pub struct GoogleAnalyticsConnector {
    state: RwLock<TokenState>,
}

impl GoogleAnalyticsConnector {
    /// Build a client from stored credential fields.
    ///
    /// Missing or malformed fields become empty state and surface later as
    /// [`IntegrationError::MissingTokens`].
    #[must_use]
    pub fn from_credentials(credentials: &BTreeMap<String, String>) -> Self {
        let state = TokenState {
            access_token: credentials.get("access_token").cloned().unwrap_or_default(),
            refresh_token: credentials.get("refresh_token").cloned().unwrap_or_default(),
            expires_at: credentials
                .get("expires_at")
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|at| at.with_timezone(&Utc)),
            account_email: credentials
                .get("account_email")
                .cloned()
                .filter(|email| !email.is_empty()),
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Simulated authorization-code exchange.
    ///
    /// Both tokens and the connected account email derive deterministically
    /// from the code, so repeating a callback yields identical credentials.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::InvalidOAuthParams`] for an empty code.
    pub async fn exchange_code(&self, code: &str) -> IntegrationResult<()> {
        if code.is_empty() {
            return Err(IntegrationError::InvalidOAuthParams);
        }

        let now = Utc::now();
        let mut state = self.state.write().await;
        state.access_token = derive_hex(&["ga-access", code]);
        state.refresh_token = derive_hex(&["ga-refresh", code]);
        state.expires_at = Some(now + Duration::seconds(limits::OAUTH_TOKEN_TTL_SECS));
        state.account_email = Some(format!(
            "site-owner-{}@gmail.com",
            &derive_hex(&["ga-account", code])[..8]
        ));
        drop(state);

        info!("Exchanged authorization code for Google Analytics tokens");
        Ok(())
    }

    /// Rotate the access token if it has passed its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::MissingTokens`] when either token is
    /// absent; rotation needs the refresh token.
    async fn ensure_fresh_tokens(&self) -> IntegrationResult<()> {
        let mut state = self.state.write().await;
        if state.access_token.is_empty() || state.refresh_token.is_empty() {
            return Err(IntegrationError::MissingTokens);
        }

        let now = Utc::now();
        let still_valid = state.expires_at.is_some_and(|at| now < at);
        if !still_valid {
            let refresh_token = state.refresh_token.clone();
            let stamp = now.timestamp().to_string();
            state.access_token = derive_hex(&[&refresh_token, &stamp]);
            state.expires_at = Some(now + Duration::seconds(limits::OAUTH_TOKEN_TTL_SECS));
            debug!("Rotated expired Google Analytics access token");
        }
        drop(state);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Connector for GoogleAnalyticsConnector {
    fn tool(&self) -> ToolId {
        ToolId::GoogleAnalytics
    }

    async fn validate_credentials(&self) -> bool {
        let state = self.state.read().await;
        !state.access_token.is_empty() && !state.refresh_token.is_empty()
    }

    async fn validate_connection(&self) -> IntegrationResult<()> {
        self.ensure_fresh_tokens().await
    }

    async fn connection_metadata(&self) -> BTreeMap<String, String> {
        let state = self.state.read().await;
        let mut metadata = BTreeMap::new();
        if let Some(email) = &state.account_email {
            metadata.insert("account_email".to_owned(), email.clone());
        }
        if let Some(at) = state.expires_at {
            metadata.insert("token_expires_at".to_owned(), at.to_rfc3339());
        }
        metadata
    }

    async fn fetch_latest_data(
        &self,
    ) -> IntegrationResult<serde_json::Map<String, serde_json::Value>> {
        self.ensure_fresh_tokens().await?;

        // The refresh token is the stable per-connection seed; the access
        // token rotates and would wobble the figures.
        let seed = self.state.read().await.refresh_token.clone();

        let mut data = serde_json::Map::new();
        data.insert(
            "sessions_30d".to_owned(),
            derive_figure(&seed, "sessions", 1_200, 48_000).into(),
        );
        data.insert(
            "page_views_30d".to_owned(),
            derive_figure(&seed, "page_views", 4_000, 160_000).into(),
        );
        data.insert(
            "active_users_30d".to_owned(),
            derive_figure(&seed, "active_users", 800, 32_000).into(),
        );
        data.insert(
            "avg_engagement_secs".to_owned(),
            derive_figure(&seed, "engagement", 35, 240).into(),
        );
        let channel = CHANNELS[derive_figure(&seed, "channel", 0, 4) as usize];
        data.insert("top_channel".to_owned(), channel.into());
        Ok(data)
    }

    async fn credentials(&self) -> BTreeMap<String, String> {
        let state = self.state.read().await;
        let mut credentials = BTreeMap::new();
        credentials.insert("access_token".to_owned(), state.access_token.clone());
        credentials.insert("refresh_token".to_owned(), state.refresh_token.clone());
        if let Some(at) = state.expires_at {
            credentials.insert("expires_at".to_owned(), at.to_rfc3339());
        }
        if let Some(email) = &state.account_email {
            credentials.insert("account_email".to_owned(), email.clone());
        }
        credentials
    }
}
